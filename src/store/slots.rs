// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DRAFT_SLOT: &str = "draft.json";
pub const CONFIG_SLOT: &str = "config.json";
pub const REALTIME_SLOT: &str = "realtime";

/// A state directory holding independent single-value slots as files.
///
/// Reads return `None` on any failure; writes and removes are fire-and-forget.
/// Writes land via a temp file and rename so a torn write never leaves a
/// half-written slot behind.
#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read(&self, slot: &str) -> Option<String> {
        fs::read_to_string(self.root.join(slot)).ok()
    }

    pub fn write(&self, slot: &str, contents: &str) {
        if let Err(err) = self.try_write(slot, contents) {
            tracing::debug!(slot, error = %err, "slot write failed");
        }
    }

    pub fn remove(&self, slot: &str) {
        let _ = fs::remove_file(self.root.join(slot));
    }

    fn try_write(&self, slot: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(slot);

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let tmp_path = self.root.join(format!(".triton.tmp.{slot}.{nanos}"));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(contents.as_bytes())?;
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err);
        }
        Ok(())
    }

    /// The realtime-poll preference, defaulting to off.
    pub fn poll_enabled(&self) -> bool {
        self.read(REALTIME_SLOT).as_deref() == Some("true")
    }

    pub fn set_poll_enabled(&self, enabled: bool) {
        self.write(REALTIME_SLOT, if enabled { "true" } else { "false" });
    }
}
