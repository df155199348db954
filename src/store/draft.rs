// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced draft autosave and restore.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::slots::{SlotStore, DRAFT_SLOT};
use crate::model::{ContentHash, Language, Post};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// A serialized copy of the working post, shadowed into local storage
/// independently of the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub title: String,
    pub date: String,
    pub slug: String,
    #[serde(default)]
    pub manual_slug: bool,
    pub active_language: Language,
    pub content: BTreeMap<Language, String>,
    #[serde(default)]
    pub extra_fields: Vec<(SmolStr, String)>,
    #[serde(default)]
    pub remote_path: Option<String>,
    #[serde(default)]
    pub remote_hash: Option<String>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

impl DraftSnapshot {
    pub fn capture(post: &Post) -> Self {
        Self {
            title: post.title().to_owned(),
            date: post.date().to_owned(),
            slug: post.slug().to_owned(),
            manual_slug: post.manual_slug(),
            active_language: post.active_language(),
            content: post.content_by_language().clone(),
            extra_fields: post.extra_fields().to_vec(),
            remote_path: post.remote().map(|binding| binding.path().to_owned()),
            remote_hash: post
                .remote()
                .and_then(|binding| binding.content_hash())
                .map(|hash| hash.as_str().to_owned()),
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Whether restoring this draft would differ from a pristine session.
    /// Blank drafts never trigger the restore offer.
    pub fn is_meaningful(&self) -> bool {
        !self.title.trim().is_empty()
            || !self.slug.trim().is_empty()
            || self.remote_path.is_some()
            || self.content.values().any(|value| !value.trim().is_empty())
            || !self.extra_fields.is_empty()
    }

    pub fn into_post(self) -> Post {
        let mut post = Post::new();
        post.set_title(self.title);
        post.set_date(self.date);
        post.set_slug(self.slug);
        post.set_manual_slug(self.manual_slug);
        post.set_active_language(self.active_language);
        for (language, content) in self.content {
            post.set_content(language, content);
        }
        post.set_extra_fields(self.extra_fields);
        if let Some(path) = self.remote_path {
            post.bind(path, self.remote_hash.map(ContentHash::new));
        }
        post
    }
}

#[derive(Debug, Default)]
struct AutosaveState {
    pending: Option<DraftSnapshot>,
    deadline: Option<Instant>,
    flush_requested: bool,
    in_flight: bool,
    completed_writes: u64,
}

#[derive(Debug)]
struct AutosaveInner {
    state: Mutex<AutosaveState>,
    cv: Condvar,
}

/// One fixed draft slot with write coalescing.
///
/// Every `schedule` replaces the pending snapshot and pushes the deadline,
/// so a burst of edits produces exactly one write after the quiet period.
/// The worker thread lives for the life of the process.
#[derive(Debug, Clone)]
pub struct DraftStore {
    slots: SlotStore,
    debounce: Duration,
    inner: Arc<AutosaveInner>,
}

impl DraftStore {
    pub fn new(slots: SlotStore) -> Self {
        Self::with_debounce(slots, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(slots: SlotStore, debounce: Duration) -> Self {
        let inner = Arc::new(AutosaveInner {
            state: Mutex::new(AutosaveState::default()),
            cv: Condvar::new(),
        });

        std::thread::Builder::new()
            .name("triton-draft-autosave".to_owned())
            .spawn({
                let inner = inner.clone();
                let slots = slots.clone();
                move || run_worker(inner, slots)
            })
            .expect("spawn draft autosave worker thread");

        Self {
            slots,
            debounce,
            inner,
        }
    }

    /// Queue a snapshot of `post` for writing after the quiet period.
    pub fn schedule(&self, post: &Post) {
        let snapshot = DraftSnapshot::capture(post);
        let mut state = self.inner.state.lock().expect("draft autosave lock poisoned");
        state.pending = Some(snapshot);
        state.deadline = Some(Instant::now() + self.debounce);
        self.inner.cv.notify_all();
    }

    /// Write any pending snapshot now and wait for it to land.
    pub fn flush(&self) {
        let mut state = self.inner.state.lock().expect("draft autosave lock poisoned");
        if state.pending.is_some() {
            state.flush_requested = true;
            self.inner.cv.notify_all();
        }
        while state.pending.is_some() || state.in_flight {
            state = self
                .inner
                .cv
                .wait(state)
                .expect("draft autosave cv poisoned");
        }
    }

    /// Drop the draft: cancel any pending write and remove the slot. Called
    /// after a successful publish or delete, an explicit reset, and before
    /// loading a different document.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock().expect("draft autosave lock poisoned");
        state.pending = None;
        state.deadline = None;
        state.flush_requested = false;
        while state.in_flight {
            state = self
                .inner
                .cv
                .wait(state)
                .expect("draft autosave cv poisoned");
        }
        drop(state);
        self.slots.remove(DRAFT_SLOT);
    }

    /// The stored draft, if it is worth offering for restoration.
    pub fn restorable(&self) -> Option<DraftSnapshot> {
        let raw = self.slots.read(DRAFT_SLOT)?;
        let snapshot: DraftSnapshot = serde_json::from_str(&raw).ok()?;
        if snapshot.is_meaningful() {
            Some(snapshot)
        } else {
            None
        }
    }

    /// Completed background writes so far.
    pub fn completed_writes(&self) -> u64 {
        self.inner
            .state
            .lock()
            .expect("draft autosave lock poisoned")
            .completed_writes
    }
}

fn run_worker(inner: Arc<AutosaveInner>, slots: SlotStore) {
    loop {
        let snapshot = {
            let mut state = inner.state.lock().expect("draft autosave lock poisoned");
            loop {
                match state.deadline {
                    Some(deadline) if state.pending.is_some() => {
                        let now = Instant::now();
                        if state.flush_requested || now >= deadline {
                            state.flush_requested = false;
                            state.deadline = None;
                            state.in_flight = true;
                            break state.pending.take().expect("pending snapshot");
                        }
                        let (next, _) = inner
                            .cv
                            .wait_timeout(state, deadline - now)
                            .expect("draft autosave cv poisoned");
                        state = next;
                    }
                    _ => {
                        // Nothing pending; a flush with nothing queued is
                        // already complete.
                        state.flush_requested = false;
                        inner.cv.notify_all();
                        state = inner.cv.wait(state).expect("draft autosave cv poisoned");
                    }
                }
            }
        };

        if let Ok(json) = serde_json::to_string(&snapshot) {
            slots.write(DRAFT_SLOT, &json);
        }

        let mut state = inner.state.lock().expect("draft autosave lock poisoned");
        state.in_flight = false;
        state.completed_writes += 1;
        inner.cv.notify_all();
    }
}
