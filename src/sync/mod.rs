// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triton-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triton and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Polling listing watcher.
//!
//! A single task re-lists the remote documents directory on a fixed interval
//! and on explicit pokes (enable, visibility restore, credential changes),
//! fingerprints the listing, and emits a change event only when the
//! fingerprint moved. The watcher never mutates the working post, even when
//! the open document's entry changed or vanished remotely, and its errors
//! stay on its own status surface.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use crate::format::slug::POSTS_DIR;
use crate::model::{newest_first_posts, ListingEntry};
use crate::remote::{ContentHost, RemoteError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Advisory counter that pauses polling while an interactive operation is in
/// flight. The same gate backs the caller's action controls.
#[derive(Debug, Clone, Default)]
pub struct BusyGate {
    active: Arc<AtomicUsize>,
}

impl BusyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&self) -> BusyGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            active: self.active.clone(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cheap change detector: ordered `path@hash` pairs, one per entry.
pub fn fingerprint(entries: &[ListingEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}@{}", entry.path, entry.content_hash))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The listing changed; entries are newest-first post files.
    Changed { entries: Vec<ListingEntry> },
    /// The listing is unchanged; only the "last checked" time moved.
    Checked { at: String },
    /// The poll failed; future ticks are unaffected.
    Failed { message: String },
}

#[derive(Debug)]
pub struct ListingWatcher {
    interval: Duration,
    enabled: AtomicBool,
    in_flight: AtomicBool,
    last_fingerprint: Mutex<Option<String>>,
    busy: Option<BusyGate>,
    wakeup: Notify,
}

impl ListingWatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            enabled: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
            last_fingerprint: Mutex::new(None),
            busy: None,
            wakeup: Notify::new(),
        }
    }

    pub fn with_busy_gate(mut self, gate: BusyGate) -> Self {
        self.busy = Some(gate);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enabling fires a cycle immediately; disabling lets the loop idle.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if enabled {
            self.wakeup.notify_one();
        }
    }

    /// Run-now trigger shared by explicit refresh, visibility restore and
    /// credential changes.
    pub fn poke(&self) {
        self.wakeup.notify_one();
    }

    /// One poll cycle. `None` when the cycle was skipped: the watcher is
    /// disabled, an interactive operation holds the busy gate, or a fetch is
    /// already in flight (no overlapping polls, no queueing).
    pub async fn run_cycle<H: ContentHost>(&self, host: &H) -> Option<SyncEvent> {
        if !self.is_enabled() {
            return None;
        }
        if self.busy.as_ref().is_some_and(BusyGate::is_busy) {
            return None;
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }

        let result = self.fetch_and_compare(host).await;
        self.in_flight.store(false, Ordering::SeqCst);

        Some(match result {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "listing poll failed");
                SyncEvent::Failed {
                    message: err.to_string(),
                }
            }
        })
    }

    async fn fetch_and_compare<H: ContentHost>(
        &self,
        host: &H,
    ) -> Result<SyncEvent, RemoteError> {
        let entries = host.list_dir(POSTS_DIR).await?.unwrap_or_default();
        let entries = newest_first_posts(entries);
        let next = fingerprint(&entries);

        let mut last = self
            .last_fingerprint
            .lock()
            .expect("fingerprint lock poisoned");
        if last.as_deref() == Some(next.as_str()) {
            Ok(SyncEvent::Checked { at: now_stamp() })
        } else {
            *last = Some(next);
            Ok(SyncEvent::Changed { entries })
        }
    }

    /// Drive the watcher until the receiver side of `events` is dropped.
    pub async fn run<H: ContentHost>(&self, host: &H, events: mpsc::Sender<SyncEvent>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wakeup.notified() => {}
            }
            if let Some(event) = self.run_cycle(host).await {
                if events.send(event).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::{fingerprint, BusyGate, ListingWatcher, SyncEvent, DEFAULT_POLL_INTERVAL};
    use crate::model::{ContentHash, EntryKind, ListingEntry};
    use crate::remote::{ContentHost, MemoryHost, RemoteError, RemoteFile, RepoInfo};

    struct FailingHost;

    fn unreachable_host() -> RemoteError {
        RemoteError::Transport {
            message: "connection reset".to_owned(),
        }
    }

    impl ContentHost for FailingHost {
        async fn repo_info(&self) -> Result<RepoInfo, RemoteError> {
            Err(unreachable_host())
        }

        async fn get_file(&self, _path: &str) -> Result<Option<RemoteFile>, RemoteError> {
            Err(unreachable_host())
        }

        async fn list_dir(
            &self,
            _path: &str,
        ) -> Result<Option<Vec<ListingEntry>>, RemoteError> {
            Err(unreachable_host())
        }

        async fn put_file(
            &self,
            _path: &str,
            _content: &str,
            _message: &str,
            _expected_hash: Option<&ContentHash>,
        ) -> Result<ContentHash, RemoteError> {
            Err(unreachable_host())
        }

        async fn delete_file(
            &self,
            _path: &str,
            _hash: &ContentHash,
            _message: &str,
        ) -> Result<(), RemoteError> {
            Err(unreachable_host())
        }

        fn can_write(&self) -> bool {
            false
        }
    }

    /// Yields once inside `list_dir`, so a second cycle can observe the
    /// first one's fetch in flight on a single-threaded runtime.
    struct SlowHost {
        inner: MemoryHost,
    }

    impl ContentHost for SlowHost {
        async fn repo_info(&self) -> Result<RepoInfo, RemoteError> {
            self.inner.repo_info().await
        }

        async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>, RemoteError> {
            self.inner.get_file(path).await
        }

        async fn list_dir(
            &self,
            path: &str,
        ) -> Result<Option<Vec<ListingEntry>>, RemoteError> {
            tokio::task::yield_now().await;
            self.inner.list_dir(path).await
        }

        async fn put_file(
            &self,
            path: &str,
            content: &str,
            message: &str,
            expected_hash: Option<&ContentHash>,
        ) -> Result<ContentHash, RemoteError> {
            self.inner.put_file(path, content, message, expected_hash).await
        }

        async fn delete_file(
            &self,
            path: &str,
            hash: &ContentHash,
            message: &str,
        ) -> Result<(), RemoteError> {
            self.inner.delete_file(path, hash, message).await
        }

        fn can_write(&self) -> bool {
            self.inner.can_write()
        }
    }

    fn entry(path: &str, hash: &str) -> ListingEntry {
        ListingEntry {
            name: path.rsplit('/').next().unwrap_or("").to_owned(),
            path: path.to_owned(),
            content_hash: ContentHash::new(hash),
            kind: EntryKind::File,
        }
    }

    #[test]
    fn fingerprint_orders_and_joins_path_hash_pairs() {
        let entries = [entry("_posts/b.md", "2"), entry("_posts/a.md", "1")];
        assert_eq!(fingerprint(&entries), "_posts/b.md@2\n_posts/a.md@1");
        assert_eq!(fingerprint(&[]), "");
    }

    #[tokio::test]
    async fn unchanged_listing_yields_exactly_one_change_event() {
        let host = MemoryHost::new();
        host.insert_raw("_posts/2024-01-01-a.md", "a");
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);

        let first = watcher.run_cycle(&host).await.expect("cycle ran");
        assert!(matches!(first, SyncEvent::Changed { .. }));

        let second = watcher.run_cycle(&host).await.expect("cycle ran");
        assert!(matches!(second, SyncEvent::Checked { .. }));

        let third = watcher.run_cycle(&host).await.expect("cycle ran");
        assert!(matches!(third, SyncEvent::Checked { .. }));
    }

    #[tokio::test]
    async fn mutated_entry_yields_exactly_one_more_change_event() {
        let host = MemoryHost::new();
        host.insert_raw("_posts/2024-01-01-a.md", "a");
        host.insert_raw("_posts/2024-01-02-b.md", "b");
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);

        assert!(matches!(
            watcher.run_cycle(&host).await,
            Some(SyncEvent::Changed { .. })
        ));

        host.insert_raw("_posts/2024-01-01-a.md", "a edited");

        match watcher.run_cycle(&host).await {
            Some(SyncEvent::Changed { entries }) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].name, "2024-01-02-b.md");
            }
            other => panic!("expected a change event, got: {other:?}"),
        }

        assert!(matches!(
            watcher.run_cycle(&host).await,
            Some(SyncEvent::Checked { .. })
        ));
    }

    #[tokio::test]
    async fn absent_directory_lists_as_empty_not_error() {
        let host = MemoryHost::new();
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);

        match watcher.run_cycle(&host).await {
            Some(SyncEvent::Changed { entries }) => assert!(entries.is_empty()),
            other => panic!("expected a change event, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_watcher_skips_cycles() {
        let host = MemoryHost::new();
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);
        watcher.set_enabled(false);
        assert_eq!(watcher.run_cycle(&host).await, None);
        assert_eq!(host.calls(), 0);

        watcher.set_enabled(true);
        assert!(watcher.run_cycle(&host).await.is_some());
    }

    #[tokio::test]
    async fn busy_gate_skips_the_tick_without_queueing() {
        let host = MemoryHost::new();
        let gate = BusyGate::new();
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL).with_busy_gate(gate.clone());

        let guard = gate.hold();
        assert_eq!(watcher.run_cycle(&host).await, None);
        assert_eq!(host.calls(), 0);
        drop(guard);

        assert!(!gate.is_busy());
        assert!(watcher.run_cycle(&host).await.is_some());
    }

    #[tokio::test]
    async fn overlapping_cycles_skip_instead_of_queueing() {
        let host = SlowHost {
            inner: MemoryHost::new(),
        };
        host.inner.insert_raw("_posts/2024-01-01-a.md", "a");
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);

        // The first cycle parks inside its listing fetch; the second sees it
        // in flight and skips.
        let (first, second) = tokio::join!(watcher.run_cycle(&host), watcher.run_cycle(&host));
        assert!(matches!(first, Some(SyncEvent::Changed { .. })));
        assert_eq!(second, None);

        // The guard was released with the cycle.
        assert!(matches!(
            watcher.run_cycle(&host).await,
            Some(SyncEvent::Checked { .. })
        ));
    }

    #[tokio::test]
    async fn poll_errors_surface_as_events_and_do_not_stop_the_watcher() {
        let watcher = ListingWatcher::new(DEFAULT_POLL_INTERVAL);

        match watcher.run_cycle(&FailingHost).await {
            Some(SyncEvent::Failed { message }) => assert!(message.contains("connection reset")),
            other => panic!("expected a failure event, got: {other:?}"),
        }

        // The in-flight guard was released; the next cycle runs again.
        assert!(matches!(
            watcher.run_cycle(&FailingHost).await,
            Some(SyncEvent::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn nested_busy_holds_release_in_order() {
        let gate = BusyGate::new();
        let outer = gate.hold();
        let inner = gate.hold();
        drop(inner);
        assert!(gate.is_busy());
        drop(outer);
        assert!(!gate.is_busy());
    }
}
