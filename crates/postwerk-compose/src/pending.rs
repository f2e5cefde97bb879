// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pending-completion registry.
//
// Every handed-off send gets a request code the OS echoes back when the user
// returns, and a oneshot channel that resolves exactly once: with the
// completion, or with `CompletionTimedOut`, `Cancelled` or `Superseded`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use postwerk_core::config::ComposerConfig;
use postwerk_core::error::{ComposerError, Result};
use postwerk_core::types::{Completion, CompletionTracking, RequestTag};

/// Highest request code `startActivityForResult` accepts from a
/// `FragmentActivity` (lower 16 bits).
pub const MAX_REQUEST_CODE: i32 = 0xFFFF;

type CompletionResult = Result<Completion>;

/// Waiting side of one pending send.
#[derive(Debug)]
pub struct CompletionHandle {
    tag: RequestTag,
    rx: oneshot::Receiver<CompletionResult>,
}

impl CompletionHandle {
    pub fn tag(&self) -> RequestTag {
        self.tag
    }

    /// Wait for the user to return, at most `timeout` (`None` = forever).
    ///
    /// A registry dropped without resolving the send reports `Cancelled`.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<Completion> {
        let received = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.rx)
                .await
                .map_err(|_| ComposerError::CompletionTimedOut)?,
            None => self.rx.await,
        };
        received.unwrap_or(Err(ComposerError::Cancelled))
    }
}

struct Entry {
    tag: RequestTag,
    tx: oneshot::Sender<CompletionResult>,
}

struct Inner {
    next_offset: i32,
    entries: HashMap<i32, Entry>,
}

/// Sends that were handed to the OS and have not completed yet.
pub struct PendingSends {
    tracking: CompletionTracking,
    base: i32,
    inner: Mutex<Inner>,
}

impl PendingSends {
    pub fn new(tracking: CompletionTracking, request_code_base: i32) -> Self {
        Self {
            tracking,
            base: request_code_base.clamp(0, MAX_REQUEST_CODE),
            inner: Mutex::new(Inner {
                next_offset: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Self::new(config.tracking, config.request_code_base)
    }

    pub fn tracking(&self) -> CompletionTracking {
        self.tracking
    }

    /// Allocate a request code and completion handle for a new send.
    ///
    /// Under `SingleSlot` tracking any outstanding send is superseded first
    /// and the same request code is reused.
    pub fn register(&self) -> Result<(RequestTag, CompletionHandle)> {
        let mut superseded = Vec::new();
        let (tag, rx) = {
            let mut inner = self.lock()?;

            let code = match self.tracking {
                CompletionTracking::SingleSlot => {
                    superseded.extend(inner.entries.drain().map(|(_, e)| e));
                    self.base
                }
                CompletionTracking::Correlated => self.allocate(&mut inner)?,
            };

            let tag = RequestTag::new(code);
            let (tx, rx) = oneshot::channel();
            inner.entries.insert(code, Entry { tag, tx });
            (tag, rx)
        };

        for entry in superseded {
            warn!(
                superseded = %entry.tag,
                "new send issued before the previous one completed; previous caller will not be notified"
            );
            let _ = entry.tx.send(Err(ComposerError::Superseded));
        }

        debug!(tag = %tag, "registered pending send");
        Ok((tag, CompletionHandle { tag, rx }))
    }

    /// Next free code in `base..=MAX_REQUEST_CODE`, wrapping around.
    fn allocate(&self, inner: &mut Inner) -> Result<i32> {
        let span = MAX_REQUEST_CODE - self.base + 1;
        for _ in 0..span {
            let code = self.base + inner.next_offset;
            inner.next_offset = (inner.next_offset + 1) % span;
            if !inner.entries.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(ComposerError::Bridge(format!(
            "all {span} request codes are in flight"
        )))
    }

    /// Deliver the OS result for `request_code`.
    ///
    /// Returns `false` if no send is waiting on that code, so the host can
    /// offer the result to other listeners.
    pub fn complete(&self, request_code: i32, result_code: i32) -> bool {
        let entry = match self.lock() {
            Ok(mut inner) => inner.entries.remove(&request_code),
            Err(_) => None,
        };
        match entry {
            Some(entry) => {
                info!(tag = %entry.tag, result_code, "email client returned");
                let _ = entry.tx.send(Ok(Completion::Returned { result_code }));
                true
            }
            None => {
                debug!(request_code, "activity result for unknown request code");
                false
            }
        }
    }

    /// Resolve the send `id` with `Cancelled`.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.take_by_id(id) {
            Some(entry) => {
                info!(tag = %entry.tag, "pending send cancelled");
                let _ = entry.tx.send(Err(ComposerError::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Drop the send `id` without notifying its handle.
    pub fn forget(&self, id: Uuid) -> bool {
        self.take_by_id(id).is_some()
    }

    /// Drop the send behind `request_code` without notifying its handle.
    /// Used when the chooser never launched.
    pub fn discard(&self, request_code: i32) {
        if let Ok(mut inner) = self.lock() {
            inner.entries.remove(&request_code);
        }
    }

    /// Resolve every send issued at or before `now - max_age` with
    /// `CompletionTimedOut`. Returns the expired tags.
    pub fn expire(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<RequestTag> {
        let expired: Vec<Entry> = match self.lock() {
            Ok(mut inner) => {
                let codes: Vec<i32> = inner
                    .entries
                    .iter()
                    .filter(|(_, e)| {
                        now.signed_duration_since(e.tag.issued_at)
                            .to_std()
                            .is_ok_and(|age| age >= max_age)
                    })
                    .map(|(code, _)| *code)
                    .collect();
                codes
                    .into_iter()
                    .filter_map(|code| inner.entries.remove(&code))
                    .collect()
            }
            Err(_) => Vec::new(),
        };

        expired
            .into_iter()
            .map(|entry| {
                warn!(tag = %entry.tag, "pending send expired");
                let _ = entry.tx.send(Err(ComposerError::CompletionTimedOut));
                entry.tag
            })
            .collect()
    }

    /// Tags still waiting, oldest first.
    pub fn outstanding(&self) -> Vec<RequestTag> {
        let mut tags: Vec<RequestTag> = self
            .lock()
            .map(|inner| inner.entries.values().map(|e| e.tag).collect())
            .unwrap_or_default();
        tags.sort_by_key(|t| t.issued_at);
        tags
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_by_id(&self, id: Uuid) -> Option<Entry> {
        let mut inner = self.lock().ok()?;
        let code = inner
            .entries
            .iter()
            .find(|(_, e)| e.tag.id == id)
            .map(|(code, _)| *code)?;
        inner.entries.remove(&code)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ComposerError::Bridge("pending send registry poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated() -> PendingSends {
        PendingSends::new(CompletionTracking::Correlated, 607)
    }

    #[tokio::test]
    async fn completion_reaches_its_own_handle() {
        let pending = correlated();
        let (first, first_handle) = pending.register().unwrap();
        let (second, second_handle) = pending.register().unwrap();
        assert_eq!(first.request_code, 607);
        assert_eq!(second.request_code, 608);
        assert_ne!(first.id, second.id);

        assert!(pending.complete(608, -1));
        assert!(pending.complete(607, 0));

        assert_eq!(
            second_handle.wait(None).await.unwrap(),
            Completion::Returned { result_code: -1 }
        );
        assert_eq!(
            first_handle.wait(None).await.unwrap(),
            Completion::Returned { result_code: 0 }
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn unknown_code_is_not_consumed() {
        let pending = correlated();
        let _ = pending.register().unwrap();
        assert!(!pending.complete(9999, 0));
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn single_slot_supersedes_previous_send() {
        let pending = PendingSends::new(CompletionTracking::SingleSlot, 607);
        let (first, first_handle) = pending.register().unwrap();
        let (second, second_handle) = pending.register().unwrap();
        assert_eq!(first.request_code, second.request_code);
        assert_eq!(pending.len(), 1);

        assert!(pending.complete(607, 0));

        // The first caller never sees a completion.
        assert!(matches!(
            first_handle.wait(None).await,
            Err(ComposerError::Superseded)
        ));
        assert!(second_handle.wait(None).await.is_ok());
    }

    #[tokio::test]
    async fn wait_is_bounded() {
        let pending = correlated();
        let (tag, handle) = pending.register().unwrap();
        let err = handle.wait(Some(Duration::from_millis(10))).await.unwrap_err();
        assert!(matches!(err, ComposerError::CompletionTimedOut));
        // The entry is still there until someone forgets it.
        assert!(pending.forget(tag.id));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn cancel_resolves_handle() {
        let pending = correlated();
        let (tag, handle) = pending.register().unwrap();
        assert!(pending.cancel(tag.id));
        assert!(!pending.cancel(tag.id));
        assert!(matches!(handle.wait(None).await, Err(ComposerError::Cancelled)));
    }

    #[tokio::test]
    async fn expire_times_out_old_sends() {
        let pending = correlated();
        let (old, old_handle) = pending.register().unwrap();
        let later = old.issued_at + chrono::Duration::seconds(120);

        let expired = pending.expire(later, Duration::from_secs(60));
        assert_eq!(expired, vec![old]);
        assert!(matches!(
            old_handle.wait(None).await,
            Err(ComposerError::CompletionTimedOut)
        ));

        let (_fresh, _handle) = pending.register().unwrap();
        assert!(pending.expire(Utc::now(), Duration::from_secs(60)).is_empty());
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn dropped_registry_cancels_waiters() {
        let pending = correlated();
        let (_tag, handle) = pending.register().unwrap();
        drop(pending);
        assert!(matches!(handle.wait(None).await, Err(ComposerError::Cancelled)));
    }

    #[test]
    fn codes_wrap_and_skip_in_flight() {
        let pending = PendingSends::new(CompletionTracking::Correlated, MAX_REQUEST_CODE - 1);
        let (a, _ha) = pending.register().unwrap();
        let (b, _hb) = pending.register().unwrap();
        assert_eq!((a.request_code, b.request_code), (MAX_REQUEST_CODE - 1, MAX_REQUEST_CODE));

        // Both codes in flight: the range is exhausted.
        assert!(matches!(pending.register(), Err(ComposerError::Bridge(_))));

        pending.discard(a.request_code);
        let (c, _hc) = pending.register().unwrap();
        assert_eq!(c.request_code, MAX_REQUEST_CODE - 1);
    }

    #[test]
    fn outstanding_is_oldest_first() {
        let pending = correlated();
        let (a, _ha) = pending.register().unwrap();
        let (b, _hb) = pending.register().unwrap();
        let tags = pending.outstanding();
        assert_eq!(tags.len(), 2);
        assert!(tags[0].issued_at <= tags[1].issued_at);
        assert!(tags.contains(&a) && tags.contains(&b));
    }
}
