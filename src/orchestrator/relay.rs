//! Per-request event channel guarded against stale delivery.
//!
//! Every send happens under the relay's lock after checking the sender is
//! still installed. Invalidation removes the sender under the same lock and
//! wakes the request's task through [`Relay::cancelled`], so the task can
//! release its worker. Events already buffered when invalidation happens are
//! discarded by the subscriber side (`ScanHandle`).

use super::ScanState;
use super::result::{ScanOutcome, ScanResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Event observed by a request's subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Progress 0-100, never decreasing within a request
    Progress(u8),
    /// Terminal result; the last event of a request
    Finished(ScanResult),
}

struct Inner {
    sender: Option<UnboundedSender<ScanEvent>>,
    state: ScanState,
    last_progress: Option<u8>,
}

pub(crate) struct Relay {
    id: u64,
    inner: Mutex<Inner>,
    cancel: Notify,
}

impl Relay {
    pub(crate) fn new(id: u64, sender: UnboundedSender<ScanEvent>) -> Self {
        Self {
            id,
            inner: Mutex::new(Inner {
                sender: Some(sender),
                state: ScanState::Running,
                last_progress: None,
            }),
            cancel: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ScanState {
        self.lock().state
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state() == ScanState::Cancelled
    }

    /// Resolves once the request has been invalidated.
    ///
    /// Only the request's own task waits on this; `invalidate` leaves a
    /// permit behind if the task is not waiting yet.
    pub(crate) async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.cancel.notified().await;
        }
    }

    /// Forward progress if current and not lower than the last report
    pub(crate) fn progress(&self, percent: u8) {
        let mut inner = self.lock();
        if inner.last_progress.is_some_and(|last| percent < last) {
            return;
        }
        let Some(sender) = &inner.sender else {
            return;
        };
        if sender.send(ScanEvent::Progress(percent)).is_ok() {
            inner.last_progress = Some(percent);
        }
    }

    /// Deliver the terminal result and close the channel
    pub(crate) fn finish(&self, result: ScanResult) {
        let mut inner = self.lock();
        let Some(sender) = inner.sender.take() else {
            trace!(request = self.id, "dropping result of superseded request");
            return;
        };
        inner.state = match result.outcome {
            ScanOutcome::Failure(_) => ScanState::Failed,
            _ => ScanState::Completed,
        };
        let _ = sender.send(ScanEvent::Finished(result));
    }

    /// Stop all further delivery; returns whether the request was running
    pub(crate) fn invalidate(&self) -> bool {
        let mut inner = self.lock();
        if inner.sender.take().is_none() {
            return false;
        }
        inner.state = ScanState::Cancelled;
        drop(inner);
        self.cancel.notify_one();
        true
    }
}
