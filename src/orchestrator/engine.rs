//! Seam for the external text recognition engine.
//!
//! The engine is a black box: it creates workers, a worker recognizes one
//! image while reporting progress, and a worker must be terminated when the
//! request is done with it. [`WorkerGuard`] ties termination to scope so
//! every exit path (success, error, timeout, supersession) releases it.

use super::relay::Relay;
use crate::error::EngineError;
use crate::models::ImageBuffer;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Notify;

/// Boxed future returned by engine and worker methods
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Raw output of a recognition pass
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Recognized text, untrimmed
    pub text: String,
    /// Engine-reported confidence, 0-100
    pub confidence: f32,
}

/// Factory for recognition workers
pub trait OcrEngine: Send + Sync {
    /// Start a worker, ready to recognize once the future resolves
    fn create_worker(&self) -> EngineFuture<'_, Box<dyn OcrWorker>>;
}

/// One recognition worker
pub trait OcrWorker: Send {
    /// Recognize text in `image`, reporting progress (0-100) through `progress`
    fn recognize<'a>(
        &'a mut self,
        image: Arc<ImageBuffer>,
        progress: ProgressSink,
    ) -> EngineFuture<'a, Recognition>;

    /// Release the worker's resources; called exactly once
    fn terminate(&mut self);
}

/// Progress callback handed to a worker.
///
/// Reports are forwarded to the request's subscriber only while the request
/// is current, and every report counts as engine activity for the silence
/// timeout.
#[derive(Clone)]
pub struct ProgressSink {
    relay: Arc<Relay>,
    activity: Arc<Notify>,
}

impl ProgressSink {
    pub(crate) fn new(relay: Arc<Relay>, activity: Arc<Notify>) -> Self {
        Self { relay, activity }
    }

    /// Report completion as a percentage (clamped to 0-100)
    pub fn report(&self, percent: f32) {
        self.activity.notify_one();
        let percent = if percent.is_nan() {
            0
        } else {
            percent.round().clamp(0.0, 100.0) as u8
        };
        self.relay.progress(percent);
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSink")
            .field("request", &self.relay.id())
            .finish()
    }
}

/// Terminates the wrapped worker when dropped
pub(crate) struct WorkerGuard {
    worker: Box<dyn OcrWorker>,
}

impl WorkerGuard {
    pub(crate) fn new(worker: Box<dyn OcrWorker>) -> Self {
        Self { worker }
    }

    pub(crate) fn recognize(
        &mut self,
        image: Arc<ImageBuffer>,
        progress: ProgressSink,
    ) -> EngineFuture<'_, Recognition> {
        self.worker.recognize(image, progress)
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        self.worker.terminate();
    }
}
