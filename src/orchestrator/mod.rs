//! Asynchronous scan orchestration.
//!
//! An [`Orchestrator`] accepts one image at a time. Submitting a new request
//! supersedes the one in flight: the old request's subscriber receives
//! nothing further once `submit` returns, including events it had not read
//! yet. A superseded OCR request drops its recognition and terminates the
//! worker. QR requests run the local pipeline on the blocking pool, where a
//! superseded pass runs to the end and its result is dropped. OCR requests
//! drive an injected [`OcrEngine`] under a silence timeout.
//!
//! ```text
//!  Idle --submit--> Running --+--> Completed
//!                      |      +--> Failed
//!                      +--submit/cancel--> Cancelled
//! ```

pub mod engine;
pub(crate) mod relay;
pub mod result;

pub use engine::{EngineFuture, OcrEngine, OcrWorker, ProgressSink, Recognition};
pub use relay::ScanEvent;
pub use result::{ConfidenceBand, ScanMode, ScanOutcome, ScanResult, word_count};

use crate::config::ScanConfig;
use crate::error::{FailureReason, LoadError};
use crate::models::ImageBuffer;
use crate::pipeline::QrPipeline;
use crate::utils::grayscale;
use engine::WorkerGuard;
use relay::Relay;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

/// Lifecycle of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Nothing submitted yet
    Idle,
    /// Submitted and not yet settled
    Running,
    /// A result was delivered
    Completed,
    /// Superseded by a newer request or cancelled explicitly
    Cancelled,
    /// The request ended with a [`ScanOutcome::Failure`]
    Failed,
}

/// Caller-supplied image
#[derive(Debug, Clone)]
pub enum ScanSource {
    /// Encoded file bytes (PNG, JPEG, ...)
    Encoded(Vec<u8>),
    /// Packed 8-bit RGB
    Rgb {
        /// Row-major pixels, 3 bytes each
        data: Vec<u8>,
        /// Width in pixels
        width: usize,
        /// Height in pixels
        height: usize,
    },
    /// Packed 8-bit RGBA
    Rgba {
        /// Row-major pixels, 4 bytes each
        data: Vec<u8>,
        /// Width in pixels
        width: usize,
        /// Height in pixels
        height: usize,
    },
    /// Already converted luminance
    Luma(ImageBuffer),
}

impl ScanSource {
    /// Convert to luminance, rejecting encoded input above `max_encoded_bytes`
    pub fn load(self, max_encoded_bytes: usize) -> Result<ImageBuffer, LoadError> {
        match self {
            ScanSource::Encoded(bytes) => grayscale::load_with_limit(&bytes, max_encoded_bytes),
            ScanSource::Rgb {
                data,
                width,
                height,
            } => grayscale::from_rgb(&data, width, height),
            ScanSource::Rgba {
                data,
                width,
                height,
            } => grayscale::from_rgba(&data, width, height),
            ScanSource::Luma(image) => Ok(image),
        }
    }
}

/// Subscriber side of one request
pub struct ScanHandle {
    id: u64,
    mode: ScanMode,
    relay: Arc<Relay>,
    events: mpsc::UnboundedReceiver<ScanEvent>,
}

impl ScanHandle {
    /// Request id, increasing with each submission
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mode the request was submitted with
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Current lifecycle state of this request
    pub fn state(&self) -> ScanState {
        self.relay.state()
    }

    /// Next progress or terminal event; `None` once the request is finished
    /// or has been superseded.
    ///
    /// Events still buffered when the request is superseded are discarded,
    /// never delivered.
    pub async fn next_event(&mut self) -> Option<ScanEvent> {
        if self.relay.is_cancelled() {
            self.discard();
            return None;
        }
        let event = self.events.recv().await?;
        if self.relay.is_cancelled() {
            self.discard();
            return None;
        }
        Some(event)
    }

    /// Wait for the terminal result, skipping progress.
    ///
    /// `None` when the request was cancelled before it finished.
    pub async fn result(mut self) -> Option<ScanResult> {
        while let Some(event) = self.next_event().await {
            if let ScanEvent::Finished(result) = event {
                return Some(result);
            }
        }
        None
    }

    fn discard(&mut self) {
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }
}

impl std::fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHandle")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("state", &self.state())
            .finish()
    }
}

/// Single-slot scan scheduler
pub struct Orchestrator {
    config: Arc<ScanConfig>,
    pipeline: Arc<QrPipeline>,
    engine: Option<Arc<dyn OcrEngine>>,
    active: Mutex<Option<Arc<Relay>>>,
    next_id: AtomicU64,
}

impl Orchestrator {
    /// Orchestrator without a recognition engine; OCR requests fail with
    /// `EngineUnavailable`
    pub fn new(config: ScanConfig) -> Self {
        let pipeline = QrPipeline::new(config.qr);
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            engine: None,
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Use `engine` for OCR requests
    pub fn with_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Replace the QR pipeline (e.g. with a different error corrector)
    pub fn with_pipeline(mut self, pipeline: QrPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Start a request, superseding any request still running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, source: ScanSource, mode: ScanMode) -> ScanHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, events) = mpsc::unbounded_channel();
        let relay = Arc::new(Relay::new(id, sender));

        {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = active.replace(Arc::clone(&relay)) {
                if previous.invalidate() {
                    debug!(request = previous.id(), by = id, "request superseded");
                }
            }
        }
        info!(request = id, ?mode, "scan submitted");

        let task = ScanTask {
            relay: Arc::clone(&relay),
            config: Arc::clone(&self.config),
            pipeline: Arc::clone(&self.pipeline),
            engine: self.engine.clone(),
        };
        tokio::spawn(task.run(source, mode));

        ScanHandle {
            id,
            mode,
            relay,
            events,
        }
    }

    /// Cancel the current request; returns whether one was running
    pub fn cancel(&self) -> bool {
        let active = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match active {
            Some(relay) if relay.invalidate() => {
                debug!(request = relay.id(), "request cancelled");
                true
            }
            _ => false,
        }
    }

    /// State of the most recent request, `Idle` before the first
    pub fn state(&self) -> ScanState {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(ScanState::Idle, |relay| relay.state())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("has_engine", &self.engine.is_some())
            .field("state", &self.state())
            .finish()
    }
}

/// Everything one spawned request needs
struct ScanTask {
    relay: Arc<Relay>,
    config: Arc<ScanConfig>,
    pipeline: Arc<QrPipeline>,
    engine: Option<Arc<dyn OcrEngine>>,
}

impl ScanTask {
    async fn run(self, source: ScanSource, mode: ScanMode) {
        let result = match mode {
            ScanMode::Qr => Some(self.run_qr(source).await),
            ScanMode::Ocr => self.run_ocr(source).await,
        };
        let Some(result) = result else {
            debug!(request = self.relay.id(), "scan abandoned after cancellation");
            return;
        };
        info!(
            request = self.relay.id(),
            outcome = ?result.outcome,
            confidence = result.confidence,
            words = result.word_count,
            "scan finished"
        );
        self.relay.finish(result);
    }

    async fn run_qr(&self, source: ScanSource) -> ScanResult {
        self.relay.progress(0);
        let pipeline = Arc::clone(&self.pipeline);
        let limit = self.config.max_encoded_bytes;
        let joined = tokio::task::spawn_blocking(move || {
            source.load(limit).map(|image| pipeline.run(&image))
        })
        .await;
        self.relay.progress(100);

        match joined {
            Ok(Ok(outcome)) => ScanResult::from_qr(&outcome),
            Ok(Err(err)) => {
                debug!(request = self.relay.id(), %err, "image rejected");
                ScanResult::failure(ScanMode::Qr, err.reason())
            }
            Err(err) => {
                warn!(request = self.relay.id(), %err, "qr pipeline task failed");
                ScanResult::failure(ScanMode::Qr, FailureReason::UnreadableImage)
            }
        }
    }

    /// `None` when the request is cancelled while waiting on the engine; the
    /// worker, if any, has been terminated by then
    async fn run_ocr(&self, source: ScanSource) -> Option<ScanResult> {
        let Some(engine) = self.engine.clone() else {
            warn!(request = self.relay.id(), "no recognition engine configured");
            return Some(ScanResult::failure(ScanMode::Ocr, FailureReason::EngineUnavailable));
        };

        let limit = self.config.max_encoded_bytes;
        let image = match tokio::task::spawn_blocking(move || source.load(limit)).await {
            Ok(Ok(image)) => Arc::new(image),
            Ok(Err(err)) => {
                debug!(request = self.relay.id(), %err, "image rejected");
                return Some(ScanResult::failure(ScanMode::Ocr, err.reason()));
            }
            Err(err) => {
                warn!(request = self.relay.id(), %err, "image load task failed");
                return Some(ScanResult::failure(
                    ScanMode::Ocr,
                    FailureReason::UnreadableImage,
                ));
            }
        };

        let silence = self.config.engine_silence_timeout;
        let startup = tokio::select! {
            biased;
            _ = self.relay.cancelled() => return None,
            startup = tokio::time::timeout(silence, engine.create_worker()) => startup,
        };
        let worker = match startup {
            Ok(Ok(worker)) => worker,
            Ok(Err(err)) => {
                warn!(request = self.relay.id(), %err, "worker startup failed");
                return Some(ScanResult::failure(ScanMode::Ocr, err.reason()));
            }
            Err(_) => {
                warn!(request = self.relay.id(), "worker startup timed out");
                return Some(ScanResult::failure(ScanMode::Ocr, FailureReason::Timeout));
            }
        };

        let mut guard = WorkerGuard::new(worker);
        let activity = Arc::new(Notify::new());
        let sink = ProgressSink::new(Arc::clone(&self.relay), Arc::clone(&activity));

        let outcome = {
            let mut recognition = guard.recognize(image, sink);
            loop {
                tokio::select! {
                    biased;
                    _ = self.relay.cancelled() => {
                        debug!(request = self.relay.id(), "request cancelled, releasing worker");
                        break None;
                    }
                    result = &mut recognition => {
                        break Some(result.map_err(|err| {
                            warn!(request = self.relay.id(), %err, "recognition failed");
                            err.reason()
                        }));
                    }
                    _ = activity.notified() => continue,
                    _ = tokio::time::sleep(silence) => {
                        warn!(request = self.relay.id(), ?silence, "engine went silent");
                        break Some(Err(FailureReason::Timeout));
                    }
                }
            }
        };
        drop(guard);

        Some(match outcome? {
            Ok(recognition) => {
                ScanResult::from_recognition(recognition, self.config.low_confidence_threshold)
            }
            Err(reason) => ScanResult::failure(ScanMode::Ocr, reason),
        })
    }
}
