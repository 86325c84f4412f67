//! # Decoder Adapter
//!
//! Wraps a barcode decoding engine and owns the camera for as long as a
//! scan is running.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Decoder Adapter Lifecycle                        │
//! │                                                                         │
//! │  adapter.start(surface)                                                │
//! │       │                                                                 │
//! │       ├── engine.open(OpenRequest { surface, config, sink })           │
//! │       │        │                                                        │
//! │       │        ├── Err(CameraError) ──► nothing leased, no stream      │
//! │       │        │                                                        │
//! │       │        └── Ok(handle) ──► CameraLease { handle }               │
//! │       ▼                                                                 │
//! │  DetectionStream ◄── sink.push(RawDetection) (engine threads)          │
//! │       │                                                                 │
//! │  adapter.stop()  /  adapter dropped  /  lease dropped                  │
//! │       │                                                                 │
//! │       ├── gate closed: later pushes are refused                        │
//! │       ├── stream.recv() returns None from now on                       │
//! │       └── handle.release() exactly once                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//! Engines usually decode on their own worker threads. [`DetectionSink`] is
//! `Clone + Send` and never blocks, so an engine may push from anywhere.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::Symbology;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::CameraError;

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;

// =============================================================================
// Configuration
// =============================================================================

/// Which camera to ask the engine for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera on phones and tablets.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Engine configuration handed over on every `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Symbologies the engine should try. Detections of anything else are dropped.
    pub symbologies: Vec<Symbology>,

    /// Which camera to use.
    pub facing: FacingMode,

    /// Decoder worker threads.
    pub workers: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            symbologies: Symbology::ALL.to_vec(),
            facing: FacingMode::Environment,
            workers: default_workers(),
        }
    }
}

impl DecoderConfig {
    /// Restricts the enabled symbologies.
    pub fn symbologies(mut self, symbologies: impl IntoIterator<Item = Symbology>) -> Self {
        self.symbologies = symbologies.into_iter().collect();
        self
    }

    /// Sets the decoder worker count (at least one).
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets the camera facing mode.
    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    /// Whether detections of `symbology` are delivered.
    pub fn enables(&self, symbology: Symbology) -> bool {
        self.symbologies.contains(&symbology)
    }
}

/// Hardware parallelism, or [`FALLBACK_WORKERS`] if it cannot be determined.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// Opaque handle to wherever the engine should render its live preview.
///
/// The adapter never looks inside; it is passed through to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewSurface {
    id: String,
}

impl PreviewSurface {
    pub fn new(id: impl Into<String>) -> Self {
        PreviewSurface { id: id.into() }
    }

    /// A surface for engines that render nothing (wedge scanners, tests).
    pub fn headless() -> Self {
        PreviewSurface::new("headless")
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Detections
// =============================================================================

/// What an engine reports for one decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetection {
    pub code: String,
    pub symbology: Symbology,
}

impl RawDetection {
    pub fn new(code: impl Into<String>, symbology: Symbology) -> Self {
        RawDetection {
            code: code.into(),
            symbology,
        }
    }
}

/// A detection stamped by the adapter.
///
/// `timestamp` is monotonic and drives the cooldown; `detected_at` is the
/// wall clock time shown in the scan history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub code: String,
    pub symbology: Symbology,
    pub timestamp: Instant,
    pub detected_at: DateTime<Utc>,
}

/// Open/closed flag shared by the sink, the stream and the lease.
#[derive(Debug)]
struct Gate {
    open: AtomicBool,
    closed: Notify,
}

impl Gate {
    fn new() -> Arc<Self> {
        Arc::new(Gate {
            open: AtomicBool::new(true),
            closed: Notify::new(),
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.closed.notify_waiters();
    }
}

/// Where an engine pushes its detections.
#[derive(Debug, Clone)]
pub struct DetectionSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
    gate: Arc<Gate>,
    enabled: Arc<[Symbology]>,
}

impl DetectionSink {
    /// Delivers one detection.
    ///
    /// Returns `false` if the detection was dropped: blank code, symbology not
    /// enabled, or the subscription already closed.
    pub fn push(&self, detection: RawDetection) -> bool {
        if !self.gate.is_open() {
            trace!(code = %detection.code, "Detection after stop, dropped");
            return false;
        }

        let code = detection.code.trim();
        if code.is_empty() {
            return false;
        }

        if !self.enabled.contains(&detection.symbology) {
            trace!(
                code = %code,
                symbology = %detection.symbology,
                "Symbology not enabled, dropped"
            );
            return false;
        }

        let event = ScanEvent {
            code: code.to_string(),
            symbology: detection.symbology,
            timestamp: Instant::now(),
            detected_at: Utc::now(),
        };

        self.tx.send(event).is_ok()
    }

    /// Whether the subscription this sink feeds is still open.
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }
}

/// Subscription to an adapter's detections.
///
/// Ends for good once the adapter stops: `recv` returns `None`, even if
/// detections were still queued.
#[derive(Debug)]
pub struct DetectionStream {
    rx: mpsc::UnboundedReceiver<ScanEvent>,
    gate: Arc<Gate>,
}

impl DetectionStream {
    /// Waits for the next detection.
    ///
    /// ## Cancel Safety
    /// Cancel safe. A detection is only taken off the queue in the poll that
    /// returns it.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        // Register before checking, so a close in between still wakes us
        let closed = self.gate.closed.notified();
        if !self.gate.is_open() {
            return None;
        }

        tokio::select! {
            biased;
            _ = closed => None,
            event = self.rx.recv() => event.filter(|_| self.gate.is_open()),
        }
    }

    /// Whether the adapter is still delivering into this stream.
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }
}

// =============================================================================
// Engine Seam
// =============================================================================

/// Everything an engine needs to start decoding.
#[derive(Debug)]
pub struct OpenRequest {
    pub surface: PreviewSurface,
    pub config: DecoderConfig,
    pub sink: DetectionSink,
}

/// A running engine instance holding the camera.
pub trait CameraHandle: Send {
    /// Stops decoding and gives the camera back. Called exactly once.
    fn release(&mut self);
}

/// A barcode decoding engine (camera library, keyboard wedge, test fake).
pub trait DecoderEngine: Send + Sync {
    /// Acquires the camera and starts pushing detections into `request.sink`.
    fn open(&self, request: OpenRequest) -> Result<Box<dyn CameraHandle>, CameraError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "decoder"
    }
}

/// Exclusive hold on the camera.
///
/// Released on [`CameraLease::release`] or on drop, whichever comes first.
pub struct CameraLease {
    handle: Option<Box<dyn CameraHandle>>,
    gate: Arc<Gate>,
}

impl CameraLease {
    /// Closes the subscription and releases the engine handle. Idempotent.
    pub fn release(&mut self) {
        self.gate.close();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
            debug!("Camera released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraLease")
            .field("held", &self.is_held())
            .finish()
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Starts and stops one engine, holding at most one camera lease.
pub struct DecoderAdapter {
    engine: Arc<dyn DecoderEngine>,
    config: DecoderConfig,
    lease: Option<CameraLease>,
}

impl DecoderAdapter {
    pub fn new(engine: Arc<dyn DecoderEngine>, config: DecoderConfig) -> Self {
        DecoderAdapter {
            engine,
            config,
            lease: None,
        }
    }

    /// Acquires the camera and subscribes to detections.
    ///
    /// ## Errors
    /// - `CameraError::Busy` if this adapter is already running
    /// - whatever the engine reports (permission, device, init)
    pub fn start(&mut self, surface: PreviewSurface) -> Result<DetectionStream, CameraError> {
        if self.is_running() {
            return Err(CameraError::Busy);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let gate = Gate::new();
        let sink = DetectionSink {
            tx,
            gate: Arc::clone(&gate),
            enabled: self.config.symbologies.iter().copied().collect(),
        };

        debug!(
            engine = self.engine.name(),
            surface = surface.id(),
            workers = self.config.workers,
            "Opening decoder"
        );

        let request = OpenRequest {
            surface,
            config: self.config.clone(),
            sink,
        };

        match self.engine.open(request) {
            Ok(handle) => {
                info!(engine = self.engine.name(), "Decoder started");
                self.lease = Some(CameraLease {
                    handle: Some(handle),
                    gate: Arc::clone(&gate),
                });
                Ok(DetectionStream { rx, gate })
            }
            Err(err) => {
                gate.close();
                warn!(engine = self.engine.name(), error = %err, "Decoder failed to start");
                Err(err)
            }
        }
    }

    /// Releases the camera. No-op when not running.
    pub fn stop(&mut self) {
        if let Some(mut lease) = self.lease.take() {
            lease.release();
            info!(engine = self.engine.name(), "Decoder stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lease.as_ref().is_some_and(CameraLease::is_held)
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl std::fmt::Debug for DecoderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderAdapter")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .field("lease", &self.lease)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;
    use std::time::Duration;

    fn adapter(engine: &Arc<FakeEngine>) -> DecoderAdapter {
        DecoderAdapter::new(engine.clone(), DecoderConfig::default())
    }

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.symbologies.len(), 9);
        assert_eq!(config.facing, FacingMode::Environment);
        assert!(config.workers >= 1);
        assert!(config.enables(Symbology::Codabar));
    }

    #[tokio::test]
    async fn test_start_delivers_detections() {
        let engine = FakeEngine::new();
        let mut adapter = adapter(&engine);

        let mut stream = adapter.start(PreviewSurface::headless()).unwrap();
        assert!(adapter.is_running());
        assert_eq!(engine.open_handles(), 1);

        assert!(engine.detect(" 0123456789012 ", Symbology::Ean13));
        let event = stream.recv().await.unwrap();
        assert_eq!(event.code, "0123456789012");
        assert_eq!(event.symbology, Symbology::Ean13);
    }

    #[tokio::test]
    async fn test_stop_releases_and_ends_stream() {
        let engine = FakeEngine::new();
        let mut adapter = adapter(&engine);
        let mut stream = adapter.start(PreviewSurface::headless()).unwrap();

        // Queued before stop, never delivered after it
        engine.detect("A1", Symbology::Code128);
        adapter.stop();

        assert!(!adapter.is_running());
        assert_eq!(engine.open_handles(), 0);
        assert_eq!(stream.recv().await, None);
        assert!(!engine.detect("A2", Symbology::Code128));

        // Stopping twice is harmless
        adapter.stop();
        assert_eq!(engine.released(), 1);
    }

    #[tokio::test]
    async fn test_stop_wakes_pending_recv() {
        let engine = FakeEngine::new();
        let mut adapter = adapter(&engine);
        let mut stream = adapter.start(PreviewSurface::headless()).unwrap();

        let waiter = tokio::spawn(async move { stream.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        adapter.stop();

        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disabled_symbology_is_dropped() {
        let engine = FakeEngine::new();
        let mut adapter = DecoderAdapter::new(
            engine.clone(),
            DecoderConfig::default().symbologies([Symbology::Ean13]),
        );
        let mut stream = adapter.start(PreviewSurface::headless()).unwrap();

        assert!(!engine.detect("CODE39", Symbology::Code39));
        assert!(!engine.detect("   ", Symbology::Ean13));
        assert!(engine.detect("0123456789012", Symbology::Ean13));

        assert_eq!(stream.recv().await.unwrap().code, "0123456789012");
    }

    #[test]
    fn test_start_failure_leases_nothing() {
        let engine = FakeEngine::new();
        engine.deny(CameraError::PermissionDenied);
        let mut adapter = adapter(&engine);

        let err = adapter.start(PreviewSurface::headless()).unwrap_err();
        assert_eq!(err, CameraError::PermissionDenied);
        assert!(!adapter.is_running());
        assert_eq!(engine.open_handles(), 0);
    }

    #[test]
    fn test_second_start_is_busy() {
        let engine = FakeEngine::new();
        let mut adapter = adapter(&engine);
        let _stream = adapter.start(PreviewSurface::headless()).unwrap();

        assert_eq!(
            adapter.start(PreviewSurface::headless()).unwrap_err(),
            CameraError::Busy
        );
        assert_eq!(engine.opened(), 1);
    }

    #[test]
    fn test_drop_releases_camera() {
        let engine = FakeEngine::new();
        {
            let mut adapter = adapter(&engine);
            let _stream = adapter.start(PreviewSurface::headless()).unwrap();
            assert_eq!(engine.open_handles(), 1);
        }
        assert_eq!(engine.open_handles(), 0);
    }
}
