//! # Scan Session Controller
//!
//! One `ScanSession` per station view. It owns the decoder adapter, the
//! cooldown gate and the scan history, and walks through one scan at a time.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │          begin_session()               next_detection() accepts        │
//! │   Idle ─────────────────────► Active ───────────────────────► Accepted │
//! │    ▲  ▲    (camera leased)    │    ▲   (camera released first)    │    │
//! │    │  │                pause()│    │resume()                      │    │
//! │    │  │                       ▼    │                              │    │
//! │    │  └────── end_session() ─ Paused                              │    │
//! │    │                                                              │    │
//! │    └──────────────── resolve(): lookup + history entry ───────────┘    │
//! │                      (LookupFailed also lands here, no entry)          │
//! │                                                                         │
//! │  Camera failure in begin_session(): stays Idle, error kept in          │
//! │  last_error and emitted, never retried.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single Shot
//! Accepting a detection stops the decoder before anything else happens, so
//! the same label held in front of the camera cannot produce a second lookup.
//! The cooldown gate lives as long as the session, so a quick `begin_session`
//! right after an accepted scan still refuses the label for the rest of the
//! cooldown.
//!
//! ## Concurrency
//! Every operation takes `&mut self`: one task drives the session and at most
//! one lookup is in flight. `next_detection` is cancel safe, so it can sit in a
//! `tokio::select!` next to operator input.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stockroom_core::{Product, ProductDraft, ScanHistoryEntry, SessionState};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::audio::{AudioCue, SilentCue};
use crate::catalog::Catalog;
use crate::debounce::Debouncer;
use crate::decoder::{DecoderAdapter, DecoderConfig, DecoderEngine, DetectionStream, PreviewSurface, ScanEvent};
use crate::error::{CameraError, ScanError, ScanResult};
use crate::history::ScanHistory;
use crate::lookup::{self, LookupResolution};

// =============================================================================
// Event Emitter
// =============================================================================

/// Receives session events for a front end.
pub trait SessionEmitter: Send + Sync {
    /// The session moved to a new state.
    fn emit_state(&self, state: SessionState);

    /// A scan was resolved and recorded.
    fn emit_history(&self, entry: &ScanHistoryEntry);

    /// Something went wrong that the operator should see.
    fn emit_error(&self, error: &ScanError);
}

/// Emitter that drops everything.
pub struct NoOpEmitter;

impl SessionEmitter for NoOpEmitter {
    fn emit_state(&self, _state: SessionState) {}
    fn emit_history(&self, _entry: &ScanHistoryEntry) {}
    fn emit_error(&self, _error: &ScanError) {}
}

/// Session events as owned values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    State { state: SessionState },
    History { entry: ScanHistoryEntry },
    Error { message: String },
}

/// Emitter that forwards every event into a channel.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelEmitter { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.tx.send(event);
    }
}

impl SessionEmitter for ChannelEmitter {
    fn emit_state(&self, state: SessionState) {
        self.send(SessionEvent::State { state });
    }

    fn emit_history(&self, entry: &ScanHistoryEntry) {
        self.send(SessionEvent::History {
            entry: entry.clone(),
        });
    }

    fn emit_error(&self, error: &ScanError) {
        self.send(SessionEvent::Error {
            message: error.to_string(),
        });
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// How a session drives its decoder.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub decoder: DecoderConfig,
    pub cooldown: Duration,
    pub surface: PreviewSurface,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            decoder: DecoderConfig::default(),
            cooldown: Duration::from_millis(stockroom_core::DEFAULT_SCAN_COOLDOWN_MS),
            surface: PreviewSurface::headless(),
        }
    }
}

impl SessionConfig {
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn surface(mut self, surface: PreviewSurface) -> Self {
        self.surface = surface;
        self
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// The scan session controller.
///
/// ## Usage
/// ```rust,ignore
/// let mut session = ScanSession::new(engine, Arc::new(db.products()), SessionConfig::default());
///
/// session.begin_session()?;
/// match session.scan_once().await? {
///     LookupResolution::Found(product) => println!("{} x{}", product.name, product.quantity),
///     LookupResolution::NotFound(draft) => { /* show the creation form */ }
/// }
/// ```
pub struct ScanSession {
    adapter: DecoderAdapter,
    surface: PreviewSurface,
    catalog: Arc<dyn Catalog>,
    audio: Arc<dyn AudioCue>,
    emitter: Arc<dyn SessionEmitter>,
    debouncer: Debouncer,
    history: ScanHistory,
    state: SessionState,
    stream: Option<DetectionStream>,
    last_error: Option<ScanError>,
}

impl ScanSession {
    /// Creates an idle session. Nothing is opened until `begin_session`.
    pub fn new(
        engine: Arc<dyn DecoderEngine>,
        catalog: Arc<dyn Catalog>,
        config: SessionConfig,
    ) -> Self {
        ScanSession {
            adapter: DecoderAdapter::new(engine, config.decoder),
            surface: config.surface,
            catalog,
            audio: Arc::new(SilentCue),
            emitter: Arc::new(NoOpEmitter),
            debouncer: Debouncer::new(config.cooldown),
            history: ScanHistory::new(),
            state: SessionState::Idle,
            stream: None,
            last_error: None,
        }
    }

    /// Sets the confirmation cue played on every accepted scan.
    pub fn with_audio(mut self, audio: Arc<dyn AudioCue>) -> Self {
        self.audio = audio;
        self
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn SessionEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a camera is leased (`Active` or `Paused`).
    pub fn is_scanning(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Paused)
    }

    /// Whether the decoder currently holds the camera.
    pub fn camera_leased(&self) -> bool {
        self.adapter.is_running()
    }

    pub fn history(&self) -> &ScanHistory {
        &self.history
    }

    /// The last error surfaced to the operator, cleared by a successful start.
    pub fn last_error(&self) -> Option<&ScanError> {
        self.last_error.as_ref()
    }

    pub fn cooldown(&self) -> Duration {
        self.debouncer.cooldown()
    }

    /// Forgets the last accepted scan so the next detection is accepted at once.
    pub fn reset_cooldown(&mut self) {
        self.debouncer.reset();
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Starts scanning: `Idle` → `Active`.
    ///
    /// ## Errors
    /// - `AlreadyActive` unless `Idle`; no second camera handle is opened
    /// - `CameraUnavailable` if the engine refuses; the session stays `Idle`
    pub fn begin_session(&mut self) -> ScanResult<()> {
        if self.state != SessionState::Idle {
            debug!(state = %self.state, "begin_session while not idle");
            return Err(ScanError::AlreadyActive);
        }

        match self.adapter.start(self.surface.clone()) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.last_error = None;
                self.set_state(SessionState::Active);
                info!("Scan session started");
                Ok(())
            }
            Err(reason) => {
                let err = ScanError::CameraUnavailable { reason };
                warn!(error = %err, "Scan session could not start");
                self.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Stops scanning from any state: camera released, → `Idle`.
    ///
    /// Calling it while `Idle` does nothing.
    pub fn end_session(&mut self) {
        if self.state == SessionState::Idle {
            return;
        }

        self.release_camera();
        self.set_state(SessionState::Idle);
        info!("Scan session ended");
    }

    /// `Active` → `Paused`. The camera stays leased; detections are discarded.
    pub fn pause(&mut self) -> ScanResult<()> {
        match self.state {
            SessionState::Active => {
                self.set_state(SessionState::Paused);
                Ok(())
            }
            SessionState::Paused => Ok(()),
            _ => Err(ScanError::NotActive),
        }
    }

    /// `Paused` → `Active`.
    pub fn resume(&mut self) -> ScanResult<()> {
        match self.state {
            SessionState::Paused => {
                self.set_state(SessionState::Active);
                Ok(())
            }
            SessionState::Active => Ok(()),
            _ => Err(ScanError::NotActive),
        }
    }

    // -------------------------------------------------------------------------
    // Scanning
    // -------------------------------------------------------------------------

    /// Waits for the next detection that passes the cooldown gate.
    ///
    /// On acceptance the decoder is stopped, the session moves to `Accepted`
    /// and the confirmation cue plays. Detections arriving while `Paused` or
    /// inside the cooldown are dropped without a trace in the history.
    ///
    /// ## Cancel Safety
    /// Cancel safe: state only changes in the poll that returns.
    ///
    /// ## Errors
    /// - `NotActive` unless `Active` or `Paused`
    /// - `CameraUnavailable(Disconnected)` if the engine went away; → `Idle`
    pub async fn next_detection(&mut self) -> ScanResult<ScanEvent> {
        loop {
            if !self.is_scanning() {
                return Err(ScanError::NotActive);
            }
            let Some(stream) = self.stream.as_mut() else {
                return Err(ScanError::NotActive);
            };

            let Some(event) = stream.recv().await else {
                let err = ScanError::CameraUnavailable {
                    reason: CameraError::Disconnected,
                };
                warn!("Detection stream ended while scanning");
                self.release_camera();
                self.set_state(SessionState::Idle);
                self.record_error(err.clone());
                return Err(err);
            };

            if self.state == SessionState::Paused {
                trace!(code = %event.code, "Paused, detection discarded");
                continue;
            }

            if !self.debouncer.offer(event.timestamp) {
                trace!(code = %event.code, "Within cooldown, detection ignored");
                continue;
            }

            self.release_camera();
            self.set_state(SessionState::Accepted);
            self.audio.play_confirmation();
            info!(code = %event.code, symbology = %event.symbology, "Scan accepted");
            return Ok(event);
        }
    }

    /// Runs the lookup for an accepted detection and records the outcome.
    ///
    /// Success appends one history entry and returns to `Idle`. A failed
    /// lookup also returns to `Idle` but records nothing.
    pub async fn resolve(&mut self, event: &ScanEvent) -> ScanResult<LookupResolution> {
        if self.state != SessionState::Accepted {
            return Err(ScanError::NotActive);
        }

        match lookup::lookup(self.catalog.as_ref(), &event.code).await {
            Ok(resolution) => {
                let entry = ScanHistoryEntry {
                    code: event.code.clone(),
                    symbology: event.symbology,
                    timestamp: event.detected_at,
                    outcome: resolution.outcome(),
                };
                let entry = self.history.append(entry);
                self.emitter.emit_history(entry);
                self.set_state(SessionState::Idle);
                Ok(resolution)
            }
            Err(err) => {
                self.set_state(SessionState::Idle);
                self.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// One full scan: wait for an accepted detection, then resolve it.
    pub async fn scan_once(&mut self) -> ScanResult<LookupResolution> {
        let event = self.next_detection().await?;
        self.resolve(&event).await
    }

    /// Submits the creation form for a code that was not found.
    ///
    /// Validation errors leave the form open and are not recorded as session
    /// errors; storage failures are.
    pub async fn submit_draft(&mut self, draft: &ProductDraft) -> ScanResult<Product> {
        let result = lookup::submit_draft(self.catalog.as_ref(), draft).await;
        if let Err(err @ ScanError::CreateFailed(_)) = &result {
            self.record_error(err.clone());
        }
        result
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn release_camera(&mut self) {
        self.adapter.stop();
        self.stream = None;
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
        self.emitter.emit_state(next);
    }

    fn record_error(&mut self, err: ScanError) {
        self.emitter.emit_error(&err);
        self.last_error = Some(err);
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if self.adapter.is_running() {
            debug!("Scan session dropped while scanning, releasing camera");
        }
        self.release_camera();
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("state", &self.state)
            .field("adapter", &self.adapter)
            .field("history", &self.history.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, MemoryCatalog};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stockroom_core::{ScanOutcome, Symbology, ValidationError};
    use tokio::time::advance;

    const COOLDOWN: Duration = Duration::from_millis(2000);

    struct CountingCue(AtomicUsize);

    impl AudioCue for CountingCue {
        fn play_confirmation(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn session(engine: &Arc<FakeEngine>, catalog: &Arc<MemoryCatalog>) -> ScanSession {
        ScanSession::new(
            engine.clone(),
            catalog.clone(),
            SessionConfig::default().cooldown(COOLDOWN),
        )
    }

    /// Polls `next_detection` once; `None` if nothing is accepted right now.
    async fn try_next(session: &mut ScanSession) -> Option<ScanResult<ScanEvent>> {
        tokio::select! {
            biased;
            result = session.next_detection() => Some(result),
            _ = tokio::task::yield_now() => None,
        }
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let engine = FakeEngine::new();
        let session = session(&engine, &MemoryCatalog::new());

        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.camera_leased());
        assert!(session.history().is_empty());
        assert_eq!(engine.opened(), 0);
    }

    #[tokio::test]
    async fn test_end_session_when_idle_is_noop() {
        let engine = FakeEngine::new();
        let (emitter, mut events) = ChannelEmitter::new();
        let mut session = session(&engine, &MemoryCatalog::new()).with_emitter(Arc::new(emitter));

        session.end_session();
        session.end_session();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(engine.released(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_begin_twice_fails_without_second_handle() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        session.begin_session().unwrap();
        assert_eq!(session.state(), SessionState::Active);

        assert_eq!(session.begin_session().unwrap_err(), ScanError::AlreadyActive);
        assert_eq!(engine.opened(), 1);
        assert_eq!(engine.open_handles(), 1);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn test_camera_permission_denied_stays_idle() {
        let engine = FakeEngine::new();
        engine.deny(CameraError::PermissionDenied);
        let (emitter, mut events) = ChannelEmitter::new();
        let mut session = session(&engine, &MemoryCatalog::new()).with_emitter(Arc::new(emitter));

        let err = session.begin_session().unwrap_err();
        let expected = ScanError::CameraUnavailable {
            reason: CameraError::PermissionDenied,
        };
        assert_eq!(err, expected);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.last_error(), Some(&expected));
        assert!(session.history().is_empty());
        assert!(!session.camera_leased());

        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::Error {
                message: expected.to_string()
            }
        );
        // Never retried
        assert_eq!(engine.opened(), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_scan_records_history() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::with_product("0123456789012", "Sparkling Water", 8);
        let cue = Arc::new(CountingCue(AtomicUsize::new(0)));
        let mut session = session(&engine, &catalog).with_audio(cue.clone());

        session.begin_session().unwrap();
        engine.detect("0123456789012", Symbology::Ean13);

        let event = session.next_detection().await.unwrap();
        assert_eq!(session.state(), SessionState::Accepted);
        // Decoder stopped before the lookup runs
        assert!(!session.camera_leased());
        assert_eq!(engine.open_handles(), 0);
        assert_eq!(cue.0.load(Ordering::SeqCst), 1);

        let resolution = session.resolve(&event).await.unwrap();
        assert_eq!(resolution.product().map(|p| p.name.as_str()), Some("Sparkling Water"));
        assert!(resolution.draft().is_none());
        assert_eq!(session.state(), SessionState::Idle);

        let entry = session.history().last().unwrap();
        assert_eq!(entry.code, "0123456789012");
        assert_eq!(entry.symbology, Symbology::Ean13);
        assert_eq!(entry.outcome, ScanOutcome::Found);
        assert_eq!(entry.timestamp, event.detected_at);
        assert_eq!(catalog.lookups(), 1);
        assert_eq!(catalog.creates(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_scan_then_blank_name_rejected() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::new();
        let mut session = session(&engine, &catalog);

        session.begin_session().unwrap();
        engine.detect("9999999999999", Symbology::Ean13);

        let resolution = session.scan_once().await.unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().entries()[0].outcome, ScanOutcome::NotFound);

        let mut draft = resolution.draft().cloned().unwrap();
        assert_eq!(draft.sku, "9999999999999");

        draft.quantity = "4".to_string();
        draft.category = "Misc".to_string();
        let err = session.submit_draft(&draft).await.unwrap_err();
        assert_eq!(err, ScanError::Validation(ValidationError::required("name")));
        assert_eq!(catalog.len(), 0);
        assert_eq!(catalog.creates(), 0);
        assert!(session.last_error().is_none());

        draft.name = "Mystery Item".to_string();
        let product = session.submit_draft(&draft).await.unwrap();
        assert_eq!(product.sku, "9999999999999");
        assert_eq!(catalog.len(), 1);
        // Creating does not touch the history
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowercase_scan_does_not_match_uppercase_sku() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::with_product("ABC", "Upper Case", 3);
        let mut session = session(&engine, &catalog);

        session.begin_session().unwrap();
        engine.detect("abc", Symbology::Code128);

        let resolution = session.scan_once().await.unwrap();
        assert!(resolution.product().is_none());
        assert_eq!(resolution.draft().map(|d| d.sku.as_str()), Some("abc"));
        assert_eq!(session.history().last().unwrap().outcome, ScanOutcome::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_code39_space_round_trips_through_draft() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::new();
        let mut session = session(&engine, &catalog);

        session.begin_session().unwrap();
        engine.detect("AB 12", Symbology::Code39);

        let resolution = session.scan_once().await.unwrap();
        let mut draft = resolution.draft().cloned().unwrap();
        assert_eq!(draft.sku, "AB 12");

        draft.name = "Spacer".to_string();
        draft.quantity = "7".to_string();
        draft.category = "Hardware".to_string();
        let product = session.submit_draft(&draft).await.unwrap();
        assert_eq!(product.sku, "AB 12");

        let found = catalog.lookup("AB 12").await.unwrap().unwrap();
        assert_eq!(found.id, product.id);
        assert!(catalog.lookup("ab 12").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_same_code_accepts_one() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::new();
        let mut session = session(&engine, &catalog);

        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        advance(Duration::from_millis(500)).await;
        engine.detect("A", Symbology::Code128);

        session.scan_once().await.unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(catalog.lookups(), 1);

        // Restarting inside the cooldown still refuses the label
        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        assert!(try_next(&mut session).await.is_none());
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.history().len(), 1);
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_detections_each_accepted() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::with_product("A", "Alpha", 1);
        let mut session = session(&engine, &catalog);

        for round in 1..=3 {
            session.begin_session().unwrap();
            engine.detect("A", Symbology::Code128);
            session.scan_once().await.unwrap();
            assert_eq!(session.history().len(), round);
            advance(COOLDOWN + Duration::from_millis(1)).await;
        }

        assert_eq!(engine.opened(), 3);
        assert_eq!(engine.open_handles(), 0);
        assert!(session
            .history()
            .entries()
            .iter()
            .all(|e| e.outcome == ScanOutcome::Found));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_boundary_is_exclusive() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        session.scan_once().await.unwrap();

        advance(COOLDOWN).await;
        session.begin_session().unwrap();
        engine.detect("B", Symbology::Code128);
        assert!(try_next(&mut session).await.is_none());

        advance(Duration::from_millis(1)).await;
        engine.detect("B", Symbology::Code128);
        let event = try_next(&mut session).await.unwrap().unwrap();
        assert_eq!(event.code, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cooldown_accepts_immediately() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        session.scan_once().await.unwrap();

        session.reset_cooldown();
        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        assert!(try_next(&mut session).await.is_some());
    }

    #[tokio::test]
    async fn test_pause_discards_detections() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        assert_eq!(session.pause().unwrap_err(), ScanError::NotActive);

        session.begin_session().unwrap();
        session.pause().unwrap();
        assert_eq!(session.state(), SessionState::Paused);
        assert!(session.camera_leased());

        engine.detect("A", Symbology::Code128);
        assert!(try_next(&mut session).await.is_none());
        assert_eq!(session.state(), SessionState::Paused);

        session.resume().unwrap();
        engine.detect("B", Symbology::Code128);
        let event = try_next(&mut session).await.unwrap().unwrap();
        // "A" was consumed while paused and did not arm the cooldown
        assert_eq!(event.code, "B");
    }

    #[tokio::test]
    async fn test_end_session_releases_from_every_state() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        session.begin_session().unwrap();
        session.end_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(engine.open_handles(), 0);

        session.begin_session().unwrap();
        session.pause().unwrap();
        session.end_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(engine.open_handles(), 0);

        session.reset_cooldown();
        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);
        let event = session.next_detection().await.unwrap();
        session.end_session();
        assert_eq!(session.state(), SessionState::Idle);
        // The accepted scan was abandoned
        assert_eq!(session.resolve(&event).await.unwrap_err(), ScanError::NotActive);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_next_detection_requires_scanning() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        assert_eq!(session.next_detection().await.unwrap_err(), ScanError::NotActive);
    }

    #[tokio::test]
    async fn test_lookup_failure_returns_to_idle_without_history() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::new();
        catalog.break_storage();
        let mut session = session(&engine, &catalog);

        session.begin_session().unwrap();
        engine.detect("A", Symbology::Code128);

        let err = session.scan_once().await.unwrap_err();
        assert!(matches!(err, ScanError::LookupFailed(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.history().is_empty());
        assert_eq!(session.last_error(), Some(&err));
        assert_eq!(catalog.lookups(), 1);
    }

    #[tokio::test]
    async fn test_engine_disconnect_ends_session() {
        let engine = FakeEngine::new();
        let mut session = session(&engine, &MemoryCatalog::new());

        session.begin_session().unwrap();
        // Last sink gone: the stream has no producer left
        engine.unplug();

        let err = session.next_detection().await.unwrap_err();
        assert_eq!(
            err,
            ScanError::CameraUnavailable {
                reason: CameraError::Disconnected
            }
        );
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(engine.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_events_follow_state_machine() {
        let engine = FakeEngine::new();
        let catalog = MemoryCatalog::new();
        let (emitter, mut events) = ChannelEmitter::new();
        let mut session = session(&engine, &catalog).with_emitter(Arc::new(emitter));

        session.begin_session().unwrap();
        session.pause().unwrap();
        session.resume().unwrap();
        engine.detect("A", Symbology::Code128);
        session.scan_once().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }

        let states: Vec<SessionState> = seen
            .iter()
            .filter_map(|e| match e {
                SessionEvent::State { state } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                SessionState::Active,
                SessionState::Paused,
                SessionState::Active,
                SessionState::Accepted,
                SessionState::Idle,
            ]
        );
        assert!(seen
            .iter()
            .any(|e| matches!(e, SessionEvent::History { entry } if entry.code == "A")));
    }

    #[tokio::test]
    async fn test_drop_releases_camera() {
        let engine = FakeEngine::new();
        {
            let mut session = session(&engine, &MemoryCatalog::new());
            session.begin_session().unwrap();
            assert_eq!(engine.open_handles(), 1);
        }
        assert_eq!(engine.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_decoder_config_is_forwarded() {
        let engine = FakeEngine::new();
        let config = SessionConfig::default()
            .decoder(DecoderConfig::default().workers(2).symbologies([Symbology::Ean13]));
        let mut session = ScanSession::new(engine.clone(), MemoryCatalog::new(), config);

        session.begin_session().unwrap();
        let seen = engine.last_config().unwrap();
        assert_eq!(seen.workers, 2);
        assert_eq!(seen.symbologies, vec![Symbology::Ean13]);
    }
}
