//! # Keyboard-Wedge Engine
//!
//! Handheld USB scanners usually present themselves as a keyboard: they
//! "type" the decoded code followed by Enter. This engine turns those lines
//! into detections.
//!
//! ```text
//! ┌──────────────┐  "0123456789012⏎"  ┌─────────────┐   RawDetection   ┌──────────────┐
//! │  USB scanner │ ─────────────────► │ WedgeInput  │ ───────────────► │ DetectionSink│
//! │  (keyboard)  │                    │ push_line() │  symbology from  │ (if leased)  │
//! └──────────────┘                    └─────────────┘  infer()         └──────────────┘
//! ```
//!
//! The wire carries no symbology, so it is inferred from the text
//! (check digits, alphabet, framing). Lines typed while no session holds the
//! engine are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stockroom_core::symbology;
use tracing::{debug, trace};

use crate::decoder::{CameraHandle, DecoderEngine, DetectionSink, OpenRequest, RawDetection};
use crate::error::CameraError;

#[derive(Debug)]
struct WedgeState {
    connected: bool,
    sink: Option<DetectionSink>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<WedgeState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WedgeState> {
        // A panic while holding the lock cannot leave the state half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decoder engine for keyboard-wedge scanners.
#[derive(Debug, Clone)]
pub struct WedgeEngine {
    shared: Arc<Shared>,
}

/// Feeds scanner lines into a [`WedgeEngine`].
#[derive(Debug, Clone)]
pub struct WedgeInput {
    shared: Arc<Shared>,
}

impl WedgeEngine {
    /// Creates a connected engine and the input handle that feeds it.
    pub fn new() -> (Self, WedgeInput) {
        let shared = Arc::new(Shared {
            state: Mutex::new(WedgeState {
                connected: true,
                sink: None,
            }),
        });
        (
            WedgeEngine {
                shared: Arc::clone(&shared),
            },
            WedgeInput { shared },
        )
    }
}

impl DecoderEngine for WedgeEngine {
    fn open(&self, request: OpenRequest) -> Result<Box<dyn CameraHandle>, CameraError> {
        let mut state = self.shared.lock();

        if !state.connected {
            return Err(CameraError::NoDevice);
        }
        if state.sink.as_ref().is_some_and(DetectionSink::is_open) {
            return Err(CameraError::Busy);
        }

        debug!(surface = request.surface.id(), "Wedge scanner claimed");
        state.sink = Some(request.sink);

        Ok(Box::new(WedgeHandle {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn name(&self) -> &str {
        "keyboard-wedge"
    }
}

struct WedgeHandle {
    shared: Arc<Shared>,
}

impl CameraHandle for WedgeHandle {
    fn release(&mut self) {
        self.shared.lock().sink = None;
        debug!("Wedge scanner released");
    }
}

impl WedgeInput {
    /// Delivers one scanned line.
    ///
    /// Returns `true` if a running session received it.
    pub fn push_line(&self, line: &str) -> bool {
        let code = line.trim();
        if code.is_empty() {
            return false;
        }

        let sink = self.shared.lock().sink.clone();
        match sink {
            Some(sink) => sink.push(RawDetection::new(code, symbology::infer(code))),
            None => {
                trace!(code = %code, "No scan running, wedge input dropped");
                false
            }
        }
    }

    /// Whether a session currently holds the engine.
    pub fn is_claimed(&self) -> bool {
        self.shared
            .lock()
            .sink
            .as_ref()
            .is_some_and(DetectionSink::is_open)
    }

    /// Marks the scanner as unplugged. Running sessions see the stream end.
    pub fn disconnect(&self) {
        let mut state = self.shared.lock();
        state.connected = false;
        state.sink = None;
    }

    /// Marks the scanner as plugged in again.
    pub fn reconnect(&self) {
        self.shared.lock().connected = true;
    }
}
