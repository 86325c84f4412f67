//! # stockroom-scan: Barcode Scan-to-Action Workflow
//!
//! Everything between "the camera saw a barcode" and "the catalog answered".
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan-to-Action Pipeline                           │
//! │                                                                         │
//! │  DecoderEngine (camera library / keyboard wedge)                       │
//! │       │  RawDetection { code, symbology }  (from any thread)           │
//! │       ▼                                                                 │
//! │  DetectionSink ──► DetectionStream        [decoder]                    │
//! │       │  ScanEvent { code, symbology, timestamp }                      │
//! │       ▼                                                                 │
//! │  Debouncer: accept iff now - last_accepted > cooldown   [debounce]     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ScanSession: stop camera, beep, state = Accepted       [session]      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lookup(code) ── exactly one catalog read ──► Found(product)  [lookup] │
//! │       │                                   └─► NotFound(draft)          │
//! │       ▼                                                                 │
//! │  ScanHistory.append(entry), state = Idle                [history]      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`decoder`] - Engine seam, camera lease, detection subscription
//! - [`wedge`] - Keyboard-wedge scanner engine
//! - [`debounce`] - Cooldown gate
//! - [`session`] - Scan session state machine
//! - [`lookup`] - Lookup-or-create workflow
//! - [`catalog`] - Catalog trait and its SQLite implementation
//! - [`history`] - Append-only scan history
//! - [`audio`] - Confirmation cue
//! - [`error`] - Scan error types

pub mod audio;
pub mod catalog;
pub mod debounce;
pub mod decoder;
pub mod error;
pub mod history;
pub mod lookup;
pub mod session;
pub mod wedge;

#[cfg(test)]
pub(crate) mod testing;

pub use audio::{AudioCue, SilentCue, TerminalBell};
pub use catalog::{Catalog, CatalogError};
pub use debounce::Debouncer;
pub use decoder::{
    CameraHandle, DecoderAdapter, DecoderConfig, DecoderEngine, DetectionSink, DetectionStream,
    FacingMode, OpenRequest, PreviewSurface, RawDetection, ScanEvent,
};
pub use error::{CameraError, ScanError, ScanResult};
pub use history::ScanHistory;
pub use lookup::LookupResolution;
pub use session::{
    ChannelEmitter, NoOpEmitter, ScanSession, SessionConfig, SessionEmitter, SessionEvent,
};
pub use wedge::{WedgeEngine, WedgeInput};
