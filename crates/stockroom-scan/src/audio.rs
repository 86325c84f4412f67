//! # Confirmation Cue
//!
//! The short sound an operator hears when a scan is accepted.
//! Playing is fire-and-forget: a cue that cannot play never fails a scan.

use std::io::Write;

use tracing::debug;

/// Plays the "scan accepted" confirmation.
pub trait AudioCue: Send + Sync {
    fn play_confirmation(&self);
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play_confirmation(&self) {}
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl AudioCue for TerminalBell {
    fn play_confirmation(&self) {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|()| stderr.flush()) {
            debug!(error = %e, "Terminal bell failed");
        }
    }
}
