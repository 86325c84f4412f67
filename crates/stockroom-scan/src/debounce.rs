//! # Detection Debouncer
//!
//! A camera decodes the same barcode many times a second while it stays in
//! frame. The debouncer lets the first detection through and refuses
//! everything else until the cooldown has passed.
//!
//! ```text
//!  t(ms)   0        500       1900      2000      2001
//!          │         │         │         │         │
//!  A ──────●─────────○─────────○─────────○─────────●──────
//!       accept     drop      drop      drop     accept
//!                                   (not > 2000)
//! ```
//!
//! The gate is content-blind: a different code inside the window is refused
//! just the same. Its only state is the last accepted instant.

use std::time::Duration;

use tokio::time::Instant;

/// Cooldown gate over detection timestamps.
#[derive(Debug, Clone)]
pub struct Debouncer {
    cooldown: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(cooldown: Duration) -> Self {
        Debouncer {
            cooldown,
            last_accepted: None,
        }
    }

    /// Offers a detection observed at `at`.
    ///
    /// Accepts iff nothing was accepted yet, or strictly more than the
    /// cooldown has elapsed since the last acceptance. Accepting records `at`.
    pub fn offer(&mut self, at: Instant) -> bool {
        match self.last_accepted {
            Some(last) if at.saturating_duration_since(last) <= self.cooldown => false,
            _ => {
                self.last_accepted = Some(at);
                true
            }
        }
    }

    /// Forgets the last acceptance; the next offer is accepted.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(Duration::from_millis(stockroom_core::DEFAULT_SCAN_COOLDOWN_MS))
    }
}
