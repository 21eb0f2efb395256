//! Fire-once close state machine.

use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Tracks a component's close lifecycle: `Open` → `Closing` → `Closed`.
///
/// The `Open` → `Closing` transition is a compare-and-set, so exactly one
/// caller wins it no matter how many threads race on `close()`. All other
/// transitions are no-ops, which makes close idempotent by construction.
#[derive(Debug)]
pub struct CloseState {
    state: AtomicU8,
}

impl CloseState {
    /// A new, open state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(OPEN),
        }
    }

    /// Attempt the `Open` → `Closing` transition.
    ///
    /// Returns `true` for exactly one caller; every other (or repeated)
    /// call returns `false`.
    pub fn begin_close(&self) -> bool {
        self.state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark teardown complete (`Closing` → `Closed`). No-op otherwise.
    pub fn finish_close(&self) {
        let _ = self.state.compare_exchange(
            CLOSING,
            CLOSED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Whether `begin_close` has been won by someone.
    pub fn is_closing(&self) -> bool {
        self.state.load(Ordering::Acquire) != OPEN
    }

    /// Whether teardown has completed.
    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }
}

impl Default for CloseState {
    fn default() -> Self {
        Self::new()
    }
}
