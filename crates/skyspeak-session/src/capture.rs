//! The machine's synchronous view of the capture lifecycle.

use skyspeak_core::{CaptureHandle, GamePhase};
use skyspeak_voice::CaptureLifecycle;

/// Start/stop control over voice capture.
///
/// Both calls return immediately; the lifecycle manager performs the device
/// work in the background. `begin` must hand back a fresh handle and make
/// any previous handle stale before returning.
#[cfg_attr(test, mockall::automock)]
pub trait CaptureControl: Send + Sync {
    fn begin(&self, phase: GamePhase) -> Option<CaptureHandle>;

    /// Stop listening. Must be idempotent.
    fn end(&self);
}

impl CaptureControl for CaptureLifecycle {
    fn begin(&self, phase: GamePhase) -> Option<CaptureHandle> {
        Self::begin(self, phase)
    }

    fn end(&self) {
        Self::end(self);
    }
}
