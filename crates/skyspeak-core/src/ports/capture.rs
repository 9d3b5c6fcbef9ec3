//! Voice capture port.
//!
//! A [`CaptureDevice`] wraps the platform microphone plus voice-activity
//! detection. It is only ever driven by the capture lifecycle manager, which
//! guarantees at most one acquisition at a time. Devices deliver completed
//! utterances through an [`UtteranceSink`] bound to the handle that started
//! them.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::AudioClip;

/// Generation number of one capture attempt.
///
/// Handles are issued in increasing order; `0` is never issued and marks
/// "no current capture" in [`CaptureSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureHandle(pub u64);

impl fmt::Display for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture#{}", self.0)
    }
}

/// Errors raised while acquiring or releasing the capture resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture resource unavailable: {0}")]
    Unavailable(String),

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Capture device failure: {0}")]
    Device(String),

    #[error("Capture manager is no longer running")]
    Stopped,
}

/// Events flowing from the lifecycle manager to its owner.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The device was acquired for `handle`.
    Started(CaptureHandle),
    /// A complete utterance was captured under a still-current handle.
    Utterance {
        handle: CaptureHandle,
        clip: AudioClip,
    },
    /// Acquisition for `handle` failed.
    Failed {
        handle: CaptureHandle,
        error: CaptureError,
    },
}

/// Shared record of which handle is current.
#[derive(Debug, Clone, Default)]
pub struct CaptureSlot(Arc<AtomicU64>);

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, handle: CaptureHandle) {
        self.0.store(handle.0, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn current(&self) -> Option<CaptureHandle> {
        match self.0.load(Ordering::SeqCst) {
            0 => None,
            n => Some(CaptureHandle(n)),
        }
    }

    pub fn is_current(&self, handle: CaptureHandle) -> bool {
        self.0.load(Ordering::SeqCst) == handle.0
    }
}

/// Delivery channel handed to a device on acquisition.
///
/// Results are forwarded only while the sink's handle is current, so a device
/// that finishes late cannot leak a stale utterance.
#[derive(Debug, Clone)]
pub struct UtteranceSink {
    handle: CaptureHandle,
    slot: CaptureSlot,
    events: mpsc::UnboundedSender<CaptureEvent>,
}

impl UtteranceSink {
    pub const fn new(
        handle: CaptureHandle,
        slot: CaptureSlot,
        events: mpsc::UnboundedSender<CaptureEvent>,
    ) -> Self {
        Self {
            handle,
            slot,
            events,
        }
    }

    pub const fn handle(&self) -> CaptureHandle {
        self.handle
    }

    pub fn is_current(&self) -> bool {
        self.slot.is_current(self.handle)
    }

    /// Forward a completed utterance. Returns `false` if it was dropped.
    pub fn deliver(&self, clip: AudioClip) -> bool {
        if !self.is_current() {
            tracing::debug!(handle = %self.handle, "Dropping utterance from stale capture");
            return false;
        }
        self.events
            .send(CaptureEvent::Utterance {
                handle: self.handle,
                clip,
            })
            .is_ok()
    }
}

/// A platform capture resource with voice-activity detection.
///
/// `acquire` opens the resource and starts listening; each completed
/// utterance is passed to `sink`. `release` closes the resource and must be
/// safe to call when nothing is open.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self, sink: UtteranceSink) -> Result<(), CaptureError>;

    async fn release(&self) -> Result<(), CaptureError>;

    /// Human-readable device name for logs.
    fn name(&self) -> &str {
        "capture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_has_no_current_handle() {
        let slot = CaptureSlot::new();
        assert_eq!(slot.current(), None);
        slot.set(CaptureHandle(3));
        assert_eq!(slot.current(), Some(CaptureHandle(3)));
        slot.clear();
        assert!(!slot.is_current(CaptureHandle(3)));
    }

    #[test]
    fn sink_drops_after_handle_superseded() {
        let slot = CaptureSlot::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = UtteranceSink::new(CaptureHandle(1), slot.clone(), tx);

        slot.set(CaptureHandle(1));
        assert!(sink.deliver(AudioClip::new(vec![0.1; 4], 16_000)));

        slot.set(CaptureHandle(2));
        assert!(!sink.deliver(AudioClip::new(vec![0.2; 4], 16_000)));

        let first = rx.try_recv().unwrap();
        assert!(matches!(first, CaptureEvent::Utterance { handle, .. } if handle == CaptureHandle(1)));
        assert!(rx.try_recv().is_err());
    }
}
