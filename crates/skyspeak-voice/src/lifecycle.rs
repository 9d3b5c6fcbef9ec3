//! Capture lifecycle manager. Serialises every acquisition of the capture
//! device on one actor task.
//!
//! The public [`CaptureLifecycle`] is the handle the session holds. Handle
//! bookkeeping happens synchronously on the caller's side: `begin` makes the
//! previous handle stale before it returns, and `end` clears the current
//! handle immediately. The actor then catches up with the device:
//!
//! ```text
//! begin(h) ──▶ [release + settle if held] ──▶ still current? ──▶ acquire
//!                                                   │
//!                                                   └─ no ──▶ skip
//! ```
//!
//! Utterances reach the owner only through an [`UtteranceSink`] whose
//! handle is still current, so a late completion from a superseded capture
//! is dropped where it is produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skyspeak_core::{
    CaptureDevice, CaptureEvent, CaptureHandle, CaptureSlot, GamePhase, UtteranceSink,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

// ── Commands ───────────────────────────────────────────────────────

enum LifecycleCommand {
    /// Acquire the device for this handle unless superseded.
    Begin(CaptureHandle),

    /// Release the device if held.
    End,

    /// Release everything and stop the actor.
    Shutdown(oneshot::Sender<()>),
}

// ── Handle ─────────────────────────────────────────────────────────

/// Owner-side handle to the capture actor.
pub struct CaptureLifecycle {
    cmd_tx: mpsc::UnboundedSender<LifecycleCommand>,
    slot: CaptureSlot,
    generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureLifecycle {
    /// Spawn the actor. Returns the handle and the receiver for capture events.
    pub fn spawn(
        device: Arc<dyn CaptureDevice>,
        settle: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<CaptureEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let slot = CaptureSlot::new();

        let actor = LifecycleActor {
            device,
            settle,
            slot: slot.clone(),
            events: event_tx,
            held: false,
        };
        let task = tokio::spawn(actor.run(cmd_rx));

        (
            Self {
                cmd_tx,
                slot,
                generation: AtomicU64::new(0),
                task: Mutex::new(Some(task)),
            },
            event_rx,
        )
    }

    /// Request a capture. A no-op returning `None` unless `phase` is Playing.
    pub fn begin(&self, phase: GamePhase) -> Option<CaptureHandle> {
        if phase != GamePhase::Playing {
            tracing::debug!(?phase, "Ignoring capture request outside play");
            return None;
        }

        let handle = CaptureHandle(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        self.slot.set(handle);

        if self.cmd_tx.send(LifecycleCommand::Begin(handle)).is_err() {
            tracing::warn!(%handle, "Capture actor is gone");
            self.slot.clear();
            return None;
        }
        tracing::debug!(%handle, "Capture requested");
        Some(handle)
    }

    /// Stop listening. Idempotent.
    pub fn end(&self) {
        if self.slot.current().is_none() {
            return;
        }
        self.slot.clear();
        let _ = self.cmd_tx.send(LifecycleCommand::End);
    }

    /// The handle currently allowed to deliver, if any.
    pub fn current(&self) -> Option<CaptureHandle> {
        self.slot.current()
    }

    pub fn is_current(&self, handle: CaptureHandle) -> bool {
        self.slot.is_current(handle)
    }

    /// Release the device and wait for the actor to exit.
    pub async fn shutdown(&self) {
        self.slot.clear();
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(LifecycleCommand::Shutdown(reply_tx))
            .is_ok()
        {
            let _ = reply_rx.await;
        }
        let task = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Capture actor failed");
            }
        }
    }
}

impl Drop for CaptureLifecycle {
    fn drop(&mut self) {
        // Best-effort: the actor releases the device once its command
        // channel closes.
        self.slot.clear();
        let running = self
            .task
            .get_mut()
            .map(|task| task.is_some())
            .unwrap_or(false);
        if running {
            let (reply_tx, _reply_rx) = oneshot::channel();
            let _ = self.cmd_tx.send(LifecycleCommand::Shutdown(reply_tx));
        }
    }
}

// ── Actor ──────────────────────────────────────────────────────────

struct LifecycleActor {
    device: Arc<dyn CaptureDevice>,
    settle: Duration,
    slot: CaptureSlot,
    events: mpsc::UnboundedSender<CaptureEvent>,
    /// Whether the device is currently acquired.
    held: bool,
}

impl LifecycleActor {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<LifecycleCommand>) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                LifecycleCommand::Begin(handle) => self.begin(handle).await,
                LifecycleCommand::End => self.release().await,
                LifecycleCommand::Shutdown(reply) => {
                    self.release().await;
                    let _ = reply.send(());
                    tracing::debug!("Capture actor shutting down");
                    return;
                }
            }
        }

        // Owner dropped without shutdown.
        self.release().await;
    }

    async fn begin(&mut self, handle: CaptureHandle) {
        if !self.slot.is_current(handle) {
            tracing::debug!(%handle, "Skipping superseded capture start");
            return;
        }

        if self.held {
            self.release().await;
            tokio::time::sleep(self.settle).await;
            if !self.slot.is_current(handle) {
                tracing::debug!(%handle, "Capture superseded while settling");
                return;
            }
        }

        let sink = UtteranceSink::new(handle, self.slot.clone(), self.events.clone());
        match self.device.acquire(sink).await {
            Ok(()) => {
                self.held = true;
                tracing::info!(%handle, device = self.device.name(), "Listening");
                let _ = self.events.send(CaptureEvent::Started(handle));
            }
            Err(error) => {
                tracing::warn!(%handle, %error, "Capture start failed");
                let _ = self.events.send(CaptureEvent::Failed { handle, error });
            }
        }
    }

    async fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match self.device.release().await {
            Ok(()) => tracing::debug!(device = self.device.name(), "Capture released"),
            Err(error) => tracing::warn!(%error, "Capture release failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ScriptedCaptureDevice;

    fn scripted() -> Arc<ScriptedCaptureDevice> {
        Arc::new(ScriptedCaptureDevice::new(Duration::from_millis(100)))
    }

    #[tokio::test]
    async fn begin_outside_play_is_noop() {
        let device = scripted();
        let (lifecycle, _events) = CaptureLifecycle::spawn(device, Duration::ZERO);
        assert_eq!(lifecycle.begin(GamePhase::Instructions), None);
        assert_eq!(lifecycle.current(), None);
    }

    #[tokio::test]
    async fn handles_are_monotonic() {
        let device = scripted();
        let (lifecycle, _events) = CaptureLifecycle::spawn(device, Duration::ZERO);
        let first = lifecycle.begin(GamePhase::Playing).unwrap();
        let second = lifecycle.begin(GamePhase::Playing).unwrap();
        assert!(second > first);
        assert!(!lifecycle.is_current(first));
        assert!(lifecycle.is_current(second));
    }

    #[tokio::test]
    async fn end_is_idempotent() {
        let device = scripted();
        let stats = device.stats();
        let (lifecycle, _events) = CaptureLifecycle::spawn(device, Duration::ZERO);

        lifecycle.end();
        lifecycle.begin(GamePhase::Playing).unwrap();
        lifecycle.end();
        lifecycle.end();
        lifecycle.shutdown().await;

        assert_eq!(lifecycle.current(), None);
        assert_eq!(stats.active(), 0);
        assert!(stats.releases() <= stats.acquisitions());
    }
}
