//! Scripted capture device for simulations and tests.
//!
//! Each acquisition consumes one [`ScriptedTake`]. Utterances are delivered
//! after a fixed latency through the sink of the acquisition that produced
//! them. Pending deliveries are not cancelled by `release`, so a slow take
//! can land after its capture was superseded, just like a real device
//! finishing late.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use skyspeak_core::{AudioClip, CaptureDevice, CaptureError, UtteranceSink};
use tokio::sync::Mutex;

/// What one acquisition of the scripted device does.
#[derive(Debug, Clone)]
pub enum ScriptedTake {
    /// Deliver this clip after the device latency.
    Utterance(AudioClip),
    /// Acquire successfully but never deliver.
    Silence,
    /// Fail the acquisition.
    Fail(CaptureError),
}

/// Counters shared with tests and the simulator.
#[derive(Debug, Default)]
pub struct DeviceStats {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl DeviceStats {
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Acquisitions currently held.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous acquisitions ever observed.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

pub struct ScriptedCaptureDevice {
    latency: Duration,
    script: Mutex<VecDeque<ScriptedTake>>,
    fallback: Option<AudioClip>,
    stats: Arc<DeviceStats>,
}

impl ScriptedCaptureDevice {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            stats: Arc::new(DeviceStats::default()),
        }
    }

    /// Deliver `clip` whenever the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, clip: AudioClip) -> Self {
        self.fallback = Some(clip);
        self
    }

    #[must_use]
    pub fn with_script(self, takes: impl IntoIterator<Item = ScriptedTake>) -> Self {
        Self {
            script: Mutex::new(takes.into_iter().collect()),
            ..self
        }
    }

    pub async fn push(&self, take: ScriptedTake) {
        self.script.lock().await.push_back(take);
    }

    pub fn stats(&self) -> Arc<DeviceStats> {
        Arc::clone(&self.stats)
    }

    async fn next_take(&self) -> ScriptedTake {
        self.script.lock().await.pop_front().unwrap_or_else(|| {
            self.fallback
                .clone()
                .map_or(ScriptedTake::Silence, ScriptedTake::Utterance)
        })
    }
}

#[async_trait]
impl CaptureDevice for ScriptedCaptureDevice {
    async fn acquire(&self, sink: UtteranceSink) -> Result<(), CaptureError> {
        let take = self.next_take().await;
        if let ScriptedTake::Fail(err) = take {
            return Err(err);
        }

        self.stats.acquisitions.fetch_add(1, Ordering::SeqCst);
        let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_active.fetch_max(active, Ordering::SeqCst);

        if let ScriptedTake::Utterance(clip) = take {
            let latency = self.latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                sink.deliver(clip);
            });
        }
        Ok(())
    }

    async fn release(&self) -> Result<(), CaptureError> {
        let released = self
            .stats
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if released.is_ok() {
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
