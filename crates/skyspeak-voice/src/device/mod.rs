//! Capture device implementations.
//!
//! * [`VadCaptureDevice`] segments a [`FrameSource`] into utterances.
//! * [`ScriptedCaptureDevice`] replays queued takes after a fixed latency.
//! * `MicrophoneSource` (feature `microphone`) is the live `cpal` frame source.

#[cfg(feature = "microphone")]
mod microphone;
mod scripted;

#[cfg(feature = "microphone")]
pub use microphone::MicrophoneSource;
pub use scripted::{DeviceStats, ScriptedCaptureDevice, ScriptedTake};

use async_trait::async_trait;
use skyspeak_core::{CaptureDevice, CaptureError, UtteranceSink};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::VoiceError;
use crate::vad::{Segment, UtteranceSegmenter, VadConfig};

/// A stream of mono audio frames.
///
/// `open` starts producing frames into the returned channel; `close` stops
/// the stream. Both are called only by [`VadCaptureDevice`], which never
/// opens a source twice without closing it first.
pub trait FrameSource: Send + Sync + 'static {
    fn open(&self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>, VoiceError>;

    fn close(&self);

    fn sample_rate(&self) -> u32;
}

struct Listener {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Capture device that segments a frame stream into utterances.
pub struct VadCaptureDevice<S: FrameSource> {
    source: S,
    config: VadConfig,
    listener: Mutex<Option<Listener>>,
}

impl<S: FrameSource> VadCaptureDevice<S> {
    pub fn new(source: S, config: VadConfig) -> Self {
        Self {
            source,
            config,
            listener: Mutex::new(None),
        }
    }

    async fn listen(
        mut frames: mpsc::UnboundedReceiver<Vec<f32>>,
        mut segmenter: UtteranceSegmenter,
        sink: UtteranceSink,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                frame = frames.recv() => {
                    let Some(frame) = frame else {
                        tracing::debug!(handle = %sink.handle(), "Frame source ended");
                        break;
                    };
                    match segmenter.push(&frame) {
                        Some(Segment::Onset) => {
                            tracing::debug!(handle = %sink.handle(), "Speech started");
                        }
                        Some(Segment::Utterance(clip)) => {
                            sink.deliver(clip);
                        }
                        None => {}
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<S: FrameSource> CaptureDevice for VadCaptureDevice<S> {
    async fn acquire(&self, sink: UtteranceSink) -> Result<(), CaptureError> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            return Err(VoiceError::AlreadyActive.into());
        }

        let frames = self.source.open()?;
        let segmenter = UtteranceSegmenter::new(self.config.clone(), self.source.sample_rate());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Self::listen(frames, segmenter, sink, cancel.clone()));

        *listener = Some(Listener { cancel, task });
        Ok(())
    }

    async fn release(&self) -> Result<(), CaptureError> {
        let Some(Listener { cancel, task }) = self.listener.lock().await.take() else {
            return Ok(());
        };
        cancel.cancel();
        self.source.close();
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "VAD listener task failed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "vad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyspeak_core::{CaptureEvent, CaptureHandle, CaptureSlot};
    use std::sync::Mutex as StdMutex;

    /// Pushes a fixed frame sequence on open.
    struct FixedFrames {
        frames: Vec<Vec<f32>>,
        tx: StdMutex<Option<mpsc::UnboundedSender<Vec<f32>>>>,
    }

    impl FrameSource for FixedFrames {
        fn open(&self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>, VoiceError> {
            let (tx, rx) = mpsc::unbounded_channel();
            for frame in &self.frames {
                let _ = tx.send(frame.clone());
            }
            *self.tx.lock().unwrap() = Some(tx);
            Ok(rx)
        }

        fn close(&self) {
            self.tx.lock().unwrap().take();
        }

        fn sample_rate(&self) -> u32 {
            16_000
        }
    }

    fn utterance_frames() -> Vec<Vec<f32>> {
        let mut frames = vec![vec![0.3; 800]; 6];
        frames.extend(std::iter::repeat_n(vec![0.0; 800], 14));
        frames
    }

    #[tokio::test]
    async fn delivers_segmented_utterance() {
        let device = VadCaptureDevice::new(
            FixedFrames {
                frames: utterance_frames(),
                tx: StdMutex::new(None),
            },
            VadConfig::default(),
        );
        let slot = CaptureSlot::new();
        slot.set(CaptureHandle(1));
        let (tx, mut rx) = mpsc::unbounded_channel();

        device
            .acquire(UtteranceSink::new(CaptureHandle(1), slot, tx))
            .await
            .unwrap();

        let Some(CaptureEvent::Utterance { handle, clip }) = rx.recv().await else {
            panic!("expected an utterance");
        };
        assert_eq!(handle, CaptureHandle(1));
        assert_eq!(clip.sample_rate, 16_000);
        assert!(!clip.is_empty());

        device.release().await.unwrap();
        // Second release is a no-op
        device.release().await.unwrap();
    }

    #[tokio::test]
    async fn double_acquire_is_rejected() {
        let device = VadCaptureDevice::new(
            FixedFrames {
                frames: Vec::new(),
                tx: StdMutex::new(None),
            },
            VadConfig::default(),
        );
        let slot = CaptureSlot::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        device
            .acquire(UtteranceSink::new(CaptureHandle(1), slot.clone(), tx.clone()))
            .await
            .unwrap();
        let err = device
            .acquire(UtteranceSink::new(CaptureHandle(2), slot, tx))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Device(_)));
        device.release().await.unwrap();
    }
}
