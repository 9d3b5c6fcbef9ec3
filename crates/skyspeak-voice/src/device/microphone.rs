//! Live microphone frame source via `cpal`.
//!
//! `cpal::Stream` is `!Send` on some platforms, so each open stream is
//! confined to a dedicated OS thread that owns it until `close` is called.
//! Frames are down-mixed to mono and forwarded at the device sample rate.

use std::sync::Mutex;
use std::sync::mpsc as std_mpsc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use tokio::sync::mpsc;

use super::FrameSource;
use crate::error::VoiceError;

struct StreamThread {
    stop_tx: std_mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

/// The default input device.
pub struct MicrophoneSource {
    sample_rate: u32,
    channels: u16,
    active: Mutex<Option<StreamThread>>,
}

impl MicrophoneSource {
    /// Probe the default input device.
    pub fn default_input() -> Result<Self, VoiceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(VoiceError::NoInputDevice)?;
        let config = device
            .default_input_config()
            .map_err(|e| VoiceError::InputStreamError(e.to_string()))?;

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            "Microphone initialized"
        );

        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            active: Mutex::new(None),
        })
    }

    /// Body of the stream thread: build, play, park until told to stop.
    fn run(
        channels: u16,
        frames: mpsc::UnboundedSender<Vec<f32>>,
        stop_rx: &std_mpsc::Receiver<()>,
        init_tx: &std_mpsc::Sender<Result<(), VoiceError>>,
    ) {
        let stream = match build_stream(channels, frames) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };
        if let Err(e) = stream.play() {
            let _ = init_tx.send(Err(VoiceError::InputStreamError(e.to_string())));
            return;
        }
        if init_tx.send(Ok(())).is_err() {
            return;
        }

        // Either an explicit stop or the sender being dropped ends the stream.
        let _ = stop_rx.recv();
        drop(stream);
        tracing::debug!("Microphone stream closed");
    }
}

impl FrameSource for MicrophoneSource {
    fn open(&self) -> Result<mpsc::UnboundedReceiver<Vec<f32>>, VoiceError> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| VoiceError::AudioThreadDied)?;
        if active.is_some() {
            return Err(VoiceError::AlreadyActive);
        }

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (init_tx, init_rx) = std_mpsc::channel();
        let channels = self.channels;

        let thread = thread::Builder::new()
            .name("skyspeak-mic".into())
            .spawn(move || Self::run(channels, frame_tx, &stop_rx, &init_tx))
            .map_err(|e| VoiceError::InputStreamError(format!("failed to spawn mic thread: {e}")))?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        *active = Some(StreamThread { stop_tx, thread });
        Ok(frame_rx)
    }

    fn close(&self) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if let Some(StreamThread { stop_tx, thread }) = active.take() {
            let _ = stop_tx.send(());
            if thread.join().is_err() {
                tracing::warn!("Microphone thread panicked");
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream(channels: u16, frames: mpsc::UnboundedSender<Vec<f32>>) -> Result<Stream, VoiceError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(VoiceError::NoInputDevice)?;
    let config = device
        .default_input_config()
        .map_err(|e| classify_config_error(&e))?;

    let stream_config: StreamConfig = config.clone().into();
    let err_fn = |err: cpal::StreamError| {
        tracing::error!(%err, "Audio input stream error");
    };

    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = frames.send(downmix(data, channels));
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let float: Vec<f32> = data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                let _ = frames.send(downmix(&float, channels));
            },
            err_fn,
            None,
        ),
        other => {
            return Err(VoiceError::InputStreamError(format!(
                "Unsupported sample format: {other:?}"
            )));
        }
    };

    stream.map_err(|e| VoiceError::InputStreamError(e.to_string()))
}

fn classify_config_error(err: &cpal::DefaultStreamConfigError) -> VoiceError {
    match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => VoiceError::NoInputDevice,
        other => {
            let message = other.to_string();
            if message.to_lowercase().contains("permission") {
                VoiceError::MicrophonePermissionDenied
            } else {
                VoiceError::InputStreamError(message)
            }
        }
    }
}

/// Convert interleaved multi-channel audio to mono by averaging channels.
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = usize::from(channels);
    #[allow(clippy::cast_precision_loss)]
    let divisor = channels as f32;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / divisor)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let mono = downmix(&[0.25, 0.75, -1.0, 1.0], 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < f32::EPSILON);
        assert!(mono[1].abs() < f32::EPSILON);
        assert_eq!(downmix(&[0.5, 0.25], 1), vec![0.5, 0.25]);
    }
}
