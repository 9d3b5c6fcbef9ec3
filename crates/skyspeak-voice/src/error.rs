//! Voice adapter error types.

use skyspeak_core::CaptureError;

/// Errors that can occur in the capture adapters.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// No audio input device found.
    #[error("No audio input device found")]
    NoInputDevice,

    /// Failed to open audio input stream.
    #[error("Failed to open audio input stream: {0}")]
    InputStreamError(String),

    /// Microphone permission denied.
    #[error("Microphone permission denied")]
    MicrophonePermissionDenied,

    /// The frame source stopped producing audio.
    #[error("Frame source closed")]
    FrameSourceClosed,

    /// The dedicated audio thread exited unexpectedly.
    #[error("Audio thread died")]
    AudioThreadDied,

    /// The device is already acquired.
    #[error("Capture device is already active")]
    AlreadyActive,
}

impl From<VoiceError> for CaptureError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::NoInputDevice => Self::Unavailable(err.to_string()),
            VoiceError::MicrophonePermissionDenied => Self::PermissionDenied,
            VoiceError::InputStreamError(_)
            | VoiceError::FrameSourceClosed
            | VoiceError::AudioThreadDied
            | VoiceError::AlreadyActive => Self::Device(err.to_string()),
        }
    }
}
