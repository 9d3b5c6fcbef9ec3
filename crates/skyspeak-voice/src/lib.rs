//! Voice adapters for skyspeak.
//!
//! - [`lifecycle`] - the capture lifecycle manager (one acquisition at a time)
//! - [`device`] - capture devices: VAD over a frame source, scripted takes,
//!   and the `cpal` microphone (feature `microphone`)
//! - [`vad`] - energy-gated utterance segmentation
//! - [`scoring`] - HTTP pronunciation scoring gateway and a scripted scorer
//! - [`wav`] - PCM16 WAV encoding for uploads

#![deny(unused_crate_dependencies)]

pub mod device;
pub mod error;
pub mod lifecycle;
pub mod scoring;
pub mod vad;
pub mod wav;

// Re-export key types for convenience
pub use device::{DeviceStats, FrameSource, ScriptedCaptureDevice, ScriptedTake, VadCaptureDevice};
#[cfg(feature = "microphone")]
pub use device::MicrophoneSource;
pub use error::VoiceError;
pub use lifecycle::CaptureLifecycle;
pub use scoring::{DEFAULT_SCORING_ENDPOINT, HttpScoringGateway, ScoringConfig, ScriptedScorer};
pub use vad::{Segment, UtteranceSegmenter, VadConfig};

// Used only by integration tests
#[cfg(test)]
use wiremock as _;
