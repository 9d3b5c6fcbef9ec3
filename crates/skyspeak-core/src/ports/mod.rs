//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the session expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No HTTP or audio-driver types in any signature
//! - Capture results always carry the handle that produced them
//! - Emission is fire-and-forget

pub mod capture;
pub mod event_emitter;
pub mod scoring;

pub use capture::{
    CaptureDevice, CaptureError, CaptureEvent, CaptureHandle, CaptureSlot, UtteranceSink,
};
pub use event_emitter::{ChannelEmitter, FanoutEmitter, GameEventEmitter, NoopEmitter};
pub use scoring::{PronunciationScorer, ScoringError};
