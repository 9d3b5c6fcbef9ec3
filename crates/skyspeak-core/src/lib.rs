//! Core domain types and port definitions for the skyspeak voice flight game.
//!
//! This crate has no I/O of its own. It defines:
//!
//! - [`domain`] - session state, words, projectiles, scoring outcomes
//! - [`ports`] - trait seams for capture devices, the pronunciation scorer,
//!   and event emission
//! - [`events`] - the canonical [`GameEvent`] union produced by the session
//! - [`settings`] - tunable game rules and timings with validation

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AudioClip, EntityId, GamePhase, Projectile, ProjectileKind, RoundStage, ScoringResult, Session,
    SessionSnapshot, TerminalCondition, Verdict, VisualEffects, Vocabulary, Word, player_y_for,
};
pub use events::{GameEvent, SoundCue};
pub use ports::{
    CaptureDevice, CaptureError, CaptureEvent, CaptureHandle, CaptureSlot, ChannelEmitter,
    FanoutEmitter, GameEventEmitter, NoopEmitter, PronunciationScorer, ScoringError,
    UtteranceSink,
};
pub use settings::{GameSettings, SettingsError, TimingSettings, WrongAnswerPolicy, validate_settings};

