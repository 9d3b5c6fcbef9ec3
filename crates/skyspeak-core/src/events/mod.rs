//! Canonical event union produced by the session controller.
//!
//! Events are point-in-time facts for recorders (analytics, persistence) and
//! cosmetic cues for the sound layer. The controller never reads them back.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "session_ended", "condition": "timeout", "finalScore": 4, ... }
//! ```

mod sound;

use serde::{Deserialize, Serialize};

use crate::domain::{GamePhase, TerminalCondition, Verdict};

pub use sound::SoundCue;

/// Canonical event types emitted by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ========== Lifecycle ==========
    /// The session moved between top-level phases.
    PhaseChanged { from: GamePhase, to: GamePhase },

    /// The player left the start screen.
    GameStarted,

    /// A match began.
    GameplayStarted {
        #[serde(rename = "initialAltitude")]
        initial_altitude: u32,
        #[serde(rename = "timeLimit")]
        time_limit: u32,
    },

    /// A match ended.
    SessionEnded {
        condition: TerminalCondition,
        #[serde(rename = "finalScore")]
        final_score: u32,
        #[serde(rename = "finalAltitude")]
        final_altitude: u32,
        #[serde(rename = "collisionCount")]
        collision_count: u8,
        #[serde(rename = "timeRemaining")]
        time_remaining: u32,
        #[serde(rename = "elapsedMs")]
        elapsed_ms: u64,
    },

    /// The player left the game entirely.
    Exited {
        #[serde(rename = "finalScore")]
        final_score: u32,
    },

    // ========== Rounds ==========
    /// A new word is on screen.
    WordPrompted {
        round: u64,
        word: String,
        phonetic: String,
    },

    /// The scorer answered (or failed) for a round.
    AnswerScored {
        round: u64,
        word: String,
        verdict: Verdict,
        /// `None` when the scoring request failed.
        #[serde(rename = "pronunciationScore")]
        pronunciation_score: Option<f32>,
    },

    /// A power-up reached the plane.
    CorrectAnswer {
        word: String,
        #[serde(rename = "checkpointsPassed")]
        checkpoints: u32,
        altitude: u32,
    },

    /// An obstacle hit the plane.
    WrongAnswer {
        word: String,
        #[serde(rename = "collisionCount")]
        collision_count: u8,
        altitude: u32,
    },

    // ========== Capture ==========
    /// The capture device could not be started.
    CaptureFailed { reason: String },

    // ========== Cosmetic ==========
    /// A sound cue to play.
    Sound { cue: SoundCue },
}

impl GameEvent {
    pub const fn sound(cue: SoundCue) -> Self {
        Self::Sound { cue }
    }

    /// Cosmetic events carry no facts worth persisting.
    pub const fn is_cosmetic(&self) -> bool {
        matches!(self, Self::Sound { .. })
    }

    /// Stable name, matching the serialized `type` tag.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PhaseChanged { .. } => "phase_changed",
            Self::GameStarted => "game_started",
            Self::GameplayStarted { .. } => "gameplay_started",
            Self::SessionEnded { .. } => "session_ended",
            Self::Exited { .. } => "exited",
            Self::WordPrompted { .. } => "word_prompted",
            Self::AnswerScored { .. } => "answer_scored",
            Self::CorrectAnswer { .. } => "correct_answer",
            Self::WrongAnswer { .. } => "wrong_answer",
            Self::CaptureFailed { .. } => "capture_failed",
            Self::Sound { .. } => "sound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ended_wire_format() {
        let event = GameEvent::SessionEnded {
            condition: TerminalCondition::AltitudeZero,
            final_score: 3,
            final_altitude: 0,
            collision_count: 2,
            time_remaining: 41,
            elapsed_ms: 99_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_ended");
        assert_eq!(json["condition"], "altitude_zero");
        assert_eq!(json["finalScore"], 3);
        assert_eq!(json["timeRemaining"], 41);
        assert_eq!(json["type"], event.name());
    }

    #[test]
    fn sound_cues_are_cosmetic() {
        assert!(GameEvent::sound(SoundCue::PowerUp).is_cosmetic());
        assert!(!GameEvent::GameStarted.is_cosmetic());
    }

    #[test]
    fn unit_variant_round_trips() {
        let json = serde_json::to_string(&GameEvent::GameStarted).unwrap();
        assert_eq!(json, r#"{"type":"game_started"}"#);
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GameEvent::GameStarted);
    }
}
