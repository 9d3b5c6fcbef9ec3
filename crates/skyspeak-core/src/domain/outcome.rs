//! Scoring results, round verdicts and terminal conditions.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::GamePhase;

/// Result returned by the pronunciation scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    /// Overall pronunciation score in `[0, 1]`.
    pub total_score: f32,
}

impl ScoringResult {
    pub const fn new(total_score: f32) -> Self {
        Self { total_score }
    }

    /// Whether the score reaches `pass_mark` on a 0–100 scale.
    pub fn passes(&self, pass_mark: f32) -> bool {
        self.total_score * 100.0 >= pass_mark
    }
}

/// Classification of one answered round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    /// Classify a scoring attempt. Any failure counts as incorrect.
    pub fn classify<E>(result: &Result<ScoringResult, E>, pass_mark: f32) -> Self {
        match result {
            Ok(score) if score.passes(pass_mark) => Self::Correct,
            _ => Self::Incorrect,
        }
    }
}

/// Progress of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "verdict")]
pub enum RoundStage {
    /// Waiting for an utterance from the current capture.
    AwaitingAnswer,
    /// An utterance was accepted and is being scored.
    Evaluating,
    /// The verdict is known; effects are playing out.
    Resolved(Verdict),
}

/// An event that ends the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalCondition {
    Timeout,
    AltitudeZero,
    Destroyed,
    Win,
}

impl TerminalCondition {
    /// Phase the session settles in once this condition has played out.
    pub const fn final_phase(self) -> GamePhase {
        match self {
            Self::Win => GamePhase::Win,
            Self::Timeout | Self::AltitudeZero | Self::Destroyed => GamePhase::GameOver,
        }
    }

    /// Stable name used in logs and recorded facts.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::AltitudeZero => "altitude-zero",
            Self::Destroyed => "destroyed",
            Self::Win => "win",
        }
    }
}

impl fmt::Display for TerminalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
