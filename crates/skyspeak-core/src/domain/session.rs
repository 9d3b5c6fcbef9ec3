//! Session state and the snapshot handed to renderers.

use serde::{Deserialize, Serialize};

use super::entity::Projectile;
use super::outcome::{RoundStage, TerminalCondition};
use super::word::Word;

/// Top-level screen/state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Start,
    Instructions,
    Playing,
    GameOver,
    Win,
}

impl GamePhase {
    /// GameOver and Win end a match.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Win)
    }
}

/// Progression state of one player's game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub phase: GamePhase,
    pub altitude: u32,
    pub time_remaining: u32,
    pub checkpoints: u32,
    pub collision_count: u8,
    pub current_word: Word,
}

impl Session {
    /// A session parked on the start screen.
    pub fn new(initial_altitude: u32, time_limit_secs: u32, word: Word) -> Self {
        Self {
            phase: GamePhase::Start,
            altitude: initial_altitude,
            time_remaining: time_limit_secs,
            checkpoints: 0,
            collision_count: 0,
            current_word: word,
        }
    }
}

/// Visual effect flags for the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEffects {
    /// A discrete answer animation owns the rotation.
    pub animating: bool,
    pub power_up_flash: bool,
    pub collision_flash: bool,
    pub explosion: bool,
    pub low_altitude: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session: Session,
    pub round: u64,
    pub round_stage: RoundStage,
    /// Vertical plane position, percent from the top.
    pub player_y: f32,
    /// Plane pitch in degrees; positive is nose down.
    pub rotation: f32,
    pub projectiles: Vec<Projectile>,
    pub effects: VisualEffects,
    /// A capture handle is outstanding for this round.
    pub listening: bool,
    pub terminal: Option<TerminalCondition>,
}

/// Map altitude to the plane's vertical screen position.
///
/// Full altitude sits at 10 % from the top, zero altitude at 90 %.
pub fn player_y_for(altitude: u32, initial_altitude: u32) -> f32 {
    if initial_altitude == 0 {
        return 90.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = altitude as f32 / initial_altitude as f32;
    80.0f32.mul_add(-ratio, 90.0).clamp(10.0, 90.0)
}
