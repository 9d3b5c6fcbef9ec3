//! Game rules and timings with validation.
//!
//! These are pure domain types with no infrastructure dependencies. Every
//! field has a default so partial configuration files deserialize cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default starting altitude.
pub const DEFAULT_INITIAL_ALTITUDE: u32 = 10_000;

/// Default number of checkpoints needed to win.
pub const DEFAULT_WIN_SCORE: u32 = 10;

/// Default match length in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 140;

/// Default number of collisions that destroys the plane.
pub const DEFAULT_MAX_COLLISIONS: u8 = 5;

/// What a wrong answer does to the checkpoint count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrongAnswerPolicy {
    /// Checkpoints survive a collision.
    #[default]
    KeepProgress,
    /// A collision resets checkpoints to zero.
    ResetScore,
}

/// Scheduler periods and timeline offsets, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Flight physics tick period.
    pub physics_tick_ms: u64,
    /// Countdown tick period.
    pub countdown_tick_ms: u64,
    /// Delay between entering Playing and the first capture.
    pub warmup_ms: u64,
    /// Pause between releasing and re-acquiring the capture device.
    pub capture_settle_ms: u64,
    /// Delay before retrying a failed capture start.
    pub capture_retry_ms: u64,
    /// Outcome-to-impact delay.
    pub impact_ms: u64,
    /// Outcome-to-despawn delay for the projectile.
    pub despawn_ms: u64,
    /// Finale delay after a win.
    pub win_finale_ms: u64,
    /// Finale delay after the plane is destroyed.
    pub destroyed_finale_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            physics_tick_ms: 150,
            countdown_tick_ms: 1000,
            warmup_ms: 1000,
            capture_settle_ms: 500,
            capture_retry_ms: 1500,
            impact_ms: 1050,
            despawn_ms: 800,
            win_finale_ms: 1500,
            destroyed_finale_ms: 2000,
        }
    }
}

impl TimingSettings {
    #[must_use]
    pub const fn physics_tick(&self) -> Duration {
        Duration::from_millis(self.physics_tick_ms)
    }

    #[must_use]
    pub const fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    #[must_use]
    pub const fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }
}

/// Tunable game rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub initial_altitude: u32,
    /// Altitude added by a correct answer.
    pub altitude_gain: u32,
    /// Altitude removed by a wrong answer.
    pub altitude_loss: u32,
    /// Altitude lost per physics tick.
    pub gravity_force: u32,
    /// Altitude at or below which the warning cue fires.
    pub low_altitude_threshold: u32,
    /// Checkpoints needed to win.
    pub win_score: u32,
    pub time_limit_secs: u32,
    /// Collisions that destroy the plane.
    pub max_collisions: u8,
    /// Minimum pronunciation score (0-100) for a correct answer.
    pub pass_mark: f32,
    pub wrong_answer_policy: WrongAnswerPolicy,
    pub timing: TimingSettings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            initial_altitude: DEFAULT_INITIAL_ALTITUDE,
            altitude_gain: 1400,
            altitude_loss: 1400,
            gravity_force: 15,
            low_altitude_threshold: 1000,
            win_score: DEFAULT_WIN_SCORE,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            max_collisions: DEFAULT_MAX_COLLISIONS,
            pass_mark: 50.0,
            wrong_answer_policy: WrongAnswerPolicy::default(),
            timing: TimingSettings::default(),
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SettingsError {
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("Pass mark must be between 0 and 100, got {0}")]
    InvalidPassMark(f32),

    #[error("Low-altitude threshold {threshold} exceeds initial altitude {initial}")]
    ThresholdAboveInitial { threshold: u32, initial: u32 },

    #[error("Projectile despawn ({despawn_ms} ms) must not come after impact ({impact_ms} ms)")]
    DespawnAfterImpact { despawn_ms: u64, impact_ms: u64 },
}

/// Validate settings values.
pub fn validate_settings(settings: &GameSettings) -> Result<(), SettingsError> {
    let timing = &settings.timing;

    // Periods drive tokio intervals, which panic on zero
    if timing.physics_tick_ms == 0 {
        return Err(SettingsError::ZeroValue("timing.physics_tick_ms"));
    }
    if timing.countdown_tick_ms == 0 {
        return Err(SettingsError::ZeroValue("timing.countdown_tick_ms"));
    }

    if settings.initial_altitude == 0 {
        return Err(SettingsError::ZeroValue("initial_altitude"));
    }
    if settings.win_score == 0 {
        return Err(SettingsError::ZeroValue("win_score"));
    }
    if settings.time_limit_secs == 0 {
        return Err(SettingsError::ZeroValue("time_limit_secs"));
    }
    if settings.max_collisions == 0 {
        return Err(SettingsError::ZeroValue("max_collisions"));
    }

    if !(0.0..=100.0).contains(&settings.pass_mark) {
        return Err(SettingsError::InvalidPassMark(settings.pass_mark));
    }

    if settings.low_altitude_threshold > settings.initial_altitude {
        return Err(SettingsError::ThresholdAboveInitial {
            threshold: settings.low_altitude_threshold,
            initial: settings.initial_altitude,
        });
    }

    if timing.despawn_ms > timing.impact_ms {
        return Err(SettingsError::DespawnAfterImpact {
            despawn_ms: timing.despawn_ms,
            impact_ms: timing.impact_ms,
        });
    }

    Ok(())
}
