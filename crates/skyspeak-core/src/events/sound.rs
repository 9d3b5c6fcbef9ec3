use serde::{Deserialize, Serialize};

/// Sound cues requested by the session. Synthesis is up to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    BackgroundStart,
    BackgroundStop,
    PowerUp,
    Collision,
    Explosion,
    Win,
    GameOver,
    AltitudeWarning,
}
