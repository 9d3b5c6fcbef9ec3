//! Transient projectiles flying toward the plane.
//!
//! Obstacles and power-ups share one shape, so they are a single tagged type
//! and consumers match on [`ProjectileKind`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Horizontal spawn position (percent of screen width).
pub const SPAWN_X: f32 = 100.0;

/// Projectiles never aim outside this vertical band (percent).
pub const TARGET_Y_MIN: f32 = 15.0;
pub const TARGET_Y_MAX: f32 = 85.0;

/// Unique id of a projectile within one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Spawned on a wrong answer; collides with the plane.
    Obstacle,
    /// Spawned on a correct answer; collected by the plane.
    PowerUp,
}

impl ProjectileKind {
    /// Maximum vertical aim variation around the player (± percent).
    pub const fn jitter_span(self) -> f32 {
        match self {
            Self::Obstacle => 5.0,
            Self::PowerUp => 4.0,
        }
    }
}

/// A projectile on screen. Coordinates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: EntityId,
    pub kind: ProjectileKind,
    pub x: f32,
    pub y: f32,
    pub target_y: f32,
}

impl Projectile {
    /// Spawn at the right edge aimed at `player_y + offset`.
    ///
    /// `offset` is clamped to the kind's jitter span, and the resulting target
    /// to the on-screen band.
    pub fn aimed_at(id: EntityId, kind: ProjectileKind, player_y: f32, offset: f32) -> Self {
        let span = kind.jitter_span();
        let target_y = (player_y + offset.clamp(-span, span)).clamp(TARGET_Y_MIN, TARGET_Y_MAX);
        Self {
            id,
            kind,
            x: SPAWN_X,
            y: target_y,
            target_y,
        }
    }
}
