//! Domain types for the voice flight game.
//!
//! These are pure value types with no infrastructure dependencies. The
//! session machine in `skyspeak-session` is the only writer of [`Session`].

mod audio;
mod entity;
mod outcome;
mod session;
mod word;

pub use audio::AudioClip;
pub use entity::{EntityId, Projectile, ProjectileKind};
pub use outcome::{RoundStage, ScoringResult, TerminalCondition, Verdict};
pub use session::{GamePhase, Session, SessionSnapshot, VisualEffects, player_y_for};
pub use word::{Vocabulary, Word};
