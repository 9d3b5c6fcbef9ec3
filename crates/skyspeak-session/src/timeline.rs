//! Effect timeline: the ordered set of delayed steps still to run.
//!
//! Entries are keyed by `(due, seq)` so steps scheduled for the same instant
//! run in the order they were scheduled. The controller sleeps until
//! [`Timeline::next_due`] and then drains everything due with
//! [`Timeline::pop_due`]. Every entry carries the epoch it was scheduled in;
//! the machine discards entries whose epoch is no longer current.

use std::collections::BTreeMap;
use std::time::Duration;

use skyspeak_core::{EntityId, TerminalCondition, Verdict};

/// One deferred side effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Start background music and the first capture of a match.
    Warmup,
    /// Try the capture again after a failed start.
    RetryCapture,
    /// Remove a projectile from the screen.
    Despawn(EntityId),
    /// The projectile reaches the plane and the verdict takes effect.
    Impact(Verdict),
    /// One frame of the answer animation.
    Rotate(f32),
    /// Rotation back to level; the answer animation is over.
    LevelOff,
    /// Clear power-up and collision flashes.
    ClearFlash,
    /// Stop listening before the next word.
    ReleaseCapture,
    /// Show the next word and start a new round.
    NextWord,
    /// Listen for the next word.
    RestartCapture,
    /// Settle into the final phase after a terminal condition.
    Finale(TerminalCondition),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingEffect {
    pub due: Duration,
    pub epoch: u64,
    pub round: u64,
    pub step: Step,
}

#[derive(Debug, Default)]
pub struct Timeline {
    entries: BTreeMap<(Duration, u64), PendingEffect>,
    seq: u64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Duration, epoch: u64, round: u64, step: Step) {
        self.seq += 1;
        self.entries.insert(
            (due, self.seq),
            PendingEffect {
                due,
                epoch,
                round,
                step,
            },
        );
    }

    /// Earliest due time, if anything is pending.
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<PendingEffect> {
        let entry = self.entries.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        Some(entry.remove())
    }

    /// Drop every pending entry. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEffect> {
        self.entries.values()
    }
}

// ── Answer scripts ─────────────────────────────────────────────────

/// Offsets for one answer's effects, all relative to impact.
///
/// Impact itself is `impact_ms` after the verdict, so the next round always
/// starts after the impact has landed, whatever the flight time.
#[derive(Debug, Clone, Copy)]
pub struct AnswerScript {
    /// Rotation applied at impact.
    pub impact_rotation: f32,
    /// `(ms after impact, rotation)` animation frames.
    pub frames: &'static [(u64, f32)],
    pub level_off_after_impact_ms: u64,
    pub release_after_impact_ms: u64,
    pub next_word_after_impact_ms: u64,
    pub restart_after_impact_ms: u64,
}

/// Flashes clear this long after impact.
pub const FLASH_MS: u64 = 1000;

const CLIMB: AnswerScript = AnswerScript {
    impact_rotation: -25.0,
    frames: &[(200, -15.0), (400, -5.0)],
    level_off_after_impact_ms: 600,
    release_after_impact_ms: 150,
    next_word_after_impact_ms: 1150,
    restart_after_impact_ms: 2150,
};

const NOSE_DIVE: AnswerScript = AnswerScript {
    impact_rotation: 15.0,
    frames: &[(150, 35.0), (300, 55.0), (450, 35.0), (600, 10.0)],
    level_off_after_impact_ms: 750,
    release_after_impact_ms: 350,
    next_word_after_impact_ms: 1450,
    restart_after_impact_ms: 2450,
};

impl AnswerScript {
    pub const fn for_verdict(verdict: Verdict) -> &'static Self {
        match verdict {
            Verdict::Correct => &CLIMB,
            Verdict::Incorrect => &NOSE_DIVE,
        }
    }
}
