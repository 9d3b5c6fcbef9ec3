//! Outcome resolution: verdict, projectile, answer timeline and impact.

use std::time::Duration;

use rand::Rng;
use skyspeak_core::{
    EntityId, GameEvent, Projectile, ProjectileKind, RoundStage, ScoringError, ScoringResult,
    SoundCue, TerminalCondition, Verdict, WrongAnswerPolicy, player_y_for,
};
use tracing::{info, warn};

use super::SessionMachine;
use crate::timeline::{AnswerScript, FLASH_MS, Step};

impl SessionMachine {
    /// Classify a scoring outcome and queue the answer's effects.
    pub(super) fn resolve(&mut self, result: Result<ScoringResult, ScoringError>, now: Duration) {
        let verdict = Verdict::classify(&result, self.settings.pass_mark);
        if let Err(error) = &result {
            warn!(%error, round = self.round, "Scoring failed; counting as incorrect");
        }
        info!(round = self.round, ?verdict, "Answer scored");

        self.stage = RoundStage::Resolved(verdict);
        self.emit(GameEvent::AnswerScored {
            round: self.round,
            word: self.session.current_word.text.clone(),
            verdict,
            pronunciation_score: result.ok().map(|r| r.total_score),
        });

        let kind = match verdict {
            Verdict::Correct => ProjectileKind::PowerUp,
            Verdict::Incorrect => ProjectileKind::Obstacle,
        };
        let id = self.spawn_projectile(kind);

        let timing = &self.settings.timing;
        let (despawn_ms, impact_ms) = (timing.despawn_ms, timing.impact_ms);
        let script = AnswerScript::for_verdict(verdict);

        self.schedule(now, despawn_ms, Step::Despawn(id));
        self.schedule(now, impact_ms, Step::Impact(verdict));
        for &(after, rotation) in script.frames {
            self.schedule(now, impact_ms + after, Step::Rotate(rotation));
        }
        self.schedule(now, impact_ms + script.level_off_after_impact_ms, Step::LevelOff);
        self.schedule(now, impact_ms + FLASH_MS, Step::ClearFlash);
        self.schedule(now, impact_ms + script.release_after_impact_ms, Step::ReleaseCapture);
        self.schedule(now, impact_ms + script.next_word_after_impact_ms, Step::NextWord);
        self.schedule(now, impact_ms + script.restart_after_impact_ms, Step::RestartCapture);
    }

    fn spawn_projectile(&mut self, kind: ProjectileKind) -> EntityId {
        self.next_entity += 1;
        let id = EntityId(self.next_entity);
        let span = kind.jitter_span();
        let offset = self.rng.gen_range(-span..=span);
        let player_y = player_y_for(self.session.altitude, self.settings.initial_altitude);
        self.projectiles
            .push(Projectile::aimed_at(id, kind, player_y, offset));
        id
    }

    /// The projectile reaches the plane.
    pub(super) fn impact(&mut self, verdict: Verdict, now: Duration) {
        let script = AnswerScript::for_verdict(verdict);
        match verdict {
            Verdict::Correct => {
                self.effects.animating = true;
                self.effects.power_up_flash = true;
                self.rotation = script.impact_rotation;
                self.emit(GameEvent::sound(SoundCue::PowerUp));

                self.session.altitude = self
                    .session
                    .altitude
                    .saturating_add(self.settings.altitude_gain);
                self.session.checkpoints += 1;
                self.refresh_low_altitude();
                self.emit(GameEvent::CorrectAnswer {
                    word: self.session.current_word.text.clone(),
                    checkpoints: self.session.checkpoints,
                    altitude: self.session.altitude,
                });

                if self.session.checkpoints >= self.settings.win_score {
                    self.latch(TerminalCondition::Win, now);
                }
            }
            Verdict::Incorrect => {
                let max = self.settings.max_collisions;
                self.session.collision_count = self.session.collision_count.saturating_add(1).min(max);
                self.effects.collision_flash = true;

                if self.session.collision_count >= max {
                    self.emit_wrong_answer();
                    self.latch(TerminalCondition::Destroyed, now);
                    return;
                }

                self.emit(GameEvent::sound(SoundCue::Collision));
                self.session.altitude = self
                    .session
                    .altitude
                    .saturating_sub(self.settings.altitude_loss);
                if self.settings.wrong_answer_policy == WrongAnswerPolicy::ResetScore {
                    self.session.checkpoints = 0;
                }
                self.effects.animating = true;
                self.rotation = script.impact_rotation;
                self.refresh_low_altitude();
                self.emit_wrong_answer();

                if self.session.altitude == 0 {
                    self.latch(TerminalCondition::AltitudeZero, now);
                }
            }
        }
    }

    fn emit_wrong_answer(&self) {
        self.emit(GameEvent::WrongAnswer {
            word: self.session.current_word.text.clone(),
            collision_count: self.session.collision_count,
            altitude: self.session.altitude,
        });
    }
}
