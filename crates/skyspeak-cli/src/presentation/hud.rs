//! One-line HUD and event narration.

use skyspeak_core::{GameEvent, GamePhase, SessionSnapshot, SoundCue, Verdict};

/// `mm:ss` for a number of seconds.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Status line for the current snapshot.
pub fn render_hud(snapshot: &SessionSnapshot) -> String {
    let session = &snapshot.session;
    match session.phase {
        GamePhase::Start => "Press enter to start".to_string(),
        GamePhase::Instructions => "Say each word clearly to climb. Press enter to fly.".to_string(),
        GamePhase::Playing => {
            let mic = if snapshot.listening { "listening" } else { "..." };
            let mut flags = String::new();
            if snapshot.effects.low_altitude {
                flags.push_str(" LOW");
            }
            if snapshot.effects.explosion {
                flags.push_str(" BOOM");
            }
            format!(
                "{} | alt {:>5} | checkpoints {:>2} | hits {} | word \"{}\" [{}] | {}{}",
                format_clock(session.time_remaining),
                session.altitude,
                session.checkpoints,
                session.collision_count,
                session.current_word.text,
                session.current_word.phonetic,
                mic,
                flags,
            )
        }
        GamePhase::GameOver | GamePhase::Win => {
            let title = if session.phase == GamePhase::Win {
                "YOU WIN"
            } else {
                "GAME OVER"
            };
            let reason = snapshot
                .terminal
                .map(|c| format!(" ({c})"))
                .unwrap_or_default();
            format!(
                "{title}{reason} | checkpoints {} | altitude {} | time left {}",
                session.checkpoints,
                session.altitude,
                format_clock(session.time_remaining),
            )
        }
    }
}

/// Console line for an event, if it is worth narrating.
pub fn describe_event(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::GameplayStarted {
            initial_altitude,
            time_limit,
        } => format!(
            "Take-off: altitude {initial_altitude}, {} on the clock",
            format_clock(*time_limit)
        ),
        GameEvent::WordPrompted {
            round,
            word,
            phonetic,
        } => format!("Round {round}: say \"{word}\" ({phonetic})"),
        GameEvent::AnswerScored {
            verdict,
            pronunciation_score,
            ..
        } => {
            let score = pronunciation_score
                .map_or_else(|| "no score".to_string(), |s| format!("{:.0}%", s * 100.0));
            match verdict {
                Verdict::Correct => format!("  ✓ {score}"),
                Verdict::Incorrect => format!("  ✗ {score}"),
            }
        }
        GameEvent::CorrectAnswer {
            checkpoints,
            altitude,
            ..
        } => format!("  Power-up! checkpoints {checkpoints}, altitude {altitude}"),
        GameEvent::WrongAnswer {
            collision_count,
            altitude,
            ..
        } => format!("  Collision {collision_count}, altitude {altitude}"),
        GameEvent::CaptureFailed { reason } => format!("  Microphone unavailable: {reason}"),
        GameEvent::SessionEnded {
            condition,
            final_score,
            final_altitude,
            ..
        } => format!("Match over ({condition}): {final_score} checkpoints, altitude {final_altitude}"),
        GameEvent::Sound {
            cue: SoundCue::AltitudeWarning,
        } => "  Low altitude!".to_string(),
        GameEvent::Exited { final_score } => format!("Goodbye. Final score {final_score}"),
        GameEvent::PhaseChanged { .. }
        | GameEvent::GameStarted
        | GameEvent::Sound { .. } => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use skyspeak_core::{Session, TerminalCondition, VisualEffects, Word};

    use super::*;

    fn snapshot(phase: GamePhase) -> SessionSnapshot {
        let mut session = Session::new(10_000, 140, Word::new("Runway", "RUN-way"));
        session.phase = phase;
        SessionSnapshot {
            session,
            round: 1,
            round_stage: skyspeak_core::RoundStage::AwaitingAnswer,
            player_y: 10.0,
            rotation: 0.0,
            projectiles: Vec::new(),
            effects: VisualEffects::default(),
            listening: true,
            terminal: None,
        }
    }

    #[test]
    fn clock_is_minutes_and_seconds() {
        assert_eq!(format_clock(140), "02:20");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn playing_hud_shows_word_and_clock() {
        let hud = render_hud(&snapshot(GamePhase::Playing));
        assert!(hud.starts_with("02:20"));
        assert!(hud.contains("\"Runway\" [RUN-way]"));
        assert!(hud.contains("listening"));
    }

    #[test]
    fn finished_hud_names_the_condition() {
        let mut snap = snapshot(GamePhase::GameOver);
        snap.terminal = Some(TerminalCondition::Destroyed);
        assert!(render_hud(&snap).starts_with("GAME OVER (destroyed)"));
    }

    #[test]
    fn cues_are_mostly_silent() {
        assert!(describe_event(&GameEvent::sound(SoundCue::PowerUp)).is_none());
        assert!(describe_event(&GameEvent::sound(SoundCue::AltitudeWarning)).is_some());
        assert_eq!(
            describe_event(&GameEvent::AnswerScored {
                round: 1,
                word: "Runway".into(),
                verdict: Verdict::Correct,
                pronunciation_score: Some(0.87),
            }),
            Some("  ✓ 87%".to_string())
        );
    }
}
