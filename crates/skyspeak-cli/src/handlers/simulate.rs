//! Simulate command handler.
//!
//! Plays a full match against the scripted capture device and scorer: one
//! utterance per scripted answer, scored as the script says. The run stops
//! when the match ends or once every scripted answer has been resolved.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use skyspeak_core::{
    AudioClip, GameEvent, GamePhase, ScoringError, ScoringResult, SessionSnapshot, Vocabulary,
};
use skyspeak_session::{SessionConfig, spawn_session};
use skyspeak_voice::{ScriptedCaptureDevice, ScriptedScorer, ScriptedTake};

use crate::bootstrap::{CliContext, event_sinks};
use crate::commands::ScriptedAnswer;
use crate::config::CliConfig;
use crate::error::CliError;
use crate::presentation::{describe_event, render_hud};

/// Sample rate of the synthetic utterances.
const CLIP_SAMPLE_RATE: u32 = 16_000;

pub struct SimulateArgs {
    pub answers: Vec<ScriptedAnswer>,
    pub latency_ms: u64,
    pub seed: Option<u64>,
    pub record: Option<PathBuf>,
}

/// What a simulated match produced.
pub struct SimulationReport {
    pub snapshot: SessionSnapshot,
    pub events: Vec<GameEvent>,
}

impl SimulationReport {
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }
}

/// Execute the simulate command, narrating events to stdout.
pub async fn execute(ctx: &CliContext, args: SimulateArgs) -> Result<()> {
    let report = run(ctx.config(), &args, |event| {
        if let Some(line) = describe_event(event) {
            println!("{line}");
        }
    })
    .await?;

    println!();
    println!("{}", render_hud(&report.snapshot));
    Ok(())
}

/// Run a scripted match, passing every event to `on_event` as it arrives.
pub async fn run(
    config: &CliConfig,
    args: &SimulateArgs,
    mut on_event: impl FnMut(&GameEvent),
) -> Result<SimulationReport> {
    let latency = Duration::from_millis(args.latency_ms);
    let device = Arc::new(
        ScriptedCaptureDevice::new(latency).with_script(
            args.answers
                .iter()
                .map(|_| ScriptedTake::Utterance(spoken_clip())),
        ),
    );
    let scorer = Arc::new(ScriptedScorer::new(
        latency,
        args.answers.iter().map(|a| scripted_outcome(*a)),
    ));

    let sinks = event_sinks(args.record.as_deref())?;
    let session = spawn_session(
        SessionConfig {
            settings: config.game.clone(),
            vocabulary: Vocabulary::aviation(),
            seed: args.seed,
        },
        device,
        scorer,
        sinks.emitter,
    )
    .map_err(CliError::from)?;
    let snapshots = session.subscribe();
    let mut events = sinks.events;

    tracing::info!(answers = args.answers.len(), "Starting simulated match");
    session.start()?;
    session.play()?;

    let last_round = args.answers.len() as u64;
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        on_event(&event);
        let done = match &event {
            GameEvent::PhaseChanged {
                to: GamePhase::GameOver | GamePhase::Win,
                ..
            } => true,
            // Next word after the script ran out
            GameEvent::WordPrompted { round, .. } => *round > last_round,
            _ => false,
        };
        seen.push(event);
        if done {
            break;
        }
    }

    session.exit()?;
    session.join().await?;
    while let Ok(event) = events.try_recv() {
        on_event(&event);
        seen.push(event);
    }

    let snapshot = snapshots.borrow().clone();
    Ok(SimulationReport {
        snapshot,
        events: seen,
    })
}

/// Scoring outcome for one scripted answer.
pub fn scripted_outcome(answer: ScriptedAnswer) -> Result<ScoringResult, ScoringError> {
    match answer {
        ScriptedAnswer::Correct => Ok(ScoringResult::new(0.9)),
        ScriptedAnswer::Incorrect => Ok(ScoringResult::new(0.2)),
        ScriptedAnswer::ScoringFailure => Err(ScoringError::Transport(
            "scripted scoring failure".to_string(),
        )),
    }
}

/// Half a second of steady signal.
fn spoken_clip() -> AudioClip {
    AudioClip::new(vec![0.25; (CLIP_SAMPLE_RATE / 2) as usize], CLIP_SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_follow_pass_mark() {
        let pass_mark = 50.0;
        assert!(scripted_outcome(ScriptedAnswer::Correct).unwrap().passes(pass_mark));
        assert!(!scripted_outcome(ScriptedAnswer::Incorrect).unwrap().passes(pass_mark));
        assert!(scripted_outcome(ScriptedAnswer::ScoringFailure).is_err());
    }

    #[test]
    fn clip_is_half_a_second() {
        assert_eq!(spoken_clip().duration_ms(), 500);
    }
}
