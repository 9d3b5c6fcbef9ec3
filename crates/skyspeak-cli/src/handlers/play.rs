//! Play command handler.
//!
//! Live play: microphone capture through the VAD device, scoring through the
//! HTTP gateway. The start and instruction screens advance on their own;
//! after a match the player is asked whether to fly again.

use std::path::PathBuf;

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Execute the play command.
#[cfg(feature = "microphone")]
pub async fn execute(ctx: &CliContext, record: Option<PathBuf>) -> Result<()> {
    use std::io::Write;
    use std::sync::Arc;

    use skyspeak_core::{GameEvent, GamePhase, Vocabulary};
    use skyspeak_session::{SessionConfig, spawn_session};
    use skyspeak_voice::{HttpScoringGateway, MicrophoneSource, VadCaptureDevice};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::bootstrap::event_sinks;
    use crate::error::CliError;
    use crate::presentation::{describe_event, render_hud};

    let config = ctx.config();
    let source = MicrophoneSource::default_input().map_err(CliError::from)?;
    let device = Arc::new(VadCaptureDevice::new(source, config.vad.clone()));
    let scorer = Arc::new(HttpScoringGateway::new(config.scoring.clone()).map_err(CliError::from)?);
    tracing::info!(endpoint = %scorer.endpoint(), "Using scoring service");

    let sinks = event_sinks(record.as_deref())?;
    let session = spawn_session(
        SessionConfig {
            settings: config.game.clone(),
            vocabulary: Vocabulary::aviation(),
            seed: None,
        },
        device,
        scorer,
        sinks.emitter,
    )
    .map_err(CliError::from)?;

    let mut events = sinks.events;
    let mut snapshots = session.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting_replay = false;

    session.start()?;
    println!("Say each word on screen clearly to climb. Type q and enter to quit.");
    session.play()?;

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                if let Some(line) = describe_event(&event) {
                    println!("\r{line}");
                }
                if let GameEvent::PhaseChanged { to: GamePhase::GameOver | GamePhase::Win, .. } = event {
                    println!("{}", render_hud(&session.snapshot()));
                    print!("Fly again? [y/N] ");
                    std::io::stdout().flush()?;
                    awaiting_replay = true;
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.session.phase == GamePhase::Playing {
                    print!("\r{}", render_hud(&snapshot));
                    std::io::stdout().flush()?;
                }
            }
            line = stdin.next_line() => {
                let line = line?.unwrap_or_else(|| "q".to_string());
                let answer = line.trim().to_ascii_lowercase();
                let phase = session.snapshot().session.phase;

                if answer == "q" || answer == "quit" {
                    break;
                }
                if awaiting_replay && phase.is_terminal() {
                    awaiting_replay = false;
                    if answer != "y" && answer != "yes" {
                        break;
                    }
                    session.restart()?;
                    session.start()?;
                    session.play()?;
                }
            }
        }
    }

    session.exit()?;
    session.join().await?;
    while let Ok(event) = events.try_recv() {
        if let Some(line) = describe_event(&event) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Execute the play command.
#[cfg(not(feature = "microphone"))]
pub async fn execute(_ctx: &CliContext, _record: Option<PathBuf>) -> Result<()> {
    Err(crate::error::CliError::Arguments(
        "skyspeak was built without microphone support; rebuild with `--features microphone` \
         or try `skyspeak simulate`"
            .to_string(),
    )
    .into())
}
