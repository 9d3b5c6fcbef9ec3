//! CLI bootstrap - the composition root.
//!
//! This module is the only place where infrastructure is wired together for
//! the CLI: logging, configuration, and the event emitters every session
//! command shares. Handlers receive a [`CliContext`] and build their
//! session from it.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use skyspeak_core::{ChannelEmitter, FanoutEmitter, GameEvent, GameEventEmitter};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::recorder::EventRecorder;

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub config: CliConfig,
}

impl CliContext {
    pub const fn config(&self) -> &CliConfig {
        &self.config
    }
}

/// Emitters for one session: console feed plus optional recorder.
pub struct EventSinks {
    pub emitter: Arc<dyn GameEventEmitter>,
    pub events: mpsc::UnboundedReceiver<GameEvent>,
}

/// Install the tracing subscriber.
///
/// Logs go to stderr so the HUD on stdout stays readable. `RUST_LOG` wins
/// over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration and compose the context.
pub fn bootstrap(config_path: Option<&Path>) -> Result<CliContext> {
    let config = CliConfig::load(config_path).context("Failed to load configuration")?;
    tracing::debug!(
        endpoint = %config.scoring.endpoint,
        win_score = config.game.win_score,
        "Configuration loaded"
    );
    Ok(CliContext { config })
}

/// Build the emitter handed to the session.
pub fn event_sinks(record: Option<&Path>) -> Result<EventSinks> {
    let (console, events) = ChannelEmitter::new();
    let emitter: Arc<dyn GameEventEmitter> = match record {
        Some(path) => {
            let recorder = EventRecorder::open(path).context("Failed to open record file")?;
            tracing::info!(path = %recorder.path().display(), "Recording session facts");
            Arc::new(FanoutEmitter::new(vec![Box::new(console), Box::new(recorder)]))
        }
        None => Arc::new(console),
    };
    Ok(EventSinks { emitter, events })
}
