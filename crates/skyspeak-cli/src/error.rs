//! CLI-specific error types and mappings.
//!
//! Handlers return `anyhow::Result`; a [`CliError`] anywhere in the chain
//! picks the process exit code.

use skyspeak_core::{ScoringError, SettingsError};
use skyspeak_session::SessionError;
use skyspeak_voice::VoiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or feature misuse.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session controller failed.
    #[error("Session error: {0}")]
    Session(String),

    /// The capture device could not be opened.
    #[error("Audio error: {0}")]
    Audio(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 74: IO error (`EX_IOERR`)
    /// - 78: Configuration error (`EX_CONFIG`)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::Session(_) | Self::Audio(_) => 1,
        }
    }

    /// Exit code for an arbitrary handler error.
    pub fn exit_code_for(err: &anyhow::Error) -> u8 {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<Self>())
            .map_or(1, Self::exit_code)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ScoringError> for CliError {
    fn from(err: ScoringError) -> Self {
        Self::Config(format!("Scoring gateway: {err}"))
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidSettings(settings) => settings.into(),
            other => Self::Session(other.to_string()),
        }
    }
}

impl From<VoiceError> for CliError {
    fn from(err: VoiceError) -> Self {
        Self::Audio(err.to_string())
    }
}
