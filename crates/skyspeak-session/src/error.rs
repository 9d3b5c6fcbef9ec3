//! Session controller error types.

use skyspeak_core::SettingsError;

/// Errors surfaced when spawning or driving a session.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SessionError {
    /// The settings failed validation; nothing was spawned.
    #[error("Invalid game settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// The controller task has exited; its command channel is closed.
    #[error("Session controller stopped")]
    ControllerStopped,

    /// The controller task panicked or was cancelled.
    #[error("Session controller failed: {0}")]
    ControllerFailed(String),
}
