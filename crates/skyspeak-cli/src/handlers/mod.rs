//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//!   (plain `fn` when nothing is awaited)
//! - Thin wrappers that build ports from the context, drive a session and
//!   format output for the terminal
//!
//! Game rules live in `skyspeak-session`, never here.

pub mod config;
pub mod play;
pub mod simulate;
pub mod words;
