//! Command-line front end for skyspeak.
//!
//! `main.rs` parses arguments and dispatches to [`handlers`]; everything is
//! wired together in [`bootstrap`].

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod recorder;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, EventSinks, bootstrap, event_sinks, init_logging};
pub use commands::{Commands, ScriptedAnswer};
pub use config::CliConfig;
pub use error::CliError;
pub use parser::Cli;
pub use recorder::EventRecorder;
