//! Session controller for the skyspeak voice flight game.
//!
//! - [`machine`] - the pure session state machine (phases, rounds, terminal latch)
//! - [`timeline`] - cancellable, epoch-stamped delayed effects
//! - [`physics`] - gravity, rotation smoothing and the low-altitude edge
//! - [`ticker`] - physics and countdown tickers
//! - [`capture`] - the machine's synchronous view of the capture lifecycle
//! - [`controller`] - the async actor that drives the machine

#![deny(unused_crate_dependencies)]

pub mod capture;
pub mod controller;
pub mod error;
pub mod machine;
pub mod physics;
pub mod ticker;
pub mod timeline;

pub use capture::CaptureControl;
pub use controller::{SessionConfig, SessionHandle, spawn_session};
pub use error::SessionError;
pub use machine::{Command, Directive, Input, SessionMachine, TickKind};
pub use timeline::{AnswerScript, PendingEffect, Step, Timeline};

// Used only by integration tests
#[cfg(test)]
use async_trait as _;
