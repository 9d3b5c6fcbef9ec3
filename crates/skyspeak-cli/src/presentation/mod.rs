//! Terminal presentation.
//!
//! Format-only helpers: nothing here touches session state.

pub mod hud;

pub use hud::{describe_event, format_clock, render_hud};
