//! Config command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::config::CliConfig;
use crate::error::CliError;

/// Print the effective configuration (file, defaults and environment merged).
pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", render(ctx.config())?);
    Ok(())
}

pub fn render(config: &CliConfig) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(config)?)
}
