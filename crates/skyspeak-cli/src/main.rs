//! CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use skyspeak_cli::handlers::simulate::SimulateArgs;
use skyspeak_cli::{Cli, CliError, Commands, bootstrap, handlers, init_logging};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(CliError::exit_code_for(&err))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let ctx = bootstrap(cli.config.as_deref())?;

    match command {
        Commands::Play { record } => handlers::play::execute(&ctx, record).await?,
        Commands::Simulate {
            answers,
            latency_ms,
            seed,
            record,
        } => {
            let args = SimulateArgs {
                answers,
                latency_ms,
                seed,
                record,
            };
            handlers::simulate::execute(&ctx, args).await?;
        }
        Commands::Words => handlers::words::execute()?,
        Commands::Config => handlers::config::execute(&ctx)?,
    }

    Ok(())
}
