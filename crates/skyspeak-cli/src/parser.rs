//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the skyspeak voice flight game.
#[derive(Parser)]
#[command(name = "skyspeak")]
#[command(about = "Keep the plane flying by pronouncing aviation words")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file (game, scoring, vad sections)
    #[arg(long = "config", global = true, env = "SKYSPEAK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ScriptedAnswer;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["skyspeak", "--verbose", "--config", "/tmp/sky.json", "words"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sky.json")));
        assert!(matches!(cli.command, Some(Commands::Words)));
    }

    #[test]
    fn test_simulate_args() {
        let cli = Cli::parse_from([
            "skyspeak",
            "simulate",
            "--answers",
            "c",
            "i",
            "s",
            "--latency-ms",
            "50",
            "--seed",
            "9",
        ]);
        let Some(Commands::Simulate {
            answers,
            latency_ms,
            seed,
            record,
        }) = cli.command
        else {
            panic!("expected simulate");
        };
        assert_eq!(
            answers,
            vec![
                ScriptedAnswer::Correct,
                ScriptedAnswer::Incorrect,
                ScriptedAnswer::ScoringFailure
            ]
        );
        assert_eq!(latency_ms, 50);
        assert_eq!(seed, Some(9));
        assert!(record.is_none());
    }

    #[test]
    fn test_play_record() {
        let cli = Cli::parse_from(["skyspeak", "play", "--record", "facts.jsonl"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Play { record: Some(ref path) }) if path == &PathBuf::from("facts.jsonl")
        ));
    }
}
