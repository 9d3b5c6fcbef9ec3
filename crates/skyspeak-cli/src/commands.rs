//! Available subcommands.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum Commands {
    /// Play with the microphone and the scoring service
    Play {
        /// Append session facts to this JSON-lines file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run a match with scripted utterances and scores
    Simulate {
        /// Outcome of each round in order: c (correct), i (incorrect), s (scoring failure)
        #[arg(long, num_args = 1.., value_enum, required = true)]
        answers: Vec<ScriptedAnswer>,
        /// Delay before each utterance and each score (milliseconds)
        #[arg(long, default_value = "300")]
        latency_ms: u64,
        /// Seed for word draws and projectile jitter
        #[arg(long)]
        seed: Option<u64>,
        /// Append session facts to this JSON-lines file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// List the vocabulary
    Words,

    /// Print the effective configuration as JSON
    Config,
}

/// One scripted round outcome for `simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScriptedAnswer {
    #[value(name = "c", alias = "correct")]
    Correct,
    #[value(name = "i", alias = "incorrect")]
    Incorrect,
    #[value(name = "s", alias = "fail")]
    ScoringFailure,
}
