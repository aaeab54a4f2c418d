//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::config::PlanFormat;

/// Reconstruct kernel-search runs from text logs: expression trees, rounds, steps and mutation paths
#[derive(Parser, Debug)]
#[command(name = "kerneltrace")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Fail on the first corrupt log line instead of skipping it
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the rounds of a run log
    Rounds {
        /// Run log
        #[arg(value_hint = ValueHint::FilePath)]
        log: PathBuf,
    },

    /// Show kernel trees of each step
    Show {
        /// Run log
        #[arg(value_hint = ValueHint::FilePath)]
        log: PathBuf,
        /// Only this round (1-based)
        #[arg(short, long)]
        round: Option<usize>,
    },

    /// Print the ordered render plan of a run
    Plan {
        /// Run log
        #[arg(value_hint = ValueHint::FilePath)]
        log: PathBuf,
        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<PlanFormat>,
        /// Write the plan to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Directory artifacts are resolved against (default from config)
        #[arg(long, value_hint = ValueHint::DirPath)]
        output_dir: Option<PathBuf>,
    },

    /// Parse a single kernel expression
    Parse {
        /// Kernel expression, e.g. "(RBF1 + PER2)"
        expr: String,
        /// Resolve and highlight this path (e.g. "LR", "root")
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show {
        /// Log directory whose local config is included
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
    /// Show config file locations
    Path {
        /// Log directory
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },
}
