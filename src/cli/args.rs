//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Prune dependency parse trees of questions down to their content skeleton
#[derive(Parser, Debug)]
#[command(name = "depprune")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, env = "DEPPRUNE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prune parsed questions and print the resulting trees
    Prune {
        /// Token table file, `-` for stdin
        #[arg(default_value = "-", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Show (index|POS|deprel) next to labels
        #[arg(short, long)]
        tags: bool,
        /// Print what every stage removed
        #[arg(short, long)]
        report: bool,
    },

    /// Print parsed questions without pruning
    Show {
        /// Token table file, `-` for stdin
        #[arg(default_value = "-", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Show (index|POS|deprel) next to labels
        #[arg(short, long)]
        tags: bool,
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
    Show,
    /// Show global config file location
    Path,
    /// Print a commented config template
    Template,
}

impl Cli {
    /// True if `input` names stdin.
    pub fn is_stdin(input: &std::path::Path) -> bool {
        input.as_os_str() == "-"
    }
}
