//! CLI command definitions using clap.
//!
//! Track arguments are passed through as raw strings; the orchestrator
//! validates them so an unknown track fails the same way from every entry
//! point.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// debug-mode - run two isolated agent debugging tracks side by side
#[derive(Parser, Debug)]
#[command(name = "debug-mode")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create worktrees and progress documents for both tracks
    Init {
        /// Git repository to debug
        project_root: PathBuf,

        /// Bug description written into the progress documents
        #[arg(short, long)]
        bug: Option<String>,

        /// Command that reproduces the bug
        #[arg(short, long)]
        repro: Option<String>,

        /// Initial hypothesis (repeatable)
        #[arg(short = 'H', long = "hypothesis")]
        hypotheses: Vec<String>,
    },

    /// Launch one agent iteration in a detached session
    Run {
        /// track-a or track-b
        track: String,

        /// Iteration number, starting at 1
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        iteration: u32,

        /// File holding the prompt for this iteration
        prompt: PathBuf,
    },

    /// Report whether a track's session is running, done, failed or gone
    Poll {
        track: String,
    },

    /// Terminate a track's session
    Kill {
        track: String,
    },

    /// Show the effective signal from a track's progress document
    Status {
        track: String,
    },

    /// Print a track's changes as a patch
    Diff {
        track: String,
    },

    /// Apply a track's changes to the project
    Apply {
        track: String,

        /// Git repository to apply the patch to
        project_root: PathBuf,
    },

    /// Kill sessions, remove worktrees, archive branches, delete temp files
    Cleanup {
        /// Project to clean and scan for leftover debug markers
        #[arg(default_value = ".")]
        project_root: PathBuf,
    },
}
