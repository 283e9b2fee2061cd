//! Command tree and per-command entry points.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub mod absorb;
pub mod checkpoint;
pub mod completions;
pub mod create;
pub mod delete;
pub mod line;
pub mod lines;
pub mod patch;
pub mod resolve;
pub mod status;
pub mod switch;
pub mod sync;
pub mod utils;

/// Work on named lines, checkpoint freely, and absorb one line into
/// another. Uncommitted work and unresolved merges stay with their line
/// when you switch away and come back.
#[derive(Parser)]
#[command(name = "metro")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'metro <command> --help' for more information on a specific command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Only print errors and essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log what metro does (-v debug, -vv trace; METRO_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a repository with a first checkpoint of the directory
    Create {
        /// Directory to create it in (defaults to the current one)
        directory: Option<PathBuf>,

        /// Name of the first line
        #[arg(long, default_value = "master")]
        line: String,
    },

    /// Create a new line at the current head
    Line {
        /// Line name
        name: String,
    },

    /// List lines
    Lines,

    /// Switch to another line, parking uncommitted work on the current one
    Switch {
        /// Line to switch to
        name: String,
    },

    /// Checkpoint all changes on the current line
    #[command(visible_alias = "commit")]
    Checkpoint {
        /// Checkpoint message
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Fold current changes into the last checkpoint
    Patch {
        /// New message (keeps the old one if omitted)
        message: Option<String>,
    },

    /// Delete checkpoints or lines
    #[command(subcommand)]
    Delete(DeleteCommands),

    /// Merge another line into the current one
    Absorb {
        /// Line to absorb
        line: String,
    },

    /// Finish an absorb once its conflicts are fixed
    Resolve,

    /// Sync the current line with its remote
    Sync {
        /// `down` (default) or `up`; a url may be given in its place
        direction: Option<String>,

        /// Remote url, saved for later syncs
        url: Option<String>,

        /// Discard local commits and changes, matching the remote exactly
        #[arg(long)]
        force: bool,
    },

    /// Show the current line, changes and any pending merge
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum DeleteCommands {
    /// Remove the last checkpoints, keeping their changes in the working tree
    Commit {
        /// Number of checkpoints
        #[arg(default_value_t = 1)]
        count: usize,
    },

    /// Delete a line and any work parked on it
    Line {
        /// Line name
        name: String,
    },
}

impl Commands {
    /// Sub-command name as typed on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Line { .. } => "line",
            Self::Lines => "lines",
            Self::Switch { .. } => "switch",
            Self::Checkpoint { .. } => "checkpoint",
            Self::Patch { .. } => "patch",
            Self::Delete(_) => "delete",
            Self::Absorb { .. } => "absorb",
            Self::Resolve => "resolve",
            Self::Sync { .. } => "sync",
            Self::Status { .. } => "status",
            Self::Completions { .. } => "completions",
        }
    }
}
