//! # metro-core
//!
//! Workflow engines for Metro: checkpoints, lines, the work-in-progress
//! stash that carries uncommitted work and unresolved merges across line
//! switches, the absorb/resolve merge workflow, and remote down-sync.
//!
//! Every engine borrows a [`metro_git::VersionStore`] and the resolved
//! [`Settings`]; none of them hold state of their own.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod line_name;
pub mod lines;
pub mod merge;
pub mod status;
pub mod sync;
pub mod wip;

#[cfg(test)]
mod test_support;

pub use checkpoint::CheckpointEngine;
pub use config::{Config, Settings};
pub use error::{Error, ErrorKind, Result};
pub use line_name::{LineName, WipSuffix};
pub use lines::{DeleteOutcome, Line, LineManager, LineSummary, SwitchOutcome, current_line};
pub use merge::{AbsorbOutcome, MergeWorkflow};
pub use status::{MergeStatus, RepoStatus};
pub use sync::{DivergedChoice, DownsyncOutcome, SyncEngine, SyncPrompt};
pub use wip::{WipKind, WipStash};
