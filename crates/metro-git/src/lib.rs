//! # metro-git
//!
//! Version store for Metro, built on git2-rs.
//! Exposes lines (branches), checkpoints (commits), merge primitives with
//! conflict-entry access, working-tree checkout and remote fetch behind the
//! [`VersionStore`] trait.

mod error;
mod merge;
mod remote;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use git2::Oid;
pub use merge::{ConflictEntry, ConflictSide, IndexState, MergeAnalysis};
pub use remote::{Credential, FetchCallbacks, NoFetchCallbacks};
pub use repository::{CommitInfo, LineRef, Repository};
pub use traits::VersionStore;

// Re-export SecretString for constructing Credential
pub use secrecy::SecretString;
