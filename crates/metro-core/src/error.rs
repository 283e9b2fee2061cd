//! Error types for metro-core.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of failure, used by callers that react to the class
/// rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or reserved names.
    Validation,
    /// The repository is in the wrong state for the operation.
    State,
    /// Something named by the caller does not exist.
    NotFound,
    /// The histories cannot be combined by this tool.
    UnsupportedMerge,
    /// Failure surfaced from the version store or the filesystem.
    Store,
}

/// Errors that can occur in metro-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid line name.
    #[error("invalid line name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name is invalid.
        reason: String,
    },

    /// Commit message is blank.
    #[error("commit message cannot be empty")]
    EmptyMessage,

    /// Commit count must be at least one.
    #[error("invalid commit count {0}: must be at least 1")]
    InvalidCount(usize),

    /// Line already exists.
    #[error("line '{0}' already exists")]
    AlreadyExists(String),

    /// A merge is already in progress.
    #[error("a merge is already in progress - fix the conflicts and run `metro resolve`")]
    AlreadyMerging,

    /// No merge is in progress.
    #[error("no merge in progress")]
    NotMerging,

    /// Conflicts must be resolved first.
    #[error("unresolved conflicts - fix them and run `metro resolve` first")]
    ConflictsPending,

    /// The current line cannot be deleted.
    #[error("cannot delete '{0}': it is the current line")]
    CannotDeleteCurrent(String),

    /// The working tree has uncommitted changes.
    #[error("uncommitted changes - checkpoint them first")]
    UncommittedChanges,

    /// Line not found.
    #[error("no such line: {0}")]
    NoSuchLine(String),

    /// HEAD does not refer to any line.
    #[error("HEAD is not on any line")]
    NoCurrentLine,

    /// Nothing to merge in.
    #[error("nothing to absorb from '{0}'")]
    NothingToAbsorb(String),

    /// Walked past the first commit.
    #[error("commit {0} has no parent")]
    NoParent(String),

    /// The remote has no counterpart of the current line.
    #[error("remote '{remote}' has no line '{line}'")]
    NoRemoteLine {
        /// Remote name.
        remote: String,
        /// Line looked up on it.
        line: String,
    },

    /// No remote URL was configured or supplied.
    #[error("remote '{0}' is not configured - pass a url")]
    RemoteNotConfigured(String),

    /// The merge cannot be performed by absorb.
    #[error("unsupported merge: {0}")]
    UnsupportedMerge(String),

    /// Pushing is not implemented.
    #[error("sync up is not supported yet")]
    UpsyncUnsupported,

    /// Config file parsing error.
    #[error("failed to parse {file}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Version store error.
    #[error("git error: {0}")]
    Git(#[from] metro_git::Error),
}

impl Error {
    /// The class this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName { .. }
            | Self::EmptyMessage
            | Self::InvalidCount(_)
            | Self::AlreadyExists(_)
            | Self::RemoteNotConfigured(_) => ErrorKind::Validation,
            Self::AlreadyMerging
            | Self::NotMerging
            | Self::ConflictsPending
            | Self::CannotDeleteCurrent(_)
            | Self::UncommittedChanges
            | Self::NoCurrentLine => ErrorKind::State,
            Self::NoSuchLine(_)
            | Self::NothingToAbsorb(_)
            | Self::NoParent(_)
            | Self::NoRemoteLine { .. } => ErrorKind::NotFound,
            Self::UnsupportedMerge(_) | Self::UpsyncUnsupported => ErrorKind::UnsupportedMerge,
            Self::ConfigParse { .. } | Self::Io(_) | Self::Git(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
