//! Error types for metro-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during version store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// Branch (line) not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Branch (line) already exists.
    #[error("branch already exists: {0}")]
    BranchExists(String),

    /// Reference or revision not found.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Remote not found.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Fetch failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// Reading or writing repository metadata failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}
