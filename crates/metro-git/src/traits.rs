//! Trait abstraction over the version store.
//!
//! This module defines the `VersionStore` trait: the capabilities Metro's
//! workflow engines consume from the underlying repository. Engines are
//! generic over it so they can be driven by [`Repository`] or by a test double.

use std::path::Path;

use git2::Oid;

use crate::{
    CommitInfo, ConflictEntry, FetchCallbacks, IndexState, LineRef, MergeAnalysis, Repository,
    Result,
};

/// Trait for version store operations.
///
/// Note: every operation is synchronous; a fetch blocks until the
/// transfer (and any credential prompt) completes.
#[allow(clippy::missing_errors_doc)]
pub trait VersionStore {
    // === Repository Info ===

    /// Get the working directory path.
    fn workdir(&self) -> Option<&Path>;

    /// Get the path to the .git directory.
    fn git_dir(&self) -> &Path;

    // === Revisions ===

    /// Resolve a revision expression to a commit.
    fn resolve_revision(&self, rev: &str) -> Result<Oid>;

    /// Commit HEAD currently points at.
    fn head_commit(&self) -> Result<Oid>;

    /// Point HEAD at a line without touching files.
    fn set_head(&self, line: &str) -> Result<()>;

    /// Message, parents and time of a commit.
    fn commit_info(&self, oid: Oid) -> Result<CommitInfo>;

    // === Lines ===

    /// All local lines.
    fn lines(&self) -> Result<Vec<LineRef>>;

    /// Commit a line points at.
    fn line_commit(&self, name: &str) -> Result<Oid>;

    /// Check if a line exists.
    fn line_exists(&self, name: &str) -> bool;

    /// Create a line at `at`.
    fn create_line(&self, name: &str, at: Oid) -> Result<()>;

    /// Delete a line.
    fn delete_line(&self, name: &str) -> Result<()>;

    /// Move a line to `target`.
    fn set_line_target(&self, name: &str, target: Oid) -> Result<()>;

    // === Commits ===

    /// Stage everything that isn't ignored.
    fn stage_all(&self, ignore_patterns: &[String]) -> Result<()>;

    /// Write the index out as a tree.
    fn write_tree(&self) -> Result<Oid>;

    /// Create a commit and advance HEAD onto it.
    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid>;

    /// Move HEAD's line, keeping index and files.
    fn reset_soft(&self, target: Oid) -> Result<()>;

    /// Move HEAD's line, overwriting index and files.
    fn reset_hard(&self, target: Oid) -> Result<()>;

    // === Working Directory ===

    /// Write a commit's tree into the working directory.
    fn checkout_tree(&self, commit: Oid, force: bool) -> Result<()>;

    /// Paths with uncommitted changes.
    fn changed_paths(&self, ignore_patterns: &[String]) -> Result<Vec<String>>;

    /// Check for uncommitted changes.
    fn is_dirty(&self, ignore_patterns: &[String]) -> Result<bool>;

    // === Merging ===

    /// Classify how `theirs` relates to `ours`.
    fn merge_analysis(&self, ours: Oid, theirs: Oid) -> Result<MergeAnalysis>;

    /// Merge `theirs` into HEAD, possibly leaving conflicts.
    fn apply_merge(&self, theirs: Oid) -> Result<IndexState>;

    /// Check for conflict entries in the index.
    fn has_conflicts(&self) -> Result<bool>;

    /// All conflict entries in the index.
    fn list_conflicts(&self) -> Result<Vec<ConflictEntry>>;

    /// Remove all conflict entries from the index.
    fn clear_conflicts(&self) -> Result<()>;

    /// Re-insert a conflict entry into the index.
    fn add_conflict_entry(&self, entry: &ConflictEntry) -> Result<()>;

    /// Check if a merge is in progress.
    fn is_merge_in_progress(&self) -> bool;

    /// Commit being merged in.
    fn merge_head(&self) -> Result<Oid>;

    /// Pending merge message.
    fn merge_message(&self) -> Result<String>;

    /// Replace the pending merge message.
    fn set_merge_message(&self, message: &str) -> Result<()>;

    /// Drop the merge head and pending message.
    fn clear_merge_state(&self) -> Result<()>;

    // === Remote Operations ===

    /// URL of a remote, if configured.
    fn remote_url(&self, name: &str) -> Option<String>;

    /// Create or repoint a remote.
    fn ensure_remote(&self, name: &str, url: Option<&str>) -> Result<()>;

    /// Fetch a remote.
    fn fetch(&self, remote: &str, callbacks: &mut dyn FetchCallbacks) -> Result<()>;

    /// Commit a remote-tracking line points at.
    fn remote_line_commit(&self, remote: &str, line: &str) -> Result<Oid>;
}

impl VersionStore for Repository {
    fn workdir(&self) -> Option<&Path> {
        self.workdir()
    }

    fn git_dir(&self) -> &Path {
        self.git_dir()
    }

    fn resolve_revision(&self, rev: &str) -> Result<Oid> {
        self.resolve_revision(rev)
    }

    fn head_commit(&self) -> Result<Oid> {
        self.head_commit()
    }

    fn set_head(&self, line: &str) -> Result<()> {
        self.set_head(line)
    }

    fn commit_info(&self, oid: Oid) -> Result<CommitInfo> {
        self.commit_info(oid)
    }

    fn lines(&self) -> Result<Vec<LineRef>> {
        self.lines()
    }

    fn line_commit(&self, name: &str) -> Result<Oid> {
        self.line_commit(name)
    }

    fn line_exists(&self, name: &str) -> bool {
        self.line_exists(name)
    }

    fn create_line(&self, name: &str, at: Oid) -> Result<()> {
        self.create_line(name, at)
    }

    fn delete_line(&self, name: &str) -> Result<()> {
        self.delete_line(name)
    }

    fn set_line_target(&self, name: &str, target: Oid) -> Result<()> {
        self.set_line_target(name, target)
    }

    fn stage_all(&self, ignore_patterns: &[String]) -> Result<()> {
        self.stage_all(ignore_patterns)
    }

    fn write_tree(&self) -> Result<Oid> {
        self.write_tree()
    }

    fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        self.create_commit(message, tree, parents)
    }

    fn reset_soft(&self, target: Oid) -> Result<()> {
        self.reset_soft(target)
    }

    fn reset_hard(&self, target: Oid) -> Result<()> {
        self.reset_hard(target)
    }

    fn checkout_tree(&self, commit: Oid, force: bool) -> Result<()> {
        self.checkout_tree(commit, force)
    }

    fn changed_paths(&self, ignore_patterns: &[String]) -> Result<Vec<String>> {
        self.changed_paths(ignore_patterns)
    }

    fn is_dirty(&self, ignore_patterns: &[String]) -> Result<bool> {
        self.is_dirty(ignore_patterns)
    }

    fn merge_analysis(&self, ours: Oid, theirs: Oid) -> Result<MergeAnalysis> {
        self.merge_analysis(ours, theirs)
    }

    fn apply_merge(&self, theirs: Oid) -> Result<IndexState> {
        self.apply_merge(theirs)
    }

    fn has_conflicts(&self) -> Result<bool> {
        self.has_conflicts()
    }

    fn list_conflicts(&self) -> Result<Vec<ConflictEntry>> {
        self.list_conflicts()
    }

    fn clear_conflicts(&self) -> Result<()> {
        self.clear_conflicts()
    }

    fn add_conflict_entry(&self, entry: &ConflictEntry) -> Result<()> {
        self.add_conflict_entry(entry)
    }

    fn is_merge_in_progress(&self) -> bool {
        self.is_merge_in_progress()
    }

    fn merge_head(&self) -> Result<Oid> {
        self.merge_head()
    }

    fn merge_message(&self) -> Result<String> {
        self.merge_message()
    }

    fn set_merge_message(&self, message: &str) -> Result<()> {
        self.set_merge_message(message)
    }

    fn clear_merge_state(&self) -> Result<()> {
        self.clear_merge_state()
    }

    fn remote_url(&self, name: &str) -> Option<String> {
        self.remote_url(name)
    }

    fn ensure_remote(&self, name: &str, url: Option<&str>) -> Result<()> {
        self.ensure_remote(name, url)
    }

    fn fetch(&self, remote: &str, callbacks: &mut dyn FetchCallbacks) -> Result<()> {
        self.fetch(remote, callbacks)
    }

    fn remote_line_commit(&self, remote: &str, line: &str) -> Result<Oid> {
        self.remote_line_commit(remote, line)
    }
}
