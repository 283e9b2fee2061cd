//! Two-phase merge workflow: absorb another line, then resolve.
//!
//! `absorb` applies the merge and, when it is clean, finishes it straight
//! away. When it conflicts the repository stays merging until `resolve`
//! commits whatever the user left in the working tree. The message of the
//! final commit is the one recorded when the merge started.

use metro_git::{IndexState, MergeAnalysis, Oid, VersionStore};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Pending message recorded when absorbing `label`.
#[must_use]
pub fn default_message(label: &str) -> String {
    format!("Absorbed {label}")
}

/// Result of an absorb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsorbOutcome {
    /// The merge was clean and has been committed.
    Absorbed {
        /// The two-parent merge commit.
        commit: Oid,
    },
    /// The merge stopped on conflicts.
    Conflicted {
        /// Paths that need fixing before `resolve`.
        conflicts: Vec<String>,
    },
}

/// Service for absorbing lines into the current one.
pub struct MergeWorkflow<'a, S: VersionStore> {
    store: &'a S,
    settings: &'a Settings,
}

impl<'a, S: VersionStore> MergeWorkflow<'a, S> {
    /// Create a new merge workflow.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Merge `other` into the current line.
    ///
    /// `other` is a line name, or any revision when no line has that name.
    ///
    /// # Errors
    /// Returns `InvalidName` for marker names, `AlreadyMerging`,
    /// `UncommittedChanges`, `NoSuchLine`, `NothingToAbsorb` when there is
    /// nothing new, and `UnsupportedMerge` for fast-forwards.
    pub fn absorb(&self, other: &str) -> Result<AbsorbOutcome> {
        self.settings.wip_suffix.ensure_not_reserved(other)?;
        if self.store.is_merge_in_progress() {
            return Err(Error::AlreadyMerging);
        }
        if self.store.is_dirty(&self.settings.ignore_patterns)? {
            return Err(Error::UncommittedChanges);
        }

        let theirs = self.resolve_target(other)?;
        let state = self.start_merge(theirs, other)?;

        if state.has_conflicts() {
            let conflicts: Vec<String> = state.conflicts.into_iter().map(|c| c.path).collect();
            tracing::info!(other, conflicts = conflicts.len(), "absorb stopped on conflicts");
            return Ok(AbsorbOutcome::Conflicted { conflicts });
        }

        let commit = self.resolve()?;
        Ok(AbsorbOutcome::Absorbed { commit })
    }

    /// Commit the merge in progress with two parents and its pending message.
    ///
    /// # Errors
    /// Returns `NotMerging` if no merge is in progress.
    pub fn resolve(&self) -> Result<Oid> {
        if !self.store.is_merge_in_progress() {
            return Err(Error::NotMerging);
        }

        let merge_head = self.store.merge_head()?;
        let message = self.store.merge_message()?;
        let head = self.store.head_commit()?;

        self.store.clear_conflicts()?;
        self.store.stage_all(&self.settings.ignore_patterns)?;
        let tree = self.store.write_tree()?;
        let commit = self
            .store
            .create_commit(&message, tree, &[head, merge_head])?;
        self.store.clear_merge_state()?;

        tracing::info!(commit = %commit, merge_head = %merge_head, "resolved merge");
        Ok(commit)
    }

    /// Apply a merge of `theirs` into HEAD and record the default message.
    ///
    /// Shared by absorb and by the restore of a parked merge, so both
    /// produce the same conflicts for the same inputs.
    pub(crate) fn start_merge(&self, theirs: Oid, label: &str) -> Result<IndexState> {
        let ours = self.store.head_commit()?;
        match self.store.merge_analysis(ours, theirs)? {
            MergeAnalysis::Normal => {}
            MergeAnalysis::UpToDate | MergeAnalysis::None => {
                return Err(Error::NothingToAbsorb(label.to_string()));
            }
            MergeAnalysis::FastForward => {
                return Err(Error::UnsupportedMerge(format!(
                    "'{label}' only adds commits on top of the current line"
                )));
            }
        }

        let state = self.store.apply_merge(theirs)?;
        self.store.set_merge_message(&default_message(label))?;
        tracing::debug!(theirs = %theirs, conflicts = state.conflicts.len(), "started merge");
        Ok(state)
    }

    fn resolve_target(&self, other: &str) -> Result<Oid> {
        if self.store.line_exists(other) {
            return Ok(self.store.line_commit(other)?);
        }
        self.store
            .resolve_revision(other)
            .map_err(|_| Error::NoSuchLine(other.to_string()))
    }
}
