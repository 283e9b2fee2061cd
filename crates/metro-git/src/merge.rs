//! Merge primitives: analysis, applying a merge, and direct access to
//! conflict entries and the pending merge message.

use std::fs;
use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, IndexEntry, IndexTime, Oid, RepositoryState};

use crate::Repository;
use crate::error::{Error, Result};

/// File in the git directory holding the pending merge message.
const MERGE_MSG_FILE: &str = "MERGE_MSG";

/// Bit offset of the stage number inside index entry flags.
const STAGE_SHIFT: u16 = 12;

/// How the history of two commits relates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAnalysis {
    /// No merge is possible (the histories share no commit).
    None,
    /// `theirs` is already contained in `ours`.
    UpToDate,
    /// `ours` is an ancestor of `theirs`.
    FastForward,
    /// Both sides have diverged and need a real merge.
    Normal,
}

/// One side (ancestor, ours or theirs) of a conflicted path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictSide {
    /// File mode recorded in the index.
    pub mode: u32,
    /// Blob id.
    pub id: Oid,
}

impl ConflictSide {
    fn from_entry(entry: &IndexEntry) -> Self {
        Self {
            mode: entry.mode,
            id: entry.id,
        }
    }

    fn to_entry(self, path: &str, stage: u16) -> IndexEntry {
        IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: self.mode,
            uid: 0,
            gid: 0,
            file_size: 0,
            id: self.id,
            flags: stage << STAGE_SHIFT,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        }
    }
}

/// A conflicted path in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// Stage 1.
    pub ancestor: Option<ConflictSide>,
    /// Stage 2.
    pub ours: Option<ConflictSide>,
    /// Stage 3.
    pub theirs: Option<ConflictSide>,
}

/// The index after a merge has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexState {
    /// Conflicted paths, empty for a clean merge.
    pub conflicts: Vec<ConflictEntry>,
}

impl IndexState {
    /// Whether the merge left conflicts behind.
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

impl Repository {
    /// Classify how `theirs` relates to `ours`.
    ///
    /// # Errors
    /// Returns error if the merge base cannot be computed.
    pub fn merge_analysis(&self, ours: Oid, theirs: Oid) -> Result<MergeAnalysis> {
        if ours == theirs {
            return Ok(MergeAnalysis::UpToDate);
        }

        match self.inner().merge_base(ours, theirs) {
            Ok(base) if base == theirs => Ok(MergeAnalysis::UpToDate),
            Ok(base) if base == ours => Ok(MergeAnalysis::FastForward),
            Ok(_) => Ok(MergeAnalysis::Normal),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(MergeAnalysis::None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge `theirs` into HEAD, leaving the repository in the merging state.
    ///
    /// The working tree is force-checked-out with conflict markers where
    /// the sides disagree.
    ///
    /// # Errors
    /// Returns error if the merge cannot be applied.
    pub fn apply_merge(&self, theirs: Oid) -> Result<IndexState> {
        let annotated = self.inner().find_annotated_commit(theirs)?;
        let mut options = git2::MergeOptions::new();
        let mut checkout = CheckoutBuilder::new();
        checkout.force().allow_conflicts(true);

        self.inner()
            .merge(&[&annotated], Some(&mut options), Some(&mut checkout))?;

        let state = IndexState {
            conflicts: self.list_conflicts()?,
        };
        tracing::debug!(
            theirs = %theirs,
            conflicts = state.conflicts.len(),
            "applied merge"
        );
        Ok(state)
    }

    /// Check whether the index holds conflict entries.
    ///
    /// # Errors
    /// Returns error if the index cannot be read.
    pub fn has_conflicts(&self) -> Result<bool> {
        Ok(self.inner().index()?.has_conflicts())
    }

    /// All conflicted paths with their three sides.
    ///
    /// # Errors
    /// Returns error if the index cannot be read.
    pub fn list_conflicts(&self) -> Result<Vec<ConflictEntry>> {
        let index = self.inner().index()?;
        if !index.has_conflicts() {
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let path = [&conflict.our, &conflict.their, &conflict.ancestor]
                .into_iter()
                .flatten()
                .next()
                .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
                .unwrap_or_default();

            entries.push(ConflictEntry {
                path,
                ancestor: conflict.ancestor.as_ref().map(ConflictSide::from_entry),
                ours: conflict.our.as_ref().map(ConflictSide::from_entry),
                theirs: conflict.their.as_ref().map(ConflictSide::from_entry),
            });
        }
        Ok(entries)
    }

    /// Remove every conflict entry from the index and persist it.
    ///
    /// # Errors
    /// Returns error if the index cannot be updated.
    pub fn clear_conflicts(&self) -> Result<()> {
        let conflicts = self.list_conflicts()?;
        let mut index = self.inner().index()?;
        for conflict in &conflicts {
            let path = Path::new(&conflict.path);
            for stage in 1..=3 {
                remove_index_entry(&mut index, path, stage)?;
            }
        }
        index.write()?;
        Ok(())
    }

    /// Put a conflict back into the index, replacing the resolved entry for its path.
    ///
    /// # Errors
    /// Returns error if the index cannot be updated.
    pub fn add_conflict_entry(&self, entry: &ConflictEntry) -> Result<()> {
        let mut index = self.inner().index()?;
        remove_index_entry(&mut index, Path::new(&entry.path), 0)?;

        for (stage, side) in [(1, entry.ancestor), (2, entry.ours), (3, entry.theirs)] {
            if let Some(side) = side {
                index.add(&side.to_entry(&entry.path, stage))?;
            }
        }
        index.write()?;
        Ok(())
    }

    // === Merge state ===

    /// Check if a merge is in progress (MERGE_HEAD exists).
    #[must_use]
    pub fn is_merge_in_progress(&self) -> bool {
        matches!(self.state(), RepositoryState::Merge)
    }

    /// The commit being merged in.
    ///
    /// # Errors
    /// Returns `RefNotFound` if no merge is in progress.
    pub fn merge_head(&self) -> Result<Oid> {
        let object = self
            .inner()
            .revparse_single("MERGE_HEAD")
            .map_err(|_| Error::RefNotFound("MERGE_HEAD".into()))?;
        Ok(object.peel_to_commit()?.id())
    }

    /// Read the pending merge message.
    ///
    /// # Errors
    /// Returns error if the message file cannot be read.
    pub fn merge_message(&self) -> Result<String> {
        Ok(fs::read_to_string(self.git_dir().join(MERGE_MSG_FILE))?)
    }

    /// Replace the pending merge message.
    ///
    /// # Errors
    /// Returns error if the message file cannot be written.
    pub fn set_merge_message(&self, message: &str) -> Result<()> {
        fs::write(self.git_dir().join(MERGE_MSG_FILE), message)?;
        Ok(())
    }

    /// Drop MERGE_HEAD, the pending message and related state files.
    ///
    /// # Errors
    /// Returns error if cleanup fails.
    pub fn clear_merge_state(&self) -> Result<()> {
        self.inner().cleanup_state()?;
        tracing::debug!("cleared merge state");
        Ok(())
    }
}

fn remove_index_entry(index: &mut git2::Index, path: &Path, stage: i32) -> Result<()> {
    match index.remove(path, stage) {
        Ok(()) => Ok(()),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
