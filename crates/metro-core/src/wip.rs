//! Work-in-progress stash.
//!
//! Before leaving a line, uncommitted work is committed onto a marker line
//! named `<line><suffix>`. If a merge is in progress the marker commit gets
//! the merge head as a second parent and carries the pending merge message
//! after a `WIP` first line, and the merge state is cleared. Restoring
//! re-runs the merge against that second parent to rebuild the conflict
//! entries, then lays the marker's tree over the working directory.

use metro_git::{Oid, VersionStore};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::lines::current_line;
use crate::merge::MergeWorkflow;

/// First line of every marker commit message.
pub const WIP_TAG: &str = "WIP";

/// What a marker commit preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipKind {
    /// Uncommitted files only.
    Work,
    /// An unresolved merge along with its files.
    Merge,
}

/// Saves and restores parked work for the current line.
pub struct WipStash<'a, S: VersionStore> {
    store: &'a S,
    settings: &'a Settings,
}

impl<'a, S: VersionStore> WipStash<'a, S> {
    /// Create a new stash.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Park the current line's uncommitted work on its marker.
    ///
    /// Returns `None` when there was nothing to park. HEAD is left on the
    /// marker, so the caller must move it before doing anything else.
    ///
    /// # Errors
    /// Returns `InvalidName` if HEAD is already on a marker.
    pub fn save(&self) -> Result<Option<WipKind>> {
        let merging = self.store.is_merge_in_progress();
        if !merging && !self.store.is_dirty(&self.settings.ignore_patterns)? {
            return Ok(None);
        }

        let suffix = &self.settings.wip_suffix;
        let line = current_line(self.store)?;
        if suffix.is_marker(&line) {
            return Err(Error::invalid_name(
                &line,
                "already on a work-in-progress marker",
            ));
        }

        let marker = suffix.marker_for(&line);
        if self.store.line_exists(&marker) {
            tracing::warn!(marker = %marker, "discarding stale work-in-progress marker");
            self.store.delete_line(&marker)?;
        }

        let head = self.store.head_commit()?;
        self.store.create_line(&marker, head)?;
        self.store.set_head(&marker)?;

        let (kind, oid) = if merging {
            let merge_head = self.store.merge_head()?;
            let pending = self.store.merge_message()?;
            self.store.clear_conflicts()?;
            let oid = self.commit(&format!("{WIP_TAG}\n{pending}"), &[head, merge_head])?;
            self.store.clear_merge_state()?;
            (WipKind::Merge, oid)
        } else {
            (WipKind::Work, self.commit(WIP_TAG, &[head])?)
        };

        tracing::info!(line = %line, commit = %oid, ?kind, "saved work in progress");
        Ok(Some(kind))
    }

    /// Bring back work parked on the current line's marker and delete it.
    ///
    /// Returns `None` when nothing was parked.
    ///
    /// # Errors
    /// Returns error if the merge cannot be rebuilt or the checkout fails.
    pub fn restore(&self) -> Result<Option<WipKind>> {
        let line = current_line(self.store)?;
        let marker = self.settings.wip_suffix.marker_for(&line);
        if !self.store.line_exists(&marker) {
            return Ok(None);
        }

        let wip = self.store.commit_info(self.store.line_commit(&marker)?)?;
        let (kind, conflicts) = match wip.parents.get(1) {
            Some(&merge_head) => {
                self.resume_merge(merge_head, &wip.message)?;
                // checkout cannot write over conflicted paths
                let conflicts = self.store.list_conflicts()?;
                self.store.clear_conflicts()?;
                (WipKind::Merge, conflicts)
            }
            None => (WipKind::Work, Vec::new()),
        };

        self.store.checkout_tree(wip.id, true)?;
        self.store.delete_line(&marker)?;
        for entry in &conflicts {
            self.store.add_conflict_entry(entry)?;
        }

        tracing::info!(
            line = %line,
            ?kind,
            conflicts = conflicts.len(),
            "restored work in progress"
        );
        Ok(Some(kind))
    }

    /// Whether `line` has work parked on its marker.
    #[must_use]
    pub fn is_parked(&self, line: &str) -> bool {
        self.store
            .line_exists(&self.settings.wip_suffix.marker_for(line))
    }

    fn resume_merge(&self, merge_head: Oid, wip_message: &str) -> Result<()> {
        MergeWorkflow::new(self.store, self.settings)
            .start_merge(merge_head, &merge_head.to_string())?;

        match wip_message.split_once('\n') {
            Some((_, pending)) => self.store.set_merge_message(pending)?,
            None => tracing::warn!(
                merge_head = %merge_head,
                "work-in-progress commit lost its merge message, keeping default"
            ),
        }
        Ok(())
    }

    fn commit(&self, message: &str, parents: &[Oid]) -> Result<Oid> {
        self.store.stage_all(&self.settings.ignore_patterns)?;
        let tree = self.store.write_tree()?;
        Ok(self.store.create_commit(message, tree, parents)?)
    }
}
