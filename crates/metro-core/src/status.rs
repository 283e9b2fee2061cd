//! Repository status report.

use chrono::{DateTime, Utc};
use metro_git::VersionStore;
use serde::Serialize;

use crate::config::Settings;
use crate::error::Result;
use crate::lines::{LineManager, LineSummary, current_line};

/// Snapshot of the repository as shown by `metro status`.
#[derive(Debug, Clone, Serialize)]
pub struct RepoStatus {
    pub line: String,
    pub head: String,
    pub summary: String,
    pub committed_at: DateTime<Utc>,
    /// Paths with uncommitted changes.
    pub changes: Vec<String>,
    /// Present while an absorb is waiting for `resolve`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeStatus>,
    pub lines: Vec<LineSummary>,
}

/// The merge in progress.
#[derive(Debug, Clone, Serialize)]
pub struct MergeStatus {
    pub merge_head: String,
    pub message: String,
    pub conflicts: Vec<String>,
}

impl RepoStatus {
    /// Collect the status of the repository.
    ///
    /// # Errors
    /// Returns `NoCurrentLine` if HEAD is not on a line.
    pub fn collect<S: VersionStore>(store: &S, settings: &Settings) -> Result<Self> {
        let line = current_line(store)?;
        let head = store.commit_info(store.head_commit()?)?;

        let merge = if store.is_merge_in_progress() {
            Some(MergeStatus {
                merge_head: store.merge_head()?.to_string(),
                message: store.merge_message().unwrap_or_default(),
                conflicts: store
                    .list_conflicts()?
                    .into_iter()
                    .map(|c| c.path)
                    .collect(),
            })
        } else {
            None
        };

        Ok(Self {
            line,
            head: head.id.to_string(),
            summary: head.summary,
            committed_at: DateTime::from_timestamp(head.time, 0).unwrap_or_default(),
            changes: store.changed_paths(&settings.ignore_patterns)?,
            merge,
            lines: LineManager::new(store, settings).list()?,
        })
    }

    /// Whether there is nothing uncommitted and no merge pending.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.merge.is_none()
    }
}
