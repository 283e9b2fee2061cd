//! Checkpoint engine: snapshots the working tree onto the current line.

use metro_git::{Oid, VersionStore};

use crate::config::Settings;
use crate::error::{Error, Result};

/// Creates, amends and removes commits on the current line.
pub struct CheckpointEngine<'a, S: VersionStore> {
    store: &'a S,
    settings: &'a Settings,
}

impl<'a, S: VersionStore> CheckpointEngine<'a, S> {
    /// Create a new checkpoint engine.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Commit every non-ignored file with the current head as sole parent.
    ///
    /// # Errors
    /// Returns `EmptyMessage` for a blank message and `ConflictsPending`
    /// while a merge is in progress.
    pub fn checkpoint(&self, message: &str) -> Result<Oid> {
        ensure_message(message)?;
        self.ensure_not_merging()?;

        let head = self.store.head_commit()?;
        let oid = self.snapshot(message, &[head])?;
        tracing::info!(commit = %oid, "checkpoint");
        Ok(oid)
    }

    /// Commit the working tree as the first, parentless commit of a new repository.
    ///
    /// # Errors
    /// Returns error if the tree cannot be written.
    pub fn initial(&self, message: &str) -> Result<Oid> {
        ensure_message(message)?;
        let oid = self.snapshot(message, &[])?;
        tracing::info!(commit = %oid, "initial checkpoint");
        Ok(oid)
    }

    /// Replace the head commit with one holding the current work.
    ///
    /// The head's parents are kept, so merge commits stay merges. Without a
    /// message the head's own message is reused.
    ///
    /// # Errors
    /// Returns `ConflictsPending` while merging and `NoParent` on the first commit.
    pub fn patch(&self, message: Option<&str>) -> Result<Oid> {
        if let Some(message) = message {
            ensure_message(message)?;
        }
        self.ensure_not_merging()?;

        let head = self.store.commit_info(self.store.head_commit()?)?;
        let Some(&first_parent) = head.parents.first() else {
            return Err(Error::NoParent(head.id.to_string()));
        };
        let message = message.map_or(head.message, String::from);

        // step back first so HEAD's line moves from the parent onto the new commit
        self.store.reset_soft(first_parent)?;
        let oid = self.snapshot(&message, &head.parents)?;
        tracing::info!(replaced = %head.id, commit = %oid, "patched head");
        Ok(oid)
    }

    /// Move the current line back `count` first-parent steps, keeping the files.
    ///
    /// # Errors
    /// Returns `InvalidCount` for zero, `NoParent` when the history is too
    /// short, and `ConflictsPending` while merging.
    pub fn delete_commits(&self, count: usize) -> Result<Oid> {
        if count == 0 {
            return Err(Error::InvalidCount(count));
        }
        self.ensure_not_merging()?;

        let mut target = self.store.head_commit()?;
        for _ in 0..count {
            let info = self.store.commit_info(target)?;
            target = *info
                .parents
                .first()
                .ok_or_else(|| Error::NoParent(info.id.to_string()))?;
        }

        self.store.reset_soft(target)?;
        tracing::info!(count, head = %target, "deleted commits");
        Ok(target)
    }

    fn ensure_not_merging(&self) -> Result<()> {
        if self.store.is_merge_in_progress() || self.store.has_conflicts()? {
            return Err(Error::ConflictsPending);
        }
        Ok(())
    }

    fn snapshot(&self, message: &str, parents: &[Oid]) -> Result<Oid> {
        self.store.stage_all(&self.settings.ignore_patterns)?;
        let tree = self.store.write_tree()?;
        Ok(self.store.create_commit(message, tree, parents)?)
    }
}

fn ensure_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::EmptyMessage);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::merge::MergeWorkflow;
    use crate::test_support::TestRepo;

    #[test]
    fn test_checkpoint_advances_line_with_single_parent() {
        let t = TestRepo::new();
        let before = t.head();
        t.write("a.txt", "2");
        t.write("new.txt", "untracked");

        let oid = CheckpointEngine::new(&t.repo, &t.settings)
            .checkpoint("edit a")
            .unwrap();

        assert_eq!(t.head(), oid);
        assert_eq!(t.repo.line_commit("master").unwrap(), oid);
        let info = t.repo.commit_info(oid).unwrap();
        assert_eq!(info.parents, vec![before]);
        assert_eq!(info.message, "edit a");
        assert!(!t.repo.is_dirty(&[]).unwrap());
    }

    #[test]
    fn test_checkpoint_rejects_blank_message() {
        let t = TestRepo::new();
        let engine = CheckpointEngine::new(&t.repo, &t.settings);
        assert!(matches!(engine.checkpoint("  \n"), Err(Error::EmptyMessage)));
    }

    #[test]
    fn test_checkpoint_skips_ignored_files() {
        let mut t = TestRepo::new();
        t.settings.ignore_patterns = vec!["*.log".into()];
        t.write("debug.log", "noise");
        t.write("a.txt", "2");

        let oid = CheckpointEngine::new(&t.repo, &t.settings)
            .checkpoint("edit")
            .unwrap();

        let tree = t.repo.inner().find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_name("debug.log").is_none());
        assert!(tree.get_name("a.txt").is_some());
    }

    #[test]
    fn test_checkpoint_refuses_while_conflicted() {
        let t = TestRepo::new();
        let base = t.head();
        t.repo.create_line("other", base).unwrap();
        t.commit("a.txt", "ours", "ours");
        t.repo.set_head("other").unwrap();
        t.repo.checkout_tree(base, true).unwrap();
        t.commit("a.txt", "theirs", "theirs");
        t.repo.set_head("master").unwrap();
        t.repo
            .checkout_tree(t.repo.line_commit("master").unwrap(), true)
            .unwrap();

        MergeWorkflow::new(&t.repo, &t.settings)
            .absorb("other")
            .unwrap();

        let engine = CheckpointEngine::new(&t.repo, &t.settings);
        assert!(matches!(
            engine.checkpoint("too early"),
            Err(Error::ConflictsPending)
        ));
        assert!(matches!(engine.patch(None), Err(Error::ConflictsPending)));
    }

    #[test]
    fn test_patch_replaces_head_keeping_message() {
        let t = TestRepo::new();
        let root = t.head();
        let first = t.commit("b.txt", "b", "add b");
        t.write("b.txt", "b2");

        let patched = CheckpointEngine::new(&t.repo, &t.settings)
            .patch(None)
            .unwrap();

        assert_ne!(patched, first);
        let info = t.repo.commit_info(patched).unwrap();
        assert_eq!(info.message, "add b");
        assert_eq!(info.parents, vec![root]);
        assert_eq!(t.repo.line_commit("master").unwrap(), patched);
    }

    #[test]
    fn test_patch_with_new_message_and_root_guard() {
        let t = TestRepo::new();
        let engine = CheckpointEngine::new(&t.repo, &t.settings);
        assert!(matches!(engine.patch(None), Err(Error::NoParent(_))));

        t.commit("b.txt", "b", "add b");
        let patched = engine.patch(Some("add b properly")).unwrap();
        assert_eq!(
            t.repo.commit_info(patched).unwrap().message,
            "add b properly"
        );
        assert!(matches!(engine.patch(Some("")), Err(Error::EmptyMessage)));
    }

    #[test]
    fn test_delete_commits_keeps_working_tree() {
        let t = TestRepo::new();
        let root = t.head();
        t.commit("a.txt", "2", "two");
        t.commit("a.txt", "3", "three");

        let engine = CheckpointEngine::new(&t.repo, &t.settings);
        let head = engine.delete_commits(2).unwrap();

        assert_eq!(head, root);
        assert_eq!(t.repo.line_commit("master").unwrap(), root);
        assert_eq!(t.read("a.txt"), "3");
        assert!(t.repo.is_dirty(&[]).unwrap());
    }

    #[test]
    fn test_delete_commits_bounds() {
        let t = TestRepo::new();
        let engine = CheckpointEngine::new(&t.repo, &t.settings);
        let root = t.head();

        assert!(matches!(engine.delete_commits(0), Err(Error::InvalidCount(0))));
        assert!(matches!(engine.delete_commits(1), Err(Error::NoParent(_))));
        assert_eq!(t.head(), root);
    }
}
