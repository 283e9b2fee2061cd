//! Line manager: create, switch, delete and list lines.
//!
//! Switching wraps the checkout in a WIP save on the departing line and a
//! WIP restore on the arriving one, so dirty files and unresolved merges
//! travel with their line. The steps are not rolled back on failure: if the
//! save succeeds and the checkout fails, the marker stays behind and the
//! work can be recovered by switching back or by deleting the marker.

use metro_git::{Oid, VersionStore};
use serde::Serialize;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::line_name::LineName;
use crate::wip::{WipKind, WipStash};

/// A newly created line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub name: LineName,
    pub head: Oid,
}

/// A user line as shown by `metro lines` and `metro status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    pub name: String,
    pub head: String,
    pub is_current: bool,
    /// Work is parked on this line's marker.
    pub has_wip: bool,
}

/// What a switch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub from: String,
    pub to: String,
    /// Work parked on the departing line.
    pub saved: Option<WipKind>,
    /// Work brought back on the arriving line.
    pub restored: Option<WipKind>,
}

impl SwitchOutcome {
    /// The target was already the current line.
    #[must_use]
    pub fn was_current(&self) -> bool {
        self.from == self.to
    }
}

/// What a delete removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub name: String,
    /// The line's parked work was removed with it.
    pub removed_wip: bool,
}

/// The line HEAD refers to.
///
/// # Errors
/// Returns `NoCurrentLine` if HEAD is detached or unborn.
pub fn current_line<S: VersionStore>(store: &S) -> Result<String> {
    store
        .lines()?
        .into_iter()
        .find(|line| line.is_head)
        .map(|line| line.name)
        .ok_or(Error::NoCurrentLine)
}

/// Service for line operations with trait-based dependencies.
pub struct LineManager<'a, S: VersionStore> {
    store: &'a S,
    settings: &'a Settings,
}

impl<'a, S: VersionStore> LineManager<'a, S> {
    /// Create a new line manager.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// The current line's name.
    ///
    /// # Errors
    /// Returns `NoCurrentLine` if HEAD is not on a line.
    pub fn current(&self) -> Result<String> {
        current_line(self.store)
    }

    /// Create a line at the current head. The current line does not change.
    ///
    /// # Errors
    /// Returns `InvalidName` for reserved or malformed names and
    /// `AlreadyExists` if the name is taken.
    pub fn create(&self, name: &str) -> Result<Line> {
        let name = LineName::for_user(name, &self.settings.wip_suffix)?;
        if self.store.line_exists(&name) {
            return Err(Error::AlreadyExists(name.into_inner()));
        }

        let head = self.store.head_commit()?;
        self.store.create_line(&name, head).map_err(|e| match e {
            metro_git::Error::BranchExists(name) => Error::AlreadyExists(name),
            other => other.into(),
        })?;
        tracing::info!(line = %name, at = %head, "created line");
        Ok(Line { name, head })
    }

    /// Make `name` the current line, carrying uncommitted work and any
    /// unresolved merge along with the line they belong to.
    ///
    /// # Errors
    /// Returns `InvalidName` for marker names and `NoSuchLine` for unknown lines.
    pub fn switch(&self, name: &str) -> Result<SwitchOutcome> {
        self.settings.wip_suffix.ensure_not_reserved(name)?;
        if !self.store.line_exists(name) {
            return Err(Error::NoSuchLine(name.to_string()));
        }

        let from = current_line(self.store)?;
        if from == name {
            tracing::debug!(line = name, "already on line");
            return Ok(SwitchOutcome {
                from,
                to: name.to_string(),
                saved: None,
                restored: None,
            });
        }

        let stash = WipStash::new(self.store, self.settings);
        let saved = stash.save()?;

        let target = self.store.line_commit(name)?;
        self.store.checkout_tree(target, true)?;
        self.store.set_head(name)?;
        tracing::info!(from = %from, to = name, "switched line");

        let restored = stash.restore()?;
        Ok(SwitchOutcome {
            from,
            to: name.to_string(),
            saved,
            restored,
        })
    }

    /// Delete a line and any work parked on it.
    ///
    /// Marker names are accepted too, which discards parked work by hand.
    ///
    /// # Errors
    /// Returns `CannotDeleteCurrent` for the current line and `NoSuchLine`
    /// for unknown names.
    pub fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let current = current_line(self.store)?;
        if name == current {
            return Err(Error::CannotDeleteCurrent(name.to_string()));
        }
        if !self.store.line_exists(name) {
            return Err(Error::NoSuchLine(name.to_string()));
        }

        self.store.delete_line(name)?;

        let suffix = &self.settings.wip_suffix;
        let mut removed_wip = false;
        if !suffix.is_marker(name) {
            let marker = suffix.marker_for(name);
            if self.store.line_exists(&marker) {
                self.store.delete_line(&marker)?;
                removed_wip = true;
            }
        }
        tracing::info!(line = name, removed_wip, "deleted line");

        Ok(DeleteOutcome {
            name: name.to_string(),
            removed_wip,
        })
    }

    /// User lines sorted by name, markers folded into their line's `has_wip`.
    ///
    /// # Errors
    /// Returns error if the lines cannot be read.
    pub fn list(&self) -> Result<Vec<LineSummary>> {
        let suffix = &self.settings.wip_suffix;
        let all = self.store.lines()?;

        let mut lines: Vec<LineSummary> = all
            .iter()
            .filter(|line| !suffix.is_marker(&line.name))
            .map(|line| LineSummary {
                name: line.name.clone(),
                head: line.target.to_string(),
                is_current: line.is_head,
                has_wip: all
                    .iter()
                    .any(|other| suffix.line_for(&other.name) == Some(line.name.as_str())),
            })
            .collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::merge::{AbsorbOutcome, MergeWorkflow};
    use crate::test_support::TestRepo;

    fn lines(t: &TestRepo) -> LineManager<'_, metro_git::Repository> {
        LineManager::new(&t.repo, &t.settings)
    }

    #[test]
    fn test_create_points_at_head_and_keeps_current() {
        let t = TestRepo::new();
        let line = lines(&t).create("feature").unwrap();

        assert_eq!(line.name, "feature");
        assert_eq!(line.head, t.head());
        assert_eq!(lines(&t).current().unwrap(), "master");
    }

    #[test]
    fn test_create_rejects_taken_and_malformed_names() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();

        assert!(matches!(
            lines(&t).create("feature"),
            Err(Error::AlreadyExists(name)) if name == "feature"
        ));
        assert!(matches!(
            lines(&t).create("bad name"),
            Err(Error::InvalidName { .. })
        ));
    }

    #[test]
    fn test_wip_suffix_rejected_by_create_switch_and_absorb() {
        let t = TestRepo::new();
        for err in [
            lines(&t).create("feature#wip").unwrap_err(),
            lines(&t).switch("master#wip").unwrap_err(),
            MergeWorkflow::new(&t.repo, &t.settings)
                .absorb("master#wip")
                .unwrap_err(),
        ] {
            assert!(matches!(err, Error::InvalidName { .. }), "{err}");
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_switch_to_unknown_line() {
        let t = TestRepo::new();
        assert!(matches!(
            lines(&t).switch("nope"),
            Err(Error::NoSuchLine(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_switch_moves_head_and_files() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        lines(&t).switch("feature").unwrap();
        t.commit("b.txt", "b", "add b");

        let outcome = lines(&t).switch("master").unwrap();
        assert_eq!(outcome.from, "feature");
        assert_eq!(outcome.to, "master");
        assert_eq!(lines(&t).current().unwrap(), "master");
        assert!(!t.exists("b.txt"));

        lines(&t).switch("feature").unwrap();
        assert_eq!(t.read("b.txt"), "b");
    }

    #[test]
    fn test_clean_switch_creates_no_marker() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();

        let outcome = lines(&t).switch("feature").unwrap();
        assert_eq!(outcome.saved, None);
        assert!(!t.has_line("master#wip"));

        lines(&t).switch("master").unwrap();
        assert!(!t.has_line("feature#wip"));
    }

    #[test]
    fn test_switch_to_current_is_noop() {
        let t = TestRepo::new();
        t.write("a.txt", "dirty");

        let outcome = lines(&t).switch("master").unwrap();
        assert!(outcome.was_current());
        assert!(!t.has_line("master#wip"));
        assert_eq!(t.read("a.txt"), "dirty");
    }

    #[test]
    fn test_dirty_switch_round_trip() {
        let t = TestRepo::new();
        t.commit("b.txt", "b", "add b");
        lines(&t).create("other").unwrap();
        t.write("a.txt", "edited");
        t.write("new.txt", "untracked");
        std::fs::remove_file(t.temp.path().join("b.txt")).unwrap();

        let away = lines(&t).switch("other").unwrap();
        assert_eq!(away.saved, Some(WipKind::Work));
        assert!(t.has_line("master#wip"));
        assert_eq!(t.read("a.txt"), "1");
        assert!(!t.exists("new.txt"));
        assert!(t.exists("b.txt"));

        let back = lines(&t).switch("master").unwrap();
        assert_eq!(back.restored, Some(WipKind::Work));
        assert_eq!(t.read("a.txt"), "edited");
        assert_eq!(t.read("new.txt"), "untracked");
        assert!(!t.exists("b.txt"));
        assert!(!t.has_line("master#wip"));
    }

    #[test]
    fn test_feature_edit_scenario() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        lines(&t).switch("feature").unwrap();
        t.write("a.txt", "2");

        lines(&t).switch("master").unwrap();
        assert_eq!(t.read("a.txt"), "1");
        assert!(!t.has_line("master#wip"));

        lines(&t).switch("feature").unwrap();
        assert_eq!(t.read("a.txt"), "2");
        assert!(!t.has_line("feature#wip"));
    }

    #[test]
    fn test_merge_preserving_switch_round_trip() {
        let t = TestRepo::new();
        let base = t.head();
        lines(&t).create("other").unwrap();
        t.commit("a.txt", "ours", "ours");
        lines(&t).switch("other").unwrap();
        t.commit("a.txt", "theirs", "theirs");
        lines(&t).switch("master").unwrap();
        assert_ne!(t.head(), base);

        let outcome = MergeWorkflow::new(&t.repo, &t.settings)
            .absorb("other")
            .unwrap();
        assert!(matches!(outcome, AbsorbOutcome::Conflicted { .. }));
        t.repo.set_merge_message("Absorbed other\n\nkept ours").unwrap();
        let message = t.repo.merge_message().unwrap();
        let merge_head = t.repo.merge_head().unwrap();
        let conflicts = t.repo.list_conflicts().unwrap();
        let on_disk = t.read("a.txt");

        let away = lines(&t).switch("other").unwrap();
        assert_eq!(away.saved, Some(WipKind::Merge));
        assert!(!t.repo.is_merge_in_progress());
        assert!(!t.repo.has_conflicts().unwrap());
        assert_eq!(t.read("a.txt"), "theirs");

        let back = lines(&t).switch("master").unwrap();
        assert_eq!(back.restored, Some(WipKind::Merge));
        assert!(t.repo.is_merge_in_progress());
        assert_eq!(t.repo.merge_head().unwrap(), merge_head);
        assert_eq!(t.repo.merge_message().unwrap(), message);
        assert_eq!(t.repo.list_conflicts().unwrap(), conflicts);
        assert_eq!(t.read("a.txt"), on_disk);
        assert!(!t.has_line("master#wip"));
    }

    #[test]
    fn test_detached_head_has_no_current_line() {
        let t = TestRepo::new();
        t.repo.inner().set_head_detached(t.head()).unwrap();

        let err = lines(&t).current().unwrap_err();
        assert!(matches!(err, Error::NoCurrentLine));
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(matches!(lines(&t).switch("master"), Err(Error::NoCurrentLine)));
    }

    #[test]
    fn test_interrupted_switch_leaves_marker_for_next_switch() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        t.write("a.txt", "dirty");

        // save succeeded, checkout of the target never happened
        WipStash::new(&t.repo, &t.settings).save().unwrap();
        assert!(t.has_line("master#wip"));
        assert_eq!(lines(&t).current().unwrap(), "master#wip");
        assert_eq!(t.read("a.txt"), "dirty");

        let outcome = lines(&t).switch("feature").unwrap();
        assert_eq!(outcome.saved, None);
        assert!(t.has_line("master#wip"));
        assert_eq!(t.read("a.txt"), "1");

        let back = lines(&t).switch("master").unwrap();
        assert_eq!(back.restored, Some(WipKind::Work));
        assert_eq!(t.read("a.txt"), "dirty");
        assert!(!t.has_line("master#wip"));
    }

    #[test]
    fn test_delete_current_line_fails() {
        let t = TestRepo::new();
        let err = lines(&t).delete("master").unwrap_err();
        assert!(matches!(err, Error::CannotDeleteCurrent(ref name) if name == "master"));
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(t.has_line("master"));
    }

    #[test]
    fn test_delete_line_removes_its_parked_work() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        lines(&t).switch("feature").unwrap();
        t.write("a.txt", "wip");
        lines(&t).switch("master").unwrap();
        assert!(t.has_line("feature#wip"));

        let outcome = lines(&t).delete("feature").unwrap();
        assert!(outcome.removed_wip);
        assert!(!t.has_line("feature"));
        assert!(!t.has_line("feature#wip"));
        assert!(matches!(
            lines(&t).delete("feature"),
            Err(Error::NoSuchLine(_))
        ));
    }

    #[test]
    fn test_delete_accepts_marker_name() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        t.write("a.txt", "wip");
        lines(&t).switch("feature").unwrap();

        let outcome = lines(&t).delete("master#wip").unwrap();
        assert!(!outcome.removed_wip);
        assert!(t.has_line("master"));
        assert!(!t.has_line("master#wip"));
    }

    #[test]
    fn test_list_folds_markers_into_lines() {
        let t = TestRepo::new();
        lines(&t).create("feature").unwrap();
        t.write("a.txt", "wip");
        lines(&t).switch("feature").unwrap();

        let listed = lines(&t).list().unwrap();
        let names: Vec<_> = listed.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["feature", "master"]);
        assert!(listed[0].is_current);
        assert!(!listed[0].has_wip);
        assert!(listed[1].has_wip);
    }
}
