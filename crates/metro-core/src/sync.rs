//! Sync engine: bring the remote's copy of the current line down.
//!
//! When both sides have new commits the local ones are moved to a side
//! line, the current line jumps to the remote head, and the caller picks
//! between absorbing the side line back in or leaving it parked.
//!
//! A dirty working tree is refused unless forced, not parked on a marker.
//! A marker holds a whole-tree snapshot, so restoring it after the line
//! moves would write the old files over whatever the remote changed.

use metro_git::{FetchCallbacks, MergeAnalysis, Oid, VersionStore};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::lines::current_line;
use crate::merge::{AbsorbOutcome, MergeWorkflow};

/// What to do with local commits after the line diverged from the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergedChoice {
    /// Merge the side line back into the current line.
    Absorb,
    /// Leave local work on the side line.
    Park,
}

/// Questions the sync engine needs answered while it runs.
pub trait SyncPrompt: FetchCallbacks {
    /// URL for `remote` when none is configured, or `None` to give up.
    fn remote_url(&mut self, remote: &str) -> Option<String>;

    /// Choose what happens to the local commits parked on `side_line`.
    fn diverged(&mut self, line: &str, side_line: &str) -> DivergedChoice;
}

/// Result of a downsync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownsyncOutcome {
    /// The remote had nothing new.
    UpToDate,
    /// The line was forced onto the remote head.
    Reset { to: Oid },
    /// The line moved forward to the remote head.
    FastForwarded { to: Oid },
    /// Local commits were absorbed on top of the remote head.
    Absorbed { side_line: String, commit: Oid },
    /// Absorbing local commits stopped on conflicts.
    Conflicted {
        side_line: String,
        conflicts: Vec<String>,
    },
    /// Local commits were left on the side line.
    Parked { side_line: String },
}

/// Service for remote integration.
pub struct SyncEngine<'a, S: VersionStore> {
    store: &'a S,
    settings: &'a Settings,
}

impl<'a, S: VersionStore> SyncEngine<'a, S> {
    /// Create a new sync engine.
    #[must_use]
    pub const fn new(store: &'a S, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Fetch the configured remote and integrate its copy of the current line.
    ///
    /// A `url` creates or repoints the remote. With `force` the line is
    /// reset onto the remote head, discarding local commits and changes.
    ///
    /// # Errors
    /// Returns `AlreadyMerging`, `UncommittedChanges` (unless forced),
    /// `RemoteNotConfigured`, `NoRemoteLine`, and `UnsupportedMerge` when the
    /// histories are unrelated.
    pub fn downsync<P: SyncPrompt>(
        &self,
        url: Option<&str>,
        force: bool,
        prompt: &mut P,
    ) -> Result<DownsyncOutcome> {
        let remote = self.settings.remote.as_str();
        let line = current_line(self.store)?;

        if self.store.is_merge_in_progress() {
            return Err(Error::AlreadyMerging);
        }
        if !force && self.store.is_dirty(&self.settings.ignore_patterns)? {
            return Err(Error::UncommittedChanges);
        }

        self.configure_remote(remote, url, prompt)?;
        self.store.fetch(remote, prompt)?;

        let theirs = self
            .store
            .remote_line_commit(remote, &line)
            .map_err(|_| Error::NoRemoteLine {
                remote: remote.to_string(),
                line: line.clone(),
            })?;
        let ours = self.store.head_commit()?;
        let analysis = self.store.merge_analysis(ours, theirs)?;
        tracing::debug!(line = %line, ?analysis, "compared with remote");

        if analysis == MergeAnalysis::UpToDate {
            return Ok(DownsyncOutcome::UpToDate);
        }

        if force {
            self.store.reset_hard(theirs)?;
            tracing::info!(line = %line, to = %theirs, "reset to remote");
            return Ok(DownsyncOutcome::Reset { to: theirs });
        }

        match analysis {
            MergeAnalysis::FastForward => {
                self.move_line(&line, theirs)?;
                tracing::info!(line = %line, to = %theirs, "fast-forwarded");
                Ok(DownsyncOutcome::FastForwarded { to: theirs })
            }
            MergeAnalysis::None => Err(Error::UnsupportedMerge(format!(
                "'{line}' shares no history with {remote}/{line}"
            ))),
            MergeAnalysis::Normal | MergeAnalysis::UpToDate => {
                self.integrate_diverged(&line, ours, theirs, prompt)
            }
        }
    }

    /// Push the current line.
    ///
    /// # Errors
    /// Always returns `UpsyncUnsupported`.
    #[allow(clippy::unused_self)]
    pub fn upsync(&self) -> Result<()> {
        Err(Error::UpsyncUnsupported)
    }

    fn configure_remote<P: SyncPrompt>(
        &self,
        remote: &str,
        url: Option<&str>,
        prompt: &mut P,
    ) -> Result<()> {
        if url.is_some() {
            self.store.ensure_remote(remote, url)?;
        } else if self.store.remote_url(remote).is_none() {
            let url = prompt
                .remote_url(remote)
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| Error::RemoteNotConfigured(remote.to_string()))?;
            self.store.ensure_remote(remote, Some(url.trim()))?;
        }
        Ok(())
    }

    fn integrate_diverged<P: SyncPrompt>(
        &self,
        line: &str,
        ours: Oid,
        theirs: Oid,
        prompt: &mut P,
    ) -> Result<DownsyncOutcome> {
        let side_line = self.side_line_name(line);
        self.store.create_line(&side_line, ours)?;
        self.move_line(line, theirs)?;
        tracing::info!(line, side_line = %side_line, "moved local commits aside");

        match prompt.diverged(line, &side_line) {
            DivergedChoice::Park => Ok(DownsyncOutcome::Parked { side_line }),
            DivergedChoice::Absorb => {
                match MergeWorkflow::new(self.store, self.settings).absorb(&side_line)? {
                    AbsorbOutcome::Absorbed { commit } => {
                        self.store.delete_line(&side_line)?;
                        Ok(DownsyncOutcome::Absorbed { side_line, commit })
                    }
                    AbsorbOutcome::Conflicted { conflicts } => {
                        self.store.delete_line(&side_line)?;
                        Ok(DownsyncOutcome::Conflicted {
                            side_line,
                            conflicts,
                        })
                    }
                }
            }
        }
    }

    /// Check out `target` and point the current line at it.
    fn move_line(&self, line: &str, target: Oid) -> Result<()> {
        self.store.checkout_tree(target, false)?;
        self.store.set_line_target(line, target)?;
        Ok(())
    }

    /// First free name of `<line>-local`, `<line>-local-2`, ...
    fn side_line_name(&self, line: &str) -> String {
        let base = format!("{line}-local");
        if !self.store.line_exists(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|name| !self.store.line_exists(name))
            .unwrap_or(base)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::checkpoint::CheckpointEngine;
    use crate::config::Settings;
    use crate::lines::LineManager;
    use crate::test_support::TestRepo;
    use metro_git::Repository;
    use std::fs;
    use tempfile::TempDir;

    struct Scripted {
        url: Option<String>,
        choice: DivergedChoice,
        asked_url: bool,
        diverged_with: Option<String>,
    }

    impl Scripted {
        fn choosing(choice: DivergedChoice) -> Self {
            Self {
                url: None,
                choice,
                asked_url: false,
                diverged_with: None,
            }
        }
    }

    impl FetchCallbacks for Scripted {}

    impl SyncPrompt for Scripted {
        fn remote_url(&mut self, _remote: &str) -> Option<String> {
            self.asked_url = true;
            self.url.clone()
        }

        fn diverged(&mut self, _line: &str, side_line: &str) -> DivergedChoice {
            self.diverged_with = Some(side_line.to_string());
            self.choice
        }
    }

    fn downsync(local: &TestRepo, prompt: &mut Scripted) -> Result<DownsyncOutcome> {
        SyncEngine::new(&local.repo, &local.settings).downsync(None, false, prompt)
    }

    #[test]
    fn test_up_to_date() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let mut prompt = Scripted::choosing(DivergedChoice::Park);

        assert_eq!(
            downsync(&local, &mut prompt).unwrap(),
            DownsyncOutcome::UpToDate
        );
        assert!(!prompt.asked_url);
    }

    #[test]
    fn test_fast_forward() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let remote_head = upstream.commit("a.txt", "2", "upstream edit");

        let outcome = downsync(&local, &mut Scripted::choosing(DivergedChoice::Park)).unwrap();

        assert_eq!(outcome, DownsyncOutcome::FastForwarded { to: remote_head });
        assert_eq!(local.repo.line_commit("master").unwrap(), remote_head);
        assert_eq!(local.read("a.txt"), "2");
        assert!(!local.repo.is_dirty(&[]).unwrap());
    }

    #[test]
    fn test_diverged_absorb_merges_side_line() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let remote_head = upstream.commit("b.txt", "remote", "remote work");
        let local_head = local.commit("c.txt", "local", "local work");
        let mut prompt = Scripted::choosing(DivergedChoice::Absorb);

        let outcome = downsync(&local, &mut prompt).unwrap();

        let DownsyncOutcome::Absorbed { side_line, commit } = outcome else {
            panic!("expected absorb, got {outcome:?}");
        };
        assert_eq!(side_line, "master-local");
        assert_eq!(prompt.diverged_with.as_deref(), Some("master-local"));
        assert!(!local.has_line("master-local"));

        let info = local.repo.commit_info(commit).unwrap();
        assert_eq!(info.parents, vec![remote_head, local_head]);
        assert_eq!(info.message, "Absorbed master-local");
        assert_eq!(local.read("b.txt"), "remote");
        assert_eq!(local.read("c.txt"), "local");
    }

    #[test]
    fn test_diverged_park_keeps_local_commits_aside() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let remote_head = upstream.commit("b.txt", "remote", "remote work");
        let local_head = local.commit("c.txt", "local", "local work");

        let outcome = downsync(&local, &mut Scripted::choosing(DivergedChoice::Park)).unwrap();

        assert_eq!(
            outcome,
            DownsyncOutcome::Parked {
                side_line: "master-local".into()
            }
        );
        assert_eq!(local.repo.line_commit("master").unwrap(), remote_head);
        assert_eq!(local.repo.line_commit("master-local").unwrap(), local_head);
        assert!(!local.exists("c.txt"));
        assert!(!local.repo.is_merge_in_progress());
    }

    #[test]
    fn test_diverged_conflict_leaves_merge_pending() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        upstream.commit("a.txt", "remote", "remote edit");
        local.commit("a.txt", "local", "local edit");

        let outcome = downsync(&local, &mut Scripted::choosing(DivergedChoice::Absorb)).unwrap();

        assert_eq!(
            outcome,
            DownsyncOutcome::Conflicted {
                side_line: "master-local".into(),
                conflicts: vec!["a.txt".into()],
            }
        );
        assert!(local.repo.is_merge_in_progress());
        assert!(local.repo.has_conflicts().unwrap());
        assert!(!local.has_line("master-local"));
        assert_eq!(
            local.repo.merge_message().unwrap(),
            "Absorbed master-local"
        );
    }

    #[test]
    fn test_side_line_name_skips_taken_names() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let head = local.head();
        local.repo.create_line("master-local", head).unwrap();
        upstream.commit("b.txt", "remote", "remote work");
        local.commit("c.txt", "local", "local work");

        let outcome = downsync(&local, &mut Scripted::choosing(DivergedChoice::Park)).unwrap();
        assert_eq!(
            outcome,
            DownsyncOutcome::Parked {
                side_line: "master-local-2".into()
            }
        );
    }

    #[test]
    fn test_force_resets_onto_remote() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let remote_head = upstream.commit("b.txt", "remote", "remote work");
        local.commit("c.txt", "local", "local work");
        local.write("a.txt", "dirty");

        let outcome = SyncEngine::new(&local.repo, &local.settings)
            .downsync(None, true, &mut Scripted::choosing(DivergedChoice::Park))
            .unwrap();

        assert_eq!(outcome, DownsyncOutcome::Reset { to: remote_head });
        assert_eq!(local.head(), remote_head);
        assert_eq!(local.read("a.txt"), "1");
        assert!(!local.exists("c.txt"));
    }

    #[test]
    fn test_refuses_dirty_tree_without_force() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        local.write("a.txt", "dirty");

        let err = downsync(&local, &mut Scripted::choosing(DivergedChoice::Park)).unwrap_err();
        assert!(matches!(err, Error::UncommittedChanges));
        assert_eq!(local.read("a.txt"), "dirty");
    }

    #[test]
    fn test_prompts_for_missing_remote() {
        let upstream = TestRepo::new();
        let mut local = TestRepo::clone_of(&upstream);
        local.settings.remote = "mirror".into();
        let engine = SyncEngine::new(&local.repo, &local.settings);

        let mut silent = Scripted::choosing(DivergedChoice::Park);
        let err = engine.downsync(None, false, &mut silent).unwrap_err();
        assert!(silent.asked_url);
        assert!(matches!(err, Error::RemoteNotConfigured(name) if name == "mirror"));

        let mut answering = Scripted::choosing(DivergedChoice::Park);
        answering.url = Some(upstream.temp.path().to_str().unwrap().to_string());
        assert_eq!(
            engine.downsync(None, false, &mut answering).unwrap(),
            DownsyncOutcome::UpToDate
        );
        assert!(local.repo.remote_url("mirror").is_some());
    }

    #[test]
    fn test_url_argument_configures_remote() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let other = TestRepo::clone_of(&upstream);
        let url = other.temp.path().to_str().unwrap();

        SyncEngine::new(&local.repo, &local.settings)
            .downsync(Some(url), false, &mut Scripted::choosing(DivergedChoice::Park))
            .unwrap();
        assert_eq!(local.repo.remote_url("origin").as_deref(), Some(url));
    }

    #[test]
    fn test_missing_remote_line() {
        let upstream = TestRepo::new();
        let local = TestRepo::clone_of(&upstream);
        let lines = LineManager::new(&local.repo, &local.settings);
        lines.create("feature").unwrap();
        lines.switch("feature").unwrap();

        let err = downsync(&local, &mut Scripted::choosing(DivergedChoice::Park)).unwrap_err();
        assert!(matches!(
            err,
            Error::NoRemoteLine { ref line, .. } if line == "feature"
        ));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unrelated_history_is_unsupported() {
        let upstream = TestRepo::new();
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path(), "master")
            .unwrap()
            .with_identity("Stranger", "stranger@example.com");
        let settings = Settings::default();
        fs::write(temp.path().join("unrelated.txt"), "x").unwrap();
        CheckpointEngine::new(&repo, &settings)
            .initial("Create repository")
            .unwrap();

        let url = upstream.temp.path().to_str().unwrap();
        let err = SyncEngine::new(&repo, &settings)
            .downsync(Some(url), false, &mut Scripted::choosing(DivergedChoice::Park))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMerge(_)));
        assert_eq!(err.kind(), ErrorKind::UnsupportedMerge);
    }

    #[test]
    fn test_upsync_is_a_stub() {
        let t = TestRepo::new();
        assert!(matches!(
            SyncEngine::new(&t.repo, &t.settings).upsync(),
            Err(Error::UpsyncUnsupported)
        ));
    }
}
