//! Repository wrapper providing the line, commit and working-tree operations.

use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, ErrorCode, IndexAddOption, ObjectType, Oid, RepositoryState, ResetType, Signature,
    StatusOptions, StatusShow,
};

use crate::error::{Error, Result};

/// Identity used when neither metro nor git configure a committer.
const FALLBACK_NAME: &str = "Metro";
const FALLBACK_EMAIL: &str = "metro@localhost";

/// A local line (branch) and where it points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRef {
    /// Short branch name.
    pub name: String,
    /// Commit the line points at.
    pub target: Oid,
    /// Whether HEAD refers to this line.
    pub is_head: bool,
}

/// Summary of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit id.
    pub id: Oid,
    /// Full message, verbatim.
    pub message: String,
    /// First line of the message.
    pub summary: String,
    /// Parent ids in order.
    pub parents: Vec<Oid>,
    /// Commit time in seconds since the epoch.
    pub time: i64,
}

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
    identity: Option<(String, String)>,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::NotARepository
            } else {
                Error::Git2(e)
            }
        })?;
        Ok(Self {
            inner,
            identity: None,
        })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Initialize a new repository whose HEAD points at `initial_line`.
    ///
    /// The line itself is unborn until the first commit is created.
    ///
    /// # Errors
    /// Returns error if the repository cannot be created.
    pub fn init(path: impl AsRef<Path>, initial_line: &str) -> Result<Self> {
        let inner = git2::Repository::init(path)?;
        inner.set_head(&format!("refs/heads/{initial_line}"))?;
        tracing::debug!(line = initial_line, "initialized repository");
        Ok(Self {
            inner,
            identity: None,
        })
    }

    /// Use an explicit committer identity instead of the git configuration.
    #[must_use]
    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    /// Get the path to the repository root (workdir).
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Get the current repository state.
    #[must_use]
    pub fn state(&self) -> RepositoryState {
        self.inner.state()
    }

    // === Revisions ===

    /// Resolve any revision expression to a commit id.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the revision does not name a commit.
    pub fn resolve_revision(&self, rev: &str) -> Result<Oid> {
        let object = self.inner.revparse_single(rev).map_err(|e| {
            if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) {
                Error::RefNotFound(rev.into())
            } else {
                Error::Git2(e)
            }
        })?;
        Ok(object.peel_to_commit()?.id())
    }

    /// Get the commit HEAD points at.
    ///
    /// # Errors
    /// Returns error if HEAD is unborn.
    pub fn head_commit(&self) -> Result<Oid> {
        let head = self.inner.head().map_err(|e| {
            if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) {
                Error::RefNotFound("HEAD".into())
            } else {
                Error::Git2(e)
            }
        })?;
        Ok(head.peel_to_commit()?.id())
    }

    /// Point HEAD at a line without touching the working tree.
    ///
    /// # Errors
    /// Returns `BranchNotFound` if the line doesn't exist.
    pub fn set_head(&self, line: &str) -> Result<()> {
        if !self.line_exists(line) {
            return Err(Error::BranchNotFound(line.into()));
        }
        self.inner.set_head(&format!("refs/heads/{line}"))?;
        tracing::debug!(line, "moved HEAD");
        Ok(())
    }

    /// Load a commit's message, parents and time.
    ///
    /// # Errors
    /// Returns error if the commit cannot be found.
    pub fn commit_info(&self, oid: Oid) -> Result<CommitInfo> {
        let commit = self.inner.find_commit(oid)?;
        let message = commit.message().unwrap_or_default().to_string();
        Ok(CommitInfo {
            id: oid,
            summary: message.lines().next().unwrap_or_default().to_string(),
            message,
            parents: commit.parent_ids().collect(),
            time: commit.time().seconds(),
        })
    }

    // === Line operations ===

    /// List all local lines.
    ///
    /// # Errors
    /// Returns error if branch listing fails.
    pub fn lines(&self) -> Result<Vec<LineRef>> {
        let mut lines = Vec::new();
        for entry in self.inner.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()?.map(String::from) else {
                continue;
            };
            let Some(target) = branch.get().target() else {
                continue;
            };
            lines.push(LineRef {
                name,
                target,
                is_head: branch.is_head(),
            });
        }
        Ok(lines)
    }

    /// Get the commit a line points at.
    ///
    /// # Errors
    /// Returns error if the line doesn't exist.
    pub fn line_commit(&self, name: &str) -> Result<Oid> {
        let branch = self
            .inner
            .find_branch(name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(name.into()))?;

        branch
            .get()
            .target()
            .ok_or_else(|| Error::BranchNotFound(name.into()))
    }

    /// Check if a line exists.
    #[must_use]
    pub fn line_exists(&self, name: &str) -> bool {
        self.inner.find_branch(name, BranchType::Local).is_ok()
    }

    /// Create a new line pointing at `at`.
    ///
    /// # Errors
    /// Returns `BranchExists` if the name is taken.
    pub fn create_line(&self, name: &str, at: Oid) -> Result<()> {
        let commit = self.inner.find_commit(at)?;
        self.inner.branch(name, &commit, false).map_err(|e| {
            if e.code() == ErrorCode::Exists {
                Error::BranchExists(name.into())
            } else {
                Error::Git2(e)
            }
        })?;
        tracing::debug!(line = name, at = %at, "created line");
        Ok(())
    }

    /// Delete a local line.
    ///
    /// # Errors
    /// Returns error if the line doesn't exist or is checked out.
    pub fn delete_line(&self, name: &str) -> Result<()> {
        let mut branch = self
            .inner
            .find_branch(name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(name.into()))?;
        branch.delete()?;
        tracing::debug!(line = name, "deleted line");
        Ok(())
    }

    /// Move a line to point at a different commit.
    ///
    /// # Errors
    /// Returns error if the reference update fails.
    pub fn set_line_target(&self, name: &str, target: Oid) -> Result<()> {
        self.inner.reference(
            &format!("refs/heads/{name}"),
            target,
            true,
            &format!("metro: move {name} to {}", short_id(target)),
        )?;
        Ok(())
    }

    // === Commit operations ===

    /// Stage every file in the working tree that isn't ignored, including deletions.
    ///
    /// # Errors
    /// Returns error if the index cannot be updated.
    pub fn stage_all(&self, ignore_patterns: &[String]) -> Result<()> {
        self.install_ignore_rules(ignore_patterns)?;
        let mut index = self.inner.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Write the index out as a tree.
    ///
    /// # Errors
    /// Returns error if the index still holds conflicts.
    pub fn write_tree(&self) -> Result<Oid> {
        Ok(self.inner.index()?.write_tree()?)
    }

    /// Create a commit and advance HEAD (and the line it refers to) onto it.
    ///
    /// The first parent must be the current HEAD commit, if any.
    ///
    /// # Errors
    /// Returns error if the tree or parents cannot be found.
    pub fn create_commit(&self, message: &str, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        let sig = self.signature()?;
        let tree = self.inner.find_tree(tree)?;
        let parents = parents
            .iter()
            .map(|id| self.inner.find_commit(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?;
        tracing::debug!(commit = %oid, parents = parent_refs.len(), "created commit");
        Ok(oid)
    }

    /// Move HEAD's line to `target`, keeping index and working tree.
    ///
    /// # Errors
    /// Returns error if reset fails.
    pub fn reset_soft(&self, target: Oid) -> Result<()> {
        let object = self.inner.find_object(target, Some(ObjectType::Commit))?;
        self.inner.reset(&object, ResetType::Soft, None)?;
        Ok(())
    }

    /// Move HEAD's line to `target` and overwrite index and working tree.
    ///
    /// # Errors
    /// Returns error if reset fails.
    pub fn reset_hard(&self, target: Oid) -> Result<()> {
        let object = self.inner.find_object(target, Some(ObjectType::Commit))?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner
            .reset(&object, ResetType::Hard, Some(&mut checkout))?;
        Ok(())
    }

    // === Working directory state ===

    /// Write a commit's tree into the working directory without moving HEAD.
    ///
    /// # Errors
    /// Returns error if checkout fails (for a safe checkout, on local changes).
    pub fn checkout_tree(&self, commit: Oid, force: bool) -> Result<()> {
        let commit = self.inner.find_commit(commit)?;
        let mut checkout = CheckoutBuilder::new();
        if force {
            checkout.force();
        } else {
            checkout.safe();
        }
        self.inner
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        tracing::debug!(commit = %commit.id(), force, "checked out tree");
        Ok(())
    }

    /// Paths that differ between HEAD, the index and the working tree.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn changed_paths(&self, ignore_patterns: &[String]) -> Result<Vec<String>> {
        self.install_ignore_rules(ignore_patterns)?;
        let mut options = StatusOptions::new();
        options
            .show(StatusShow::IndexAndWorkdir)
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.inner.statuses(Some(&mut options))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(String::from))
            .collect())
    }

    /// Check if the working directory or index hold uncommitted work.
    ///
    /// # Errors
    /// Returns error if status check fails.
    pub fn is_dirty(&self, ignore_patterns: &[String]) -> Result<bool> {
        Ok(!self.changed_paths(ignore_patterns)?.is_empty())
    }

    fn install_ignore_rules(&self, patterns: &[String]) -> Result<()> {
        if !patterns.is_empty() {
            self.inner.add_ignore_rule(&patterns.join("\n"))?;
        }
        Ok(())
    }

    // === Signature ===

    /// Get the signature for new commits.
    ///
    /// # Errors
    /// Returns error if the configured identity is malformed.
    pub fn signature(&self) -> Result<Signature<'static>> {
        if let Some((name, email)) = &self.identity {
            return Ok(Signature::now(name, email)?);
        }
        match self.inner.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?),
        }
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}

/// Abbreviated commit id for messages.
pub(crate) fn short_id(oid: Oid) -> String {
    let mut id = oid.to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_test_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path(), "master")
            .unwrap()
            .with_identity("Test User", "test@example.com");

        fs::write(temp.path().join("a.txt"), "1").unwrap();
        repo.stage_all(&[]).unwrap();
        let tree = repo.write_tree().unwrap();
        repo.create_commit("Initial commit", tree, &[]).unwrap();

        (temp, repo)
    }

    fn commit_file(temp: &TempDir, repo: &Repository, file: &str, content: &str) -> Oid {
        fs::write(temp.path().join(file), content).unwrap();
        repo.stage_all(&[]).unwrap();
        let tree = repo.write_tree().unwrap();
        let head = repo.head_commit().unwrap();
        repo.create_commit(&format!("edit {file}"), tree, &[head])
            .unwrap()
    }

    #[test]
    fn test_init_points_head_at_initial_line() {
        let (_temp, repo) = init_test_repo();
        let lines = repo.lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "master");
        assert!(lines[0].is_head);
    }

    #[test]
    fn test_create_line_and_set_head() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap();

        repo.create_line("feature/test", head).unwrap();
        assert!(repo.line_exists("feature/test"));
        assert_eq!(repo.line_commit("feature/test").unwrap(), head);

        repo.set_head("feature/test").unwrap();
        let current: Vec<_> = repo
            .lines()
            .unwrap()
            .into_iter()
            .filter(|l| l.is_head)
            .collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "feature/test");
    }

    #[test]
    fn test_create_line_twice_is_typed_error() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap();
        repo.create_line("dup", head).unwrap();

        let err = repo.create_line("dup", head).unwrap_err();
        assert!(matches!(err, Error::BranchExists(name) if name == "dup"));
    }

    #[test]
    fn test_missing_line_is_typed_error() {
        let (_temp, repo) = init_test_repo();
        assert!(matches!(
            repo.line_commit("nope").unwrap_err(),
            Error::BranchNotFound(_)
        ));
        assert!(matches!(
            repo.set_head("nope").unwrap_err(),
            Error::BranchNotFound(_)
        ));
        assert!(matches!(
            repo.resolve_revision("nope").unwrap_err(),
            Error::RefNotFound(_)
        ));
    }

    #[test]
    fn test_is_dirty_tracks_untracked_and_ignore_rules() {
        let (temp, repo) = init_test_repo();
        assert!(!repo.is_dirty(&[]).unwrap());

        fs::write(temp.path().join("scratch.log"), "noise").unwrap();
        assert!(repo.is_dirty(&[]).unwrap());
        assert!(!repo.is_dirty(&["*.log".to_string()]).unwrap());
    }

    #[test]
    fn test_stage_all_records_deletions() {
        let (temp, repo) = init_test_repo();
        commit_file(&temp, &repo, "b.txt", "b");

        fs::remove_file(temp.path().join("b.txt")).unwrap();
        repo.stage_all(&[]).unwrap();
        let tree = repo.write_tree().unwrap();
        let tree = repo.inner().find_tree(tree).unwrap();
        assert!(tree.get_name("b.txt").is_none());
        assert!(tree.get_name("a.txt").is_some());
    }

    #[test]
    fn test_commit_info_keeps_message_verbatim() {
        let (_temp, repo) = init_test_repo();
        let head = repo.head_commit().unwrap();
        let tree = repo.write_tree().unwrap();
        let oid = repo
            .create_commit("WIP\nAbsorbed feature\n", tree, &[head])
            .unwrap();

        let info = repo.commit_info(oid).unwrap();
        assert_eq!(info.message, "WIP\nAbsorbed feature\n");
        assert_eq!(info.summary, "WIP");
        assert_eq!(info.parents, vec![head]);
    }

    #[test]
    fn test_checkout_tree_force_restores_content() {
        let (temp, repo) = init_test_repo();
        let first = repo.head_commit().unwrap();
        commit_file(&temp, &repo, "a.txt", "2");

        repo.checkout_tree(first, true).unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "1");
    }

    #[test]
    fn test_reset_soft_keeps_working_tree() {
        let (temp, repo) = init_test_repo();
        let first = repo.head_commit().unwrap();
        commit_file(&temp, &repo, "a.txt", "2");

        repo.reset_soft(first).unwrap();
        assert_eq!(repo.head_commit().unwrap(), first);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "2");
    }
}
