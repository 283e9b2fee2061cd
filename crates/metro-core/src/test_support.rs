//! Fixtures shared by the engine tests.

#![allow(clippy::unwrap_used)]

use std::fs;

use metro_git::{NoFetchCallbacks, Oid, Repository};
use tempfile::TempDir;

use crate::checkpoint::CheckpointEngine;
use crate::config::Settings;

/// A real repository on `master` holding one commit with `a.txt = "1"`.
pub struct TestRepo {
    pub temp: TempDir,
    pub repo: Repository,
    pub settings: Settings,
}

impl TestRepo {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path(), "master")
            .unwrap()
            .with_identity("Test User", "test@example.com");
        let settings = Settings::default();

        fs::write(temp.path().join("a.txt"), "1").unwrap();
        CheckpointEngine::new(&repo, &settings)
            .initial("Create repository")
            .unwrap();

        Self {
            temp,
            repo,
            settings,
        }
    }

    pub fn write(&self, file: &str, content: &str) {
        fs::write(self.temp.path().join(file), content).unwrap();
    }

    pub fn read(&self, file: &str) -> String {
        fs::read_to_string(self.temp.path().join(file)).unwrap()
    }

    pub fn exists(&self, file: &str) -> bool {
        self.temp.path().join(file).exists()
    }

    /// A repository whose `master` matches `upstream`'s, with `origin` pointing at it.
    pub fn clone_of(upstream: &Self) -> Self {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path(), "master")
            .unwrap()
            .with_identity("Other User", "other@example.com");

        let url = upstream.temp.path().to_str().unwrap();
        repo.ensure_remote("origin", Some(url)).unwrap();
        repo.fetch("origin", &mut NoFetchCallbacks).unwrap();
        let head = repo.remote_line_commit("origin", "master").unwrap();
        repo.set_line_target("master", head).unwrap();
        repo.checkout_tree(head, true).unwrap();

        Self {
            temp,
            repo,
            settings: Settings::default(),
        }
    }

    /// Write a file and checkpoint it on the current line.
    pub fn commit(&self, file: &str, content: &str, message: &str) -> Oid {
        self.write(file, content);
        CheckpointEngine::new(&self.repo, &self.settings)
            .checkpoint(message)
            .unwrap()
    }

    pub fn head(&self) -> Oid {
        self.repo.head_commit().unwrap()
    }

    pub fn has_line(&self, name: &str) -> bool {
        self.repo.line_exists(name)
    }
}
