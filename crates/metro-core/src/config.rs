//! Configuration management for Metro.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::line_name::{DEFAULT_WIP_SUFFIX, WipSuffix};

/// Directory under the git dir holding metro's files.
const METRO_DIR: &str = "metro";
const CONFIG_FILE: &str = "config.toml";

/// Metro configuration loaded from .git/metro/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Commit identity.
    #[serde(default)]
    pub user: UserConfig,
}

impl Config {
    /// Location of the config file for a repository.
    #[must_use]
    pub fn path_in(git_dir: &Path) -> PathBuf {
        git_dir.join(METRO_DIR).join(CONFIG_FILE)
    }

    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save config to a TOML file, creating its directory.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| std::io::Error::other(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// General Metro settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Suffix naming work-in-progress markers.
    #[serde(default = "default_wip_suffix")]
    pub wip_suffix: String,

    /// Remote used by sync.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Files in the working tree listing extra ignore patterns.
    #[serde(default = "default_ignore_files")]
    pub ignore_files: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            wip_suffix: default_wip_suffix(),
            remote: default_remote(),
            ignore_files: default_ignore_files(),
        }
    }
}

fn default_wip_suffix() -> String {
    DEFAULT_WIP_SUFFIX.into()
}

fn default_remote() -> String {
    "origin".into()
}

fn default_ignore_files() -> Vec<String> {
    vec![".metroignore".into()]
}

/// Identity recorded on new commits. Unset fields fall back to git's config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserConfig {
    /// Name and email when both are set.
    #[must_use]
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => Some((name, email)),
            _ => None,
        }
    }
}

/// Runtime view of the configuration handed to the engines.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Reserved marker suffix.
    pub wip_suffix: WipSuffix,
    /// Remote used by sync.
    pub remote: String,
    /// Ignore patterns applied on top of `.gitignore`.
    pub ignore_patterns: Vec<String>,
}

impl Settings {
    /// Resolve a config against a working directory, reading its ignore files.
    ///
    /// # Errors
    /// Returns error if the suffix is invalid or an ignore file can't be read.
    pub fn resolve(config: &Config, workdir: Option<&Path>) -> Result<Self> {
        let mut ignore_patterns = Vec::new();
        if let Some(workdir) = workdir {
            for file in &config.general.ignore_files {
                let path = workdir.join(file);
                if path.is_file() {
                    ignore_patterns.extend(read_ignore_file(&path)?);
                }
            }
        }
        tracing::debug!(patterns = ignore_patterns.len(), "resolved settings");

        Ok(Self {
            wip_suffix: WipSuffix::new(config.general.wip_suffix.clone())?,
            remote: config.general.remote.clone(),
            ignore_patterns,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wip_suffix: WipSuffix::default(),
            remote: default_remote(),
            ignore_patterns: Vec::new(),
        }
    }
}

/// Patterns in an ignore file, skipping blanks and comments.
fn read_ignore_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
