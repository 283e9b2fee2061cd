//! Line name validation and the reserved work-in-progress suffix.
//!
//! [`LineName`] enforces git's ref naming rules and rejects characters that
//! would be dangerous if a name ever reached a shell. [`WipSuffix`] is the
//! configurable suffix that marks a parked work-in-progress snapshot; user
//! lines may never end with it.

use std::fmt;

use crate::error::{Error, Result};

/// Suffix used when none is configured.
pub const DEFAULT_WIP_SUFFIX: &str = "#wip";

/// A validated line name.
///
/// # Examples
///
/// ```
/// use metro_core::LineName;
///
/// assert!(LineName::new("feature/auth").is_ok());
/// assert!(LineName::new("../etc/passwd").is_err());
/// assert!(LineName::new("name;rm -rf").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineName(String);

impl LineName {
    /// Create a new validated line name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name violates git's ref
    /// naming rules or contains shell metacharacters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_line_name(&name)?;
        Ok(Self(name))
    }

    /// Validate a name a user asked for, which must also stay clear of
    /// the reserved suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] for reserved or malformed names.
    pub fn for_user(name: &str, suffix: &WipSuffix) -> Result<Self> {
        suffix.ensure_not_reserved(name)?;
        Self::new(name)
    }

    /// Get the line name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the `LineName` and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for LineName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for LineName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for LineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for LineName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LineName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The reserved suffix naming a line's work-in-progress marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipSuffix(String);

impl WipSuffix {
    /// Create a suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the suffix is blank or contains
    /// whitespace or a path separator.
    pub fn new(suffix: impl Into<String>) -> Result<Self> {
        let suffix = suffix.into();
        if suffix.trim().is_empty() {
            return Err(Error::invalid_name(&suffix, "wip suffix cannot be empty"));
        }
        if suffix.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(Error::invalid_name(
                &suffix,
                "wip suffix cannot contain whitespace or '/'",
            ));
        }
        Ok(Self(suffix))
    }

    /// The suffix text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker line name for `line`.
    #[must_use]
    pub fn marker_for(&self, line: &str) -> String {
        format!("{line}{}", self.0)
    }

    /// Whether `name` is a marker line.
    #[must_use]
    pub fn is_marker(&self, name: &str) -> bool {
        name.ends_with(&self.0)
    }

    /// The line a marker belongs to.
    #[must_use]
    pub fn line_for<'n>(&self, marker: &'n str) -> Option<&'n str> {
        marker.strip_suffix(self.0.as_str())
    }

    /// Reject names ending in the suffix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is reserved.
    pub fn ensure_not_reserved(&self, name: &str) -> Result<()> {
        if self.is_marker(name) {
            return Err(Error::invalid_name(
                name,
                format!("names ending in '{}' are reserved", self.0),
            ));
        }
        Ok(())
    }
}

impl Default for WipSuffix {
    fn default() -> Self {
        Self(DEFAULT_WIP_SUFFIX.to_string())
    }
}

impl fmt::Display for WipSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a line name against git rules and security constraints.
fn validate_line_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name(name, "line name cannot be empty"));
    }

    if name == "@" {
        return Err(Error::invalid_name(name, "line name cannot be '@'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(Error::invalid_name(
            name,
            "line name cannot start or end with '.'",
        ));
    }

    // git's rule is case-sensitive
    #[allow(clippy::case_sensitive_file_extension_comparisons)]
    if name.ends_with(".lock") {
        return Err(Error::invalid_name(name, "line name cannot end with '.lock'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::invalid_name(
            name,
            "line name cannot start or end with '/'",
        ));
    }

    for sequence in ["..", "//", "@{", "/."] {
        if name.contains(sequence) {
            return Err(Error::invalid_name(
                name,
                format!("line name cannot contain '{sequence}'"),
            ));
        }
    }

    for c in name.chars() {
        if c.is_ascii_control() {
            return Err(Error::invalid_name(
                name,
                "line name cannot contain control characters",
            ));
        }

        if matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[') {
            return Err(Error::invalid_name(
                name,
                format!("line name cannot contain '{c}'"),
            ));
        }

        if matches!(
            c,
            '$' | ';'
                | '|'
                | '&'
                | '>'
                | '<'
                | '`'
                | '\\'
                | '"'
                | '\''
                | '('
                | ')'
                | '{'
                | '}'
                | '!'
        ) {
            return Err(Error::invalid_name(
                name,
                format!("line name cannot contain shell metacharacter '{c}'"),
            ));
        }
    }

    Ok(())
}
