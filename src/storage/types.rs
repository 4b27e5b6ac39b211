//! core type-safe wrappers around git primitives for the storage layer.

use std::fmt;
use std::fmt::Formatter;

use git2::Oid;
use serde::{Deserialize, Serialize};

/// This makes sure we don't accidentally pass a stash ID where a commit ID
/// is expected. The inner Oid is only accessible within the storage module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    /// raw Oid (for internal use only)
    pub(crate) fn raw(&self) -> Oid {
        self.0
    }

    /// parse CommitId from a hex string
    pub fn from_hex(hex: &str) -> Result<Self, git2::Error> {
        Oid::from_str(hex).map(CommitId)
    }

    /// short form of the commit ID
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a stash entry (the stash commit's Oid).
///
/// Stash indices shift whenever another entry is pushed or dropped, so we
/// keep the Oid and look the index up at pop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StashId(pub(crate) Oid);

impl StashId {
    pub(crate) fn new(oid: Oid) -> Self {
        Self(oid)
    }

    pub(crate) fn raw(&self) -> Oid {
        self.0
    }
}

impl fmt::Display for StashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated local branch name (short form, without `refs/heads/`).
///
/// Validation follows the parts of `git check-ref-format` that matter for
/// names typed by people or built from templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// the main branch name
    pub const MAIN: &'static str = "main";

    const FORBIDDEN: &'static [char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

    /// create a new BranchName
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        if name.len() > 255 {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        if name.starts_with('-') {
            return Err(InvalidNameError::InvalidStart('-'));
        }

        for (i, c) in name.chars().enumerate() {
            if c.is_control() || Self::FORBIDDEN.contains(&c) {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        if name.contains("..")
            || name.contains("//")
            || name.contains("@{")
            || name.ends_with('/')
            || name.starts_with('/')
            || name.ends_with('.')
            || name.ends_with(".lock")
            || name.split('/').any(|part| part.starts_with('.'))
        {
            return Err(InvalidNameError::InvalidPath(name.to_string()));
        }

        if name == "HEAD" || name == "@" {
            return Err(InvalidNameError::Reserved(name.to_string()));
        }

        Ok(())
    }

    /// create the main branch reference
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    /// get the full ref path (e.g., "refs/heads/main")
    pub fn as_ref_path(&self) -> String {
        format!("refs/heads/{}", self.0)
    }

    /// remote-tracking ref for this branch on `remote`
    pub fn remote_ref_path(&self, remote: &str) -> String {
        format!("refs/remotes/{}/{}", remote, self.0)
    }

    /// get the short name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is a symbolic ref to a local branch.
    Branch(BranchName),
    /// HEAD points directly at a commit.
    Detached(CommitId),
}

impl HeadState {
    /// The checked-out branch, if any.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            HeadState::Branch(name) => Some(name),
            HeadState::Detached(_) => None,
        }
    }
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadState::Branch(name) => write!(f, "{}", name),
            HeadState::Detached(commit) => write!(f, "detached at {}", commit.short()),
        }
    }
}

/// Outcome of fast-forwarding a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastForward {
    /// The branch already contained the target.
    UpToDate,
    /// The branch moved from `from` to `to`.
    Advanced { from: CommitId, to: CommitId },
}

/// git signature (author/committer info)
#[derive(Debug, Clone)]
pub struct GitSignature {
    pub name: String,
    pub email: String,
}

impl GitSignature {
    /// create a new signature
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// fallback signature when the repository has no user configured
    pub fn gitsaga() -> Self {
        Self::new("gitsaga", "gitsaga@localhost")
    }

    /// convert to git2::Signature
    pub(crate) fn to_git2_signature(&self) -> Result<git2::Signature<'static>, git2::Error> {
        git2::Signature::now(&self.name, &self.email)
    }
}

impl Default for GitSignature {
    fn default() -> Self {
        Self::gitsaga()
    }
}

/// error type for invalid branch names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidStart(char),
    InvalidCharacter { char: char, position: usize },
    Reserved(String),
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} characters", len),
            Self::InvalidStart(c) => write!(f, "name cannot start with '{}'", c),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character '{}' at position {}", char, position)
            }
            Self::Reserved(name) => write!(f, "'{}' is a reserved name", name),
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_valid() {
        assert!(BranchName::new("main").is_ok());
        assert!(BranchName::new("feature/login-form").is_ok());
        assert!(BranchName::new("users/alice/1234_fix").is_ok());
        assert!(BranchName::new("release-1.2").is_ok());
    }

    #[test]
    fn test_branch_name_invalid() {
        assert!(BranchName::new("").is_err());
        assert!(BranchName::new("-oops").is_err());
        assert!(BranchName::new("has space").is_err());
        assert!(BranchName::new("a..b").is_err());
        assert!(BranchName::new("feature/").is_err());
        assert!(BranchName::new("topic.lock").is_err());
        assert!(BranchName::new("feature/.hidden").is_err());
        assert!(BranchName::new("what?").is_err());
        assert!(BranchName::new("HEAD").is_err());
        assert_eq!(
            BranchName::new("a~1"),
            Err(InvalidNameError::InvalidCharacter { char: '~', position: 1 })
        );
    }

    #[test]
    fn test_branch_ref_paths() {
        let branch = BranchName::new("feature/x").unwrap();
        assert_eq!(branch.as_ref_path(), "refs/heads/feature/x");
        assert_eq!(branch.remote_ref_path("origin"), "refs/remotes/origin/feature/x");
        assert_eq!(BranchName::main().as_ref_path(), "refs/heads/main");
    }

    #[test]
    fn test_branch_name_deserialize_validates() {
        let ok: BranchName = serde_json::from_str("\"feature/a\"").unwrap();
        assert_eq!(ok.as_str(), "feature/a");
        assert!(serde_json::from_str::<BranchName>("\"bad name\"").is_err());
    }

    #[test]
    fn test_head_state_display() {
        let head = HeadState::Branch(BranchName::main());
        assert_eq!(head.to_string(), "main");
        assert_eq!(head.branch(), Some(&BranchName::main()));
    }
}
