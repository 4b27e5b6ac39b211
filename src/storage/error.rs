//! Storage layer error types
//!
//! All errors that can occur during git operations are defined here
//! We use `thiserror` for ergonomic error definition and better error messages

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::InvalidNameError;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// error from the underlying Git library
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// the specified branch/ref was not found
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// branch already exists
    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    /// the branch is checked out and cannot be deleted
    #[error("branch is checked out: {0}")]
    BranchCheckedOut(String),

    /// invalid branch name
    #[error("invalid branch name: {0}")]
    InvalidBranchName(#[from] InvalidNameError),

    /// local changes would be overwritten by a checkout
    #[error("checkout of {target} would overwrite local changes")]
    CheckoutConflict { target: String },

    /// the operation needs a branch but HEAD is detached
    #[error("HEAD is detached")]
    DetachedHead,

    /// repo is empty (no commits)
    #[error("repository is empty: no commits found")]
    EmptyRepository,

    /// repo is not initialized
    #[error("repository not initialized: {0}")]
    NotInitialized(PathBuf),

    /// the named remote is not configured
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// local and remote histories diverged
    #[error("cannot fast-forward {branch}: histories have diverged")]
    NonFastForward { branch: String },

    /// the stash entry is no longer in the stash list
    #[error("stash entry not found: {0}")]
    StashNotFound(String),

    /// applying a stash conflicted with the working tree
    #[error("stash {0} conflicts with the working tree")]
    StashConflict(String),

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::RefNotFound(_)
                | StorageError::RemoteNotFound(_)
                | StorageError::StashNotFound(_)
        )
    }

    /// check if this error is a conflict with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::BranchAlreadyExists(_)
                | StorageError::BranchCheckedOut(_)
                | StorageError::CheckoutConflict { .. }
                | StorageError::NonFastForward { .. }
                | StorageError::StashConflict(_)
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = StorageError::RefNotFound("feature".into());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_conflict());

        let conflict = StorageError::NonFastForward {
            branch: "main".into(),
        };
        assert!(!conflict.is_not_found());
        assert!(conflict.is_conflict());
        assert_eq!(
            conflict.to_string(),
            "cannot fast-forward main: histories have diverged"
        );
    }
}
