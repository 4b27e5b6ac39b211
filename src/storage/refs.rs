//!  Branch and reference management.
//!
//!  Git refs are pointers to commits.  This module handles:
//! - HEAD inspection (attached branch or detached commit)
//! - Local branch lifecycle (create, update, delete)
//! - Switching the working tree between branches
//!
//! Checkouts are always "safe": git refuses to overwrite local changes and we
//! surface that as [`StorageError::CheckoutConflict`] instead of forcing.

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, Repository};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BranchName, CommitId, HeadState};

/// Manages Git references (branches).
pub struct RefManager;

impl RefManager {
    /// Resolve a branch name to its current commit ID.
    pub fn resolve_branch(repo: &Repository, branch: &BranchName) -> StorageResult<CommitId> {
        let reference = repo
            .find_reference(&branch.as_ref_path())
            .map_err(|_| StorageError::RefNotFound(branch.to_string()))?;

        let commit = reference
            .peel_to_commit()
            .map_err(|_| StorageError::RefNotFound(branch.to_string()))?;

        Ok(CommitId::new(commit.id()))
    }

    /// Get the current HEAD commit.
    pub fn head_commit(repo: &Repository) -> StorageResult<CommitId> {
        let head = Self::head_reference(repo)?;
        let commit = head.peel_to_commit()?;
        Ok(CommitId::new(commit.id()))
    }

    /// Describe where HEAD points.
    pub fn head_state(repo: &Repository) -> StorageResult<HeadState> {
        let head = Self::head_reference(repo)?;

        if head.is_branch() {
            let name = head
                .shorthand()
                .ok_or_else(|| StorageError::Internal("branch name is not utf-8".into()))?;
            return Ok(HeadState::Branch(BranchName::new(name)?));
        }

        let commit = head.peel_to_commit()?;
        Ok(HeadState::Detached(CommitId::new(commit.id())))
    }

    fn head_reference(repo: &Repository) -> StorageResult<git2::Reference<'_>> {
        repo.head().map_err(|e| {
            if e.code() == ErrorCode::UnbornBranch {
                StorageError::EmptyRepository
            } else {
                StorageError::Git(e)
            }
        })
    }

    /// Check if a branch exists.
    pub fn branch_exists(repo: &Repository, branch: &BranchName) -> bool {
        repo.find_reference(&branch.as_ref_path()).is_ok()
    }

    /// Create a new branch pointing to the given commit.
    pub fn create_branch(repo: &Repository, branch: &BranchName, target: CommitId) -> StorageResult<()> {
        if Self::branch_exists(repo, branch) {
            return Err(StorageError::BranchAlreadyExists(branch.to_string()));
        }

        let commit = repo.find_commit(target.raw())?;
        repo.branch(branch.as_str(), &commit, false)?;

        Ok(())
    }

    /// Update a branch to point to a new commit.
    ///
    /// This only moves the ref; the working tree is left alone.
    pub fn update_branch(repo: &Repository, branch: &BranchName, target: CommitId) -> StorageResult<()> {
        let mut reference = repo
            .find_reference(&branch.as_ref_path())
            .map_err(|_| StorageError::RefNotFound(branch.to_string()))?;

        reference.set_target(target.raw(), &format!("gitsaga: move {} to {}", branch, target.short()))?;

        Ok(())
    }

    /// Delete a branch. Refuses to delete the checked-out branch.
    pub fn delete_branch(repo: &Repository, branch: &BranchName) -> StorageResult<()> {
        let mut git_branch = repo
            .find_branch(branch.as_str(), BranchType::Local)
            .map_err(|_| StorageError::RefNotFound(branch.to_string()))?;

        if git_branch.is_head() {
            return Err(StorageError::BranchCheckedOut(branch.to_string()));
        }

        git_branch.delete()?;

        Ok(())
    }

    /// List all local branches with an optional prefix filter.
    pub fn list_branches(repo: &Repository, prefix: Option<&str>) -> StorageResult<Vec<BranchName>> {
        let branches = repo.branches(Some(BranchType::Local))?;

        let mut result = Vec::new();
        for branch_result in branches {
            let (branch, _) = branch_result?;
            if let Some(name) = branch.name()? {
                let matches = match prefix {
                    Some(p) => name.starts_with(p),
                    None => true,
                };
                if matches {
                    if let Ok(branch_name) = BranchName::new(name) {
                        result.push(branch_name);
                    }
                }
            }
        }

        Ok(result)
    }

    /// Check out a local branch and attach HEAD to it.
    pub fn checkout_branch(repo: &Repository, branch: &BranchName) -> StorageResult<()> {
        let refname = branch.as_ref_path();
        let commit = repo
            .find_reference(&refname)
            .and_then(|reference| reference.peel_to_commit())
            .map_err(|_| StorageError::RefNotFound(branch.to_string()))?;

        let previous = Self::head_commit(repo).ok();
        let target = CommitId::new(commit.id());

        let mut opts = CheckoutBuilder::new();
        opts.safe();
        repo.checkout_tree(commit.as_object(), Some(&mut opts))
            .map_err(|e| checkout_error(e, branch.as_str()))?;

        let moved = repo.set_head(&refname).map_err(StorageError::from);
        settle_tree(repo, moved, target, previous)
    }

    /// Check out a commit with a detached HEAD.
    pub fn checkout_detached(repo: &Repository, commit: CommitId) -> StorageResult<()> {
        let target = repo.find_commit(commit.raw())?;
        let previous = Self::head_commit(repo).ok();

        let mut opts = CheckoutBuilder::new();
        opts.safe();
        repo.checkout_tree(target.as_object(), Some(&mut opts))
            .map_err(|e| checkout_error(e, &commit.short()))?;

        let moved = repo.set_head_detached(commit.raw()).map_err(StorageError::from);
        settle_tree(repo, moved, commit, previous)
    }

    /// Initialize the main branch if it doesn't exist.
    ///
    /// This should be called after creating the initial commit.
    /// Also ensures HEAD points to main.
    pub fn init_main_branch(repo: &Repository, initial_commit: CommitId) -> StorageResult<()> {
        let main = BranchName::main();

        if !Self::branch_exists(repo, &main) {
            Self::create_branch(repo, &main, initial_commit)?;
        }

        repo.set_head(&main.as_ref_path())?;

        Ok(())
    }
}

/// Put back the files a successful safe checkout of `applied` rewrote, leaving
/// the tree as it was at `previous`.
///
/// Only paths that differ between the two commits are touched. The safe
/// checkout refused to overwrite local changes, so none of those paths held
/// any and forcing them back loses nothing.
pub(crate) fn restore_tree(repo: &Repository, applied: CommitId, previous: CommitId) -> StorageResult<()> {
    if applied == previous {
        return Ok(());
    }

    let applied_tree = repo.find_commit(applied.raw())?.tree()?;
    let previous_commit = repo.find_commit(previous.raw())?;
    let previous_tree = previous_commit.tree()?;
    let diff = repo.diff_tree_to_tree(Some(&applied_tree), Some(&previous_tree), None)?;

    let mut opts = CheckoutBuilder::new();
    opts.force().remove_untracked(true).disable_pathspec_match(true);
    let mut changed = false;
    for delta in diff.deltas() {
        for path in [delta.old_file().path(), delta.new_file().path()].into_iter().flatten() {
            opts.path(path);
            changed = true;
        }
    }

    // with no paths a forced checkout would rewrite the whole tree
    if changed {
        repo.checkout_tree(previous_commit.as_object(), Some(&mut opts))?;
    }
    Ok(())
}

/// Finish a checkout whose tree is already at `applied`: when the ref write in
/// `moved` failed, restore the tree to `previous` and report the write error.
pub(crate) fn settle_tree(
    repo: &Repository,
    moved: StorageResult<()>,
    applied: CommitId,
    previous: Option<CommitId>,
) -> StorageResult<()> {
    let Err(err) = moved else {
        return Ok(());
    };
    if let Some(previous) = previous {
        if let Err(restore) = restore_tree(repo, applied, previous) {
            return Err(StorageError::Internal(format!(
                "{}; working tree left at {}: {}",
                err,
                applied.short(),
                restore
            )));
        }
    }
    Err(err)
}

pub(crate) fn checkout_error(err: git2::Error, target: &str) -> StorageError {
    if err.code() == ErrorCode::Conflict {
        StorageError::CheckoutConflict {
            target: target.to_string(),
        }
    } else {
        StorageError::Git(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing;

    #[test]
    fn test_head_commit_and_state() {
        let (_dir, repo) = testing::init_repo();
        repo.with_repo(|repo| {
            let head = RefManager::head_commit(repo)?;
            assert_eq!(RefManager::resolve_branch(repo, &BranchName::main())?, head);
            assert_eq!(
                RefManager::head_state(repo)?,
                HeadState::Branch(BranchName::main())
            );
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_branch_lifecycle() {
        let (_dir, repo) = testing::init_repo();
        repo.with_repo(|repo| {
            let base = RefManager::head_commit(repo)?;
            let branch = BranchName::new("feature")?;

            assert!(!RefManager::branch_exists(repo, &branch));
            RefManager::create_branch(repo, &branch, base)?;
            assert!(RefManager::branch_exists(repo, &branch));
            assert_eq!(RefManager::resolve_branch(repo, &branch)?, base);

            RefManager::delete_branch(repo, &branch)?;
            assert!(!RefManager::branch_exists(repo, &branch));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_branch_error() {
        let (_dir, repo) = testing::init_repo();
        let result = repo.with_repo(|repo| {
            let base = RefManager::head_commit(repo)?;
            let branch = BranchName::new("feature")?;
            RefManager::create_branch(repo, &branch, base)?;
            RefManager::create_branch(repo, &branch, base)
        });

        assert!(matches!(result, Err(StorageError::BranchAlreadyExists(_))));
    }

    #[test]
    fn test_cannot_delete_checked_out_branch() {
        let (_dir, repo) = testing::init_repo();
        let result = repo.with_repo(|repo| RefManager::delete_branch(repo, &BranchName::main()));
        assert!(matches!(result, Err(StorageError::BranchCheckedOut(_))));
    }

    #[test]
    fn test_checkout_and_detach() {
        let (_dir, repo) = testing::init_repo();
        let first = repo.head().unwrap();
        testing::write_file(&repo, "a.txt", "one");
        let second = testing::commit_all(&repo, "second");

        repo.with_repo(|repo| {
            let old = BranchName::new("old")?;
            RefManager::create_branch(repo, &old, first)?;
            RefManager::checkout_branch(repo, &old)?;
            assert_eq!(RefManager::head_state(repo)?, HeadState::Branch(old));
            assert!(!repo.workdir().unwrap().join("a.txt").exists());

            RefManager::checkout_detached(repo, second)?;
            assert_eq!(RefManager::head_state(repo)?, HeadState::Detached(second));
            assert!(repo.workdir().unwrap().join("a.txt").exists());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_checkout_refuses_to_clobber_changes() {
        let (_dir, repo) = testing::init_repo();
        let first = repo.head().unwrap();
        testing::write_file(&repo, "a.txt", "one");
        testing::commit_all(&repo, "second");
        testing::write_file(&repo, "a.txt", "local edit");

        let result = repo.with_repo(|repo| {
            let old = BranchName::new("old")?;
            RefManager::create_branch(repo, &old, first)?;
            RefManager::checkout_branch(repo, &old)
        });

        assert!(matches!(result, Err(StorageError::CheckoutConflict { .. })));
        assert_eq!(testing::read_file(&repo, "a.txt"), "local edit");
    }

    #[test]
    fn test_failed_head_write_restores_removed_files() {
        let (_dir, repo) = testing::init_repo();
        let first = repo.head().unwrap();
        testing::write_file(&repo, "a.txt", "one");
        testing::commit_all(&repo, "second");
        let old = BranchName::new("old").unwrap();
        repo.with_repo(|repo| RefManager::create_branch(repo, &old, first))
            .unwrap();

        testing::lock_ref(&repo, "HEAD");
        let err = repo.checkout_branch(&old).unwrap_err();

        assert!(matches!(err, StorageError::Git(_)));
        assert_eq!(repo.current_branch().unwrap(), BranchName::main());
        assert_eq!(testing::read_file(&repo, "a.txt"), "one");
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn test_failed_head_write_removes_added_files() {
        let (_dir, repo) = testing::init_repo();
        let first = repo.head().unwrap();
        testing::write_file(&repo, "nested/a.txt", "one");
        let second = testing::commit_all(&repo, "second");
        let old = BranchName::new("old").unwrap();
        repo.with_repo(|repo| RefManager::create_branch(repo, &old, first))
            .unwrap();
        repo.checkout_branch(&old).unwrap();

        testing::lock_ref(&repo, "HEAD");
        assert!(repo.checkout_branch(&BranchName::main()).is_err());
        assert!(repo.checkout(&HeadState::Detached(second)).is_err());

        assert_eq!(repo.current_branch().unwrap(), old);
        assert!(!testing::file_exists(&repo, "nested/a.txt"));
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn test_update_branch() {
        let (_dir, repo) = testing::init_repo();
        let first = repo.head().unwrap();
        testing::write_file(&repo, "a.txt", "one");
        let second = testing::commit_all(&repo, "second");

        repo.with_repo(|repo| {
            let branch = BranchName::new("topic")?;
            RefManager::create_branch(repo, &branch, first)?;
            RefManager::update_branch(repo, &branch, second)?;
            assert_eq!(RefManager::resolve_branch(repo, &branch)?, second);
            Ok(())
        })
        .unwrap();

        let missing = BranchName::new("missing").unwrap();
        let result = repo.with_repo(|repo| RefManager::update_branch(repo, &missing, second));
        assert!(matches!(result, Err(StorageError::RefNotFound(_))));
    }
}
