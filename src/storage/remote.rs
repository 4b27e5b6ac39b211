//! Fetching from remotes and moving branches forward or back.
//!
//! Only fast-forward updates are supported. Anything that would need a merge
//! commit is reported as [`StorageError::NonFastForward`] and left to the user.

use git2::build::CheckoutBuilder;
use git2::{Repository, ResetType};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::refs::{checkout_error, settle_tree, RefManager};
use crate::storage::types::{BranchName, CommitId, FastForward, HeadState};

/// Fetch `branch` from `remote` into its remote-tracking ref.
///
/// Returns the commit the remote-tracking ref points at afterwards.
pub(crate) fn fetch(repo: &Repository, remote: &str, branch: &BranchName) -> StorageResult<CommitId> {
    let tracking = branch.remote_ref_path(remote);
    let refspec = format!("+{}:{}", branch.as_ref_path(), tracking);

    {
        let mut handle = repo
            .find_remote(remote)
            .map_err(|_| StorageError::RemoteNotFound(remote.to_string()))?;
        handle.fetch(&[refspec.as_str()], None, None)?;
    }

    let oid = repo
        .refname_to_id(&tracking)
        .map_err(|_| StorageError::RefNotFound(tracking.clone()))?;
    Ok(CommitId::new(oid))
}

fn is_checked_out(repo: &Repository, branch: &BranchName) -> StorageResult<bool> {
    match RefManager::head_state(repo) {
        Ok(HeadState::Branch(head)) => Ok(&head == branch),
        Ok(HeadState::Detached(_)) | Err(StorageError::EmptyRepository) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Fast-forward `branch` to `target`.
///
/// When the branch is checked out the working tree is updated first with a
/// safe checkout, so local changes that would be overwritten abort the update
/// before the ref moves.
pub(crate) fn fast_forward(
    repo: &Repository,
    branch: &BranchName,
    target: CommitId,
) -> StorageResult<FastForward> {
    let current = RefManager::resolve_branch(repo, branch)?;
    if current == target {
        return Ok(FastForward::UpToDate);
    }

    let base = repo.merge_base(current.raw(), target.raw())?;
    if base == target.raw() {
        // local branch is ahead
        return Ok(FastForward::UpToDate);
    }
    if base != current.raw() {
        return Err(StorageError::NonFastForward {
            branch: branch.to_string(),
        });
    }

    if is_checked_out(repo, branch)? {
        let commit = repo.find_commit(target.raw())?;
        let mut opts = CheckoutBuilder::new();
        opts.safe();
        repo.checkout_tree(commit.as_object(), Some(&mut opts))
            .map_err(|e| checkout_error(e, branch.as_str()))?;

        let moved = RefManager::update_branch(repo, branch, target);
        settle_tree(repo, moved, target, Some(current))?;
    } else {
        RefManager::update_branch(repo, branch, target)?;
    }

    Ok(FastForward::Advanced {
        from: current,
        to: target,
    })
}

/// Point `branch` back at `commit`.
///
/// A checked-out branch is hard reset, discarding working tree changes; any
/// other branch only has its ref moved.
pub(crate) fn reset_branch(repo: &Repository, branch: &BranchName, commit: CommitId) -> StorageResult<()> {
    if is_checked_out(repo, branch)? {
        let target = repo.find_commit(commit.raw())?;
        repo.reset(target.as_object(), ResetType::Hard, None)?;
        Ok(())
    } else {
        RefManager::update_branch(repo, branch, commit)
    }
}
