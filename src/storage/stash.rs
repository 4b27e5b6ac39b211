//! Stash save and pop.
//!
//! Entries are tracked by [`StashId`] rather than by index: `stash@{0}` is only
//! ours until somebody else pushes another entry.

use git2::{ErrorCode, Repository, StashFlags, StatusOptions};

use crate::storage::commit;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{GitSignature, StashId};

/// True if the working tree or index has changes, untracked files included.
pub(crate) fn is_dirty(repo: &Repository) -> StorageResult<bool> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(!statuses.is_empty())
}

/// Stash tracked and untracked changes.
///
/// Returns `None` when there was nothing to stash.
pub(crate) fn save(
    repo: &mut Repository,
    fallback: &GitSignature,
    message: &str,
) -> StorageResult<Option<StashId>> {
    let sig = commit::signature(repo, fallback)?;
    match repo.stash_save(&sig, message, Some(StashFlags::INCLUDE_UNTRACKED)) {
        Ok(oid) => Ok(Some(StashId::new(oid))),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(StorageError::Git(e)),
    }
}

/// Find the current index of a stash entry.
pub(crate) fn position(repo: &mut Repository, id: StashId) -> StorageResult<Option<usize>> {
    let mut found = None;
    repo.stash_foreach(|index, _message, oid| {
        if *oid == id.raw() {
            found = Some(index);
            false
        } else {
            true
        }
    })?;
    Ok(found)
}

/// Apply a stash entry and drop it from the stash list.
pub(crate) fn pop(repo: &mut Repository, id: StashId) -> StorageResult<()> {
    let index = position(repo, id)?.ok_or_else(|| StorageError::StashNotFound(id.to_string()))?;

    repo.stash_pop(index, None).map_err(|e| match e.code() {
        ErrorCode::Conflict | ErrorCode::MergeConflict => StorageError::StashConflict(id.to_string()),
        _ => StorageError::Git(e),
    })
}
