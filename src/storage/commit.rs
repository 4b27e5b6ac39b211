//! Commit helpers.
//!
//! gitsaga never records user work itself; it only needs an initial commit for
//! freshly initialized repositories and a signature for stash entries.

use git2::Repository;

use crate::storage::error::StorageResult;
use crate::storage::types::{CommitId, GitSignature};

/// Signature from the repository's `user.name`/`user.email`, falling back to
/// `fallback` when either is unset.
pub(crate) fn signature(
    repo: &Repository,
    fallback: &GitSignature,
) -> StorageResult<git2::Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(_) => Ok(fallback.to_git2_signature()?),
    }
}

/// Create an initial empty commit on HEAD.
pub(crate) fn create_initial_commit(
    repo: &Repository,
    fallback: &GitSignature,
) -> StorageResult<CommitId> {
    let sig = signature(repo, fallback)?;
    let tree_id = repo.index()?.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let oid = repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])?;
    Ok(CommitId::new(oid))
}
