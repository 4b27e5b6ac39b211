//!   Core Git repository wrapper.
//!
//!  This is the central component of the storage layer.  It wraps `git2::Repository`
//!   with thread-safe access and provides the high-level operations the
//!  workflow steps use.
//!
//! All other storage modules use this for Git access.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use git2::{Repository, RepositoryInitOptions};
use parking_lot::Mutex;

use crate::storage::commit;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::refs::RefManager;
use crate::storage::remote;
use crate::storage::stash;
use crate::storage::types::{BranchName, CommitId, FastForward, GitSignature, HeadState, StashId};

/// The main Git repository wrapper.
///
/// Clone this to share across threads - it uses Arc internally. Every call
/// takes the repository lock for its whole duration, so operations from
/// different clones never interleave.
#[derive(Clone)]
pub struct GitRepository {
    inner: Arc<GitRepositoryInner>,
}

struct GitRepositoryInner {
    repo: Mutex<Repository>,
    path: PathBuf,
    signature: GitSignature,
}

impl GitRepository {
    fn from_git2(repo: Repository, fallback_path: &Path) -> Self {
        let path = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| fallback_path.to_path_buf());

        Self {
            inner: Arc::new(GitRepositoryInner {
                repo: Mutex::new(repo),
                path,
                signature: GitSignature::gitsaga(),
            }),
        }
    }

    /// Open an existing repository whose working tree is at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|_| StorageError::NotInitialized(path.to_path_buf()))?;
        Ok(Self::from_git2(repo, path))
    }

    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let repo =
            Repository::discover(path).map_err(|_| StorageError::NotInitialized(path.to_path_buf()))?;
        Ok(Self::from_git2(repo, path))
    }

    /// Initialize a new repository with an empty initial commit on `main`.
    pub fn init(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(BranchName::MAIN);
        let repo = Repository::init_opts(path, &opts)?;

        let storage = Self::from_git2(repo, path);

        storage.with_repo(|repo| {
            let commit_id = commit::create_initial_commit(repo, &storage.inner.signature)?;
            RefManager::init_main_branch(repo, commit_id)?;
            Ok(())
        })?;

        Ok(storage)
    }

    /// Get the working tree path.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Execute a function with exclusive access to the repository.
    pub fn with_repo<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Repository) -> StorageResult<T>,
    {
        let mut repo = self.inner.repo.lock();
        f(&mut repo)
    }

    /// Run `f` on tokio's blocking pool.
    ///
    /// git2 calls block on disk and network I/O; async callers go through
    /// here instead of calling the synchronous methods directly.
    pub async fn blocking<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&GitRepository) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let repo = self.clone();
        tokio::task::spawn_blocking(move || f(&repo))
            .await
            .map_err(|e| StorageError::Internal(format!("blocking git task failed: {}", e)))?
    }

    // ==================== HEAD ====================

    /// Get the commit HEAD points at.
    pub fn head(&self) -> StorageResult<CommitId> {
        self.with_repo(|repo| RefManager::head_commit(repo))
    }

    /// Describe where HEAD points.
    pub fn head_state(&self) -> StorageResult<HeadState> {
        self.with_repo(|repo| RefManager::head_state(repo))
    }

    /// The checked-out branch; fails on a detached HEAD.
    pub fn current_branch(&self) -> StorageResult<BranchName> {
        match self.head_state()? {
            HeadState::Branch(name) => Ok(name),
            HeadState::Detached(_) => Err(StorageError::DetachedHead),
        }
    }

    // ==================== Branch Operations ====================

    /// Get the commit ID for a branch.
    pub fn resolve_branch(&self, branch: &BranchName) -> StorageResult<CommitId> {
        self.with_repo(|repo| RefManager::resolve_branch(repo, branch))
    }

    /// Check if a branch exists.
    pub fn branch_exists(&self, branch: &BranchName) -> StorageResult<bool> {
        self.with_repo(|repo| Ok(RefManager::branch_exists(repo, branch)))
    }

    /// List all local branches.
    pub fn list_branches(&self) -> StorageResult<Vec<BranchName>> {
        self.with_repo(|repo| RefManager::list_branches(repo, None))
    }

    /// Create `branch` at the tip of `start`, or at HEAD when `start` is `None`.
    pub fn create_branch(&self, branch: &BranchName, start: Option<&BranchName>) -> StorageResult<CommitId> {
        self.with_repo(|repo| {
            let at = match start {
                Some(start) => RefManager::resolve_branch(repo, start)?,
                None => RefManager::head_commit(repo)?,
            };
            RefManager::create_branch(repo, branch, at)?;
            Ok(at)
        })
    }

    /// Delete a branch.
    pub fn delete_branch(&self, branch: &BranchName) -> StorageResult<()> {
        self.with_repo(|repo| RefManager::delete_branch(repo, branch))
    }

    /// Check out a branch.
    pub fn checkout_branch(&self, branch: &BranchName) -> StorageResult<()> {
        self.with_repo(|repo| RefManager::checkout_branch(repo, branch))
    }

    /// Check out whatever `head` describes.
    pub fn checkout(&self, head: &HeadState) -> StorageResult<()> {
        self.with_repo(|repo| match head {
            HeadState::Branch(branch) => RefManager::checkout_branch(repo, branch),
            HeadState::Detached(commit) => RefManager::checkout_detached(repo, *commit),
        })
    }

    // ==================== Working Tree ====================

    /// True if there are uncommitted or untracked changes.
    pub fn is_dirty(&self) -> StorageResult<bool> {
        self.with_repo(|repo| stash::is_dirty(repo))
    }

    /// Stash all local changes; `None` when the tree was clean.
    pub fn stash_save(&self, message: &str) -> StorageResult<Option<StashId>> {
        self.with_repo(|repo| stash::save(repo, &self.inner.signature, message))
    }

    /// Apply and drop a specific stash entry.
    pub fn stash_pop(&self, id: StashId) -> StorageResult<()> {
        self.with_repo(|repo| stash::pop(repo, id))
    }

    // ==================== Remote Operations ====================

    /// Fetch a branch from a remote; returns the fetched commit.
    pub fn fetch(&self, remote_name: &str, branch: &BranchName) -> StorageResult<CommitId> {
        self.with_repo(|repo| remote::fetch(repo, remote_name, branch))
    }

    /// Fast-forward a local branch to `target`.
    pub fn fast_forward(&self, branch: &BranchName, target: CommitId) -> StorageResult<FastForward> {
        self.with_repo(|repo| remote::fast_forward(repo, branch, target))
    }

    /// Move a branch back to `commit`, hard resetting if it is checked out.
    pub fn reset_branch(&self, branch: &BranchName, commit: CommitId) -> StorageResult<()> {
        self.with_repo(|repo| remote::reset_branch(repo, branch, commit))
    }
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("path", &self.inner.path)
            .finish()
    }
}
