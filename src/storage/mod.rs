//! storage layer for gitsaga
//!
//! this module provides a complete abstraction over git for the working copy
//! the workflow steps operate on. The upper layers (vcs transactions, workflow
//! builder) use this API and never touch git2 directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GitRepository                           │
//! │   (High-level API: HEAD, branches, stash, fetch/pull)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    refs     │       │    stash    │       │   remote    │
//!  │ (branches)  │       │ (worktree)  │       │ (fetch, ff) │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   commit    │
//!                        │ (signature) │
//!                        └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```ignore
//! use gitsaga::storage::{BranchName, GitRepository};
//!
//! let repo = GitRepository::discover(".")?;
//! let feature = BranchName::new("feature/login")?;
//!
//! let stash = repo.stash_save("before feature/login")?;
//! repo.create_branch(&feature, Some(&BranchName::main()))?;
//! repo.checkout_branch(&feature)?;
//! ```

mod commit;
mod error;
mod refs;
mod remote;
mod repository;
mod stash;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{StorageError, StorageResult};
pub use repository::GitRepository;
pub use types::{
    BranchName, CommitId, FastForward, GitSignature, HeadState, InvalidNameError, StashId,
};
