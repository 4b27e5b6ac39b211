//! gitsaga - reversible git and work-item workflows
//!
//! A workflow is an ordered list of steps, each of which knows how to apply
//! its change and how to undo it. Steps run in order; when one fails, the
//! steps that already succeeded are undone in reverse order, so a failed
//! "start a feature" leaves the working copy and the tracker as they were.
//!
//! # Example
//!
//! ```no_run
//! use gitsaga::storage::{BranchName, GitRepository};
//! use gitsaga::transaction::Plan;
//! use gitsaga::vcs::{CheckoutBranch, CreateBranch, StashChanges};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = GitRepository::discover(".")?;
//! let feature = BranchName::new("feature/login")?;
//!
//! Plan::new()
//!     .then(StashChanges::new(repo.clone(), "start feature/login"))
//!     .then(CreateBranch::new(repo.clone(), feature.clone(), Some(BranchName::main())))
//!     .then(CheckoutBranch::new(repo, feature))
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod storage;
pub mod tracker;
pub mod transaction;
pub mod vcs;
pub mod workflow;
