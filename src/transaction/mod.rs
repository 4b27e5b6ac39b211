//! Reversible transactions and the compensating executor.
//!
//! A workflow is a [`Plan`]: an ordered list of [`Transaction`]s, each one an
//! externally visible effect that knows how to undo itself. The executor
//! commits them in order and, when one fails, rolls back the ones that
//! already committed in reverse order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        execute(plan)                        │
//! │   (commits in order, compensates in reverse on failure)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ Transaction │       │    Plan     │       │ Execution-  │
//!  │  (trait)    │       │ (ordered)   │       │   Error     │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitsaga::transaction::Plan;
//! use gitsaga::vcs::{CheckoutBranch, CreateBranch, StashChanges};
//!
//! let plan = Plan::new()
//!     .then(StashChanges::new(repo.clone(), "before feature"))
//!     .then(CreateBranch::new(repo.clone(), feature.clone(), None))
//!     .then(CheckoutBranch::new(repo.clone(), feature));
//!
//! match plan.execute().await {
//!     Ok(summary) => println!("{} steps done", summary.committed().len()),
//!     Err(err) if err.is_fully_compensated() => eprintln!("rolled back: {err}"),
//!     Err(err) => eprintln!("needs manual repair: {err}"),
//! }
//! ```

mod context;
mod error;
mod executor;

pub use context::{Transaction, TransactionId, TransactionInfo};
pub use error::{
    BoxError, CommitFailure, ExecutionError, FailureKind, RollbackFailure, StepError, StepResult,
};
pub use executor::{execute, ExecutionResult, ExecutionSummary, Plan};
