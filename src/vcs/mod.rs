//! Version-control steps.
//!
//! Each type here is a [`Transaction`](crate::transaction::Transaction) over a
//! local working copy. The blocking git2 work runs through
//! [`GitRepository::blocking`](crate::storage::GitRepository::blocking), so a
//! step suspends while git touches the disk or the network.
//!
//! | step             | commit                         | rollback                      |
//! |------------------|--------------------------------|-------------------------------|
//! | `StashChanges`   | stash tracked + untracked      | pop that exact stash entry    |
//! | `CheckoutBranch` | switch to a branch             | switch back to previous HEAD  |
//! | `CreateBranch`   | create a branch                | delete it                     |
//! | `PullBranch`     | fetch + fast-forward           | reset to the old commit       |

mod branch;
mod checkout;
mod pull;
mod stash;

pub use branch::CreateBranch;
pub use checkout::CheckoutBranch;
pub use pull::PullBranch;
pub use stash::StashChanges;

use crate::storage::StorageError;
use crate::transaction::StepError;

fn storage_failure(action: impl Into<String>, err: StorageError) -> StepError {
    StepError::with_source(action, err)
}
