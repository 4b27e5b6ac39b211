//! Switching branches.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::storage::{BranchName, GitRepository, HeadState};
use crate::transaction::{StepError, StepResult, Transaction, TransactionInfo};
use crate::vcs::storage_failure;

/// Check out a branch; rollback returns HEAD to wherever it was before.
///
/// Both directions use a safe checkout, so local changes that would be
/// overwritten fail the step instead of being lost. Put a [`StashChanges`]
/// earlier in the plan when the tree may be dirty.
///
/// [`StashChanges`]: crate::vcs::StashChanges
#[derive(Debug)]
pub struct CheckoutBranch {
    info: TransactionInfo,
    repo: GitRepository,
    target: BranchName,
    previous: Option<HeadState>,
}

impl CheckoutBranch {
    /// Switch to `target`, an existing local branch.
    pub fn new(repo: GitRepository, target: BranchName) -> Self {
        Self {
            info: TransactionInfo::new(format!("checkout {}", target)),
            repo,
            target,
            previous: None,
        }
    }
}

#[async_trait]
impl Transaction for CheckoutBranch {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let target = self.target.clone();
        let previous = self
            .repo
            .blocking(move |repo| {
                let previous = repo.head_state()?;
                repo.checkout_branch(&target)?;
                Ok(previous)
            })
            .await
            .map_err(|e| storage_failure(format!("could not check out {}", self.target), e))?;

        info!(tx = %self.info.id(), from = %previous, to = %self.target, "checked out branch");
        self.previous = Some(previous);
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let previous = self
            .previous
            .clone()
            .ok_or_else(|| StepError::new("no previous HEAD recorded"))?;

        let restore = previous.clone();
        self.repo
            .blocking(move |repo| repo.checkout(&restore))
            .await
            .map_err(|e| storage_failure(format!("could not return to {}", previous), e))?;

        debug!(tx = %self.info.id(), to = %previous, "restored previous HEAD");
        Ok(())
    }
}
