//! Branch creation.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::storage::{BranchName, GitRepository};
use crate::transaction::{StepResult, Transaction, TransactionInfo};
use crate::vcs::storage_failure;

/// Create a local branch; rollback deletes it.
///
/// Rollback fails if the branch is checked out at that point. Plans that
/// create and then check out a branch undo the checkout first, so this only
/// happens when something outside the plan switched branches.
#[derive(Debug)]
pub struct CreateBranch {
    info: TransactionInfo,
    repo: GitRepository,
    name: BranchName,
    start: Option<BranchName>,
}

impl CreateBranch {
    /// Create `name` at the tip of `start`, or at HEAD when `start` is `None`.
    pub fn new(repo: GitRepository, name: BranchName, start: Option<BranchName>) -> Self {
        Self {
            info: TransactionInfo::new(format!("create branch {}", name)),
            repo,
            name,
            start,
        }
    }

    /// The branch this step creates.
    pub fn branch(&self) -> &BranchName {
        &self.name
    }
}

#[async_trait]
impl Transaction for CreateBranch {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let name = self.name.clone();
        let start = self.start.clone();
        let at = self
            .repo
            .blocking(move |repo| repo.create_branch(&name, start.as_ref()))
            .await
            .map_err(|e| storage_failure(format!("could not create branch {}", self.name), e))?;

        info!(tx = %self.info.id(), branch = %self.name, at = %at.short(), "created branch");
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let name = self.name.clone();
        self.repo
            .blocking(move |repo| repo.delete_branch(&name))
            .await
            .map_err(|e| storage_failure(format!("could not delete branch {}", self.name), e))?;

        debug!(tx = %self.info.id(), branch = %self.name, "deleted branch");
        Ok(())
    }
}
