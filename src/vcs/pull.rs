//! Pulling a branch from a remote.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::storage::{BranchName, CommitId, FastForward, GitRepository};
use crate::transaction::{StepResult, Transaction, TransactionInfo};
use crate::vcs::storage_failure;

/// Fetch from a remote and fast-forward the checked-out branch.
///
/// Histories that need a merge fail the commit; nothing is merged. Rollback
/// moves the branch back to where it was, hard resetting the working tree, so
/// a dirty tree should be stashed earlier in the plan.
#[derive(Debug)]
pub struct PullBranch {
    info: TransactionInfo,
    repo: GitRepository,
    remote: String,
    upstream: Option<BranchName>,
    previous: Option<(BranchName, CommitId)>,
}

impl PullBranch {
    /// Pull `upstream` from `remote` into the current branch. With `None` the
    /// upstream branch has the same name as the current one.
    pub fn new(repo: GitRepository, remote: impl Into<String>, upstream: Option<BranchName>) -> Self {
        let remote = remote.into();
        let name = match &upstream {
            Some(branch) => format!("pull {}/{}", remote, branch),
            None => format!("pull from {}", remote),
        };
        Self {
            info: TransactionInfo::new(name),
            repo,
            remote,
            upstream,
            previous: None,
        }
    }
}

#[async_trait]
impl Transaction for PullBranch {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let remote = self.remote.clone();
        let upstream = self.upstream.clone();
        let (local, outcome) = self
            .repo
            .blocking(move |repo| {
                let local = repo.current_branch()?;
                let upstream = upstream.unwrap_or_else(|| local.clone());
                let fetched = repo.fetch(&remote, &upstream)?;
                let outcome = repo.fast_forward(&local, fetched)?;
                Ok((local, outcome))
            })
            .await
            .map_err(|e| storage_failure(format!("could not pull from {}", self.remote), e))?;

        match outcome {
            FastForward::Advanced { from, to } => {
                info!(
                    tx = %self.info.id(),
                    branch = %local,
                    from = %from.short(),
                    to = %to.short(),
                    "fast-forwarded branch"
                );
                self.previous = Some((local, from));
            }
            FastForward::UpToDate => {
                debug!(tx = %self.info.id(), branch = %local, "already up to date");
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let Some((branch, commit)) = self.previous.clone() else {
            return Ok(());
        };

        let target = branch.clone();
        self.repo
            .blocking(move |repo| repo.reset_branch(&target, commit))
            .await
            .map_err(|e| storage_failure(format!("could not reset {} to {}", branch, commit.short()), e))?;

        debug!(tx = %self.info.id(), branch = %branch, to = %commit.short(), "reset branch");
        Ok(())
    }
}
