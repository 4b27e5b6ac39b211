//! Stashing local changes.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::storage::{GitRepository, StashId};
use crate::transaction::{StepResult, Transaction, TransactionInfo};
use crate::vcs::storage_failure;

/// Stash tracked and untracked changes; rollback pops the same entry.
///
/// A clean tree is not an error: nothing is stashed and rollback does nothing.
#[derive(Debug)]
pub struct StashChanges {
    info: TransactionInfo,
    repo: GitRepository,
    message: String,
    stash: Option<StashId>,
}

impl StashChanges {
    /// `reason` ends up in the stash message next to a timestamp.
    pub fn new(repo: GitRepository, reason: &str) -> Self {
        Self {
            info: TransactionInfo::new("stash changes"),
            repo,
            message: format!("gitsaga: {} ({})", reason, Utc::now().format("%Y-%m-%d %H:%M:%S")),
            stash: None,
        }
    }

    /// The stash entry created by `commit`, if any.
    pub fn stash_id(&self) -> Option<StashId> {
        self.stash
    }
}

#[async_trait]
impl Transaction for StashChanges {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let message = self.message.clone();
        let stash = self
            .repo
            .blocking(move |repo| repo.stash_save(&message))
            .await
            .map_err(|e| storage_failure("could not stash local changes", e))?;

        match stash {
            Some(id) => info!(tx = %self.info.id(), stash = %id, "stashed local changes"),
            None => debug!(tx = %self.info.id(), "working tree clean, nothing stashed"),
        }
        self.stash = stash;
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let Some(id) = self.stash else {
            return Ok(());
        };

        self.repo
            .blocking(move |repo| repo.stash_pop(id))
            .await
            .map_err(|e| storage_failure(format!("could not restore stash {}", id), e))?;

        debug!(tx = %self.info.id(), stash = %id, "restored stashed changes");
        Ok(())
    }
}
