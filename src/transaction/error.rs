//! Transaction error types.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::transaction::context::TransactionInfo;

/// Result type for a single `commit` or `rollback` call.
pub type StepResult<T> = Result<T, StepError>;

/// Boxed underlying cause carried by a [`StepError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by one transaction's `commit` or `rollback`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StepError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StepError {
    /// Create an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The message without the cause chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message followed by every cause in the chain, joined with `: `.
    ///
    /// A cause whose text its wrapper already printed is skipped.
    pub fn detail(&self) -> String {
        let mut out = self.message.clone();
        let mut cause = StdError::source(self);
        while let Some(err) = cause {
            let text = err.to_string();
            if !out.ends_with(&text) {
                out.push_str(": ");
                out.push_str(&text);
            }
            cause = err.source();
        }
        out
    }
}

/// A step whose forward effect could not be applied.
#[derive(Debug, Error)]
#[error("step {position} '{}' failed to commit: {}", .transaction.name(), .error.detail())]
pub struct CommitFailure {
    /// The step that failed.
    pub transaction: TransactionInfo,
    /// 1-based position of the step in its plan.
    pub position: usize,
    /// Why it failed.
    #[source]
    pub error: StepError,
}

/// A compensation that could not be applied.
///
/// Its presence means the external systems may be left partially applied and
/// need manual repair.
#[derive(Debug, Error)]
#[error("rollback of '{}' failed: {}", .transaction.name(), .error.detail())]
pub struct RollbackFailure {
    /// The step whose rollback failed.
    pub transaction: TransactionInfo,
    /// Why it failed.
    #[source]
    pub error: StepError,
}

impl RollbackFailure {
    /// Always true: a failed compensation leaves state for a human to repair.
    pub fn requires_manual_recovery(&self) -> bool {
        true
    }
}

/// Whether compensation after a commit failure restored the starting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Every committed step was rolled back.
    Compensated,
    /// At least one rollback failed; external state is inconsistent.
    Inconsistent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Compensated => write!(f, "compensated"),
            FailureKind::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

/// Aggregate failure returned by the executor when a plan did not complete.
#[derive(Debug)]
pub struct ExecutionError {
    commit: CommitFailure,
    rolled_back: Vec<TransactionInfo>,
    rollback_failures: Vec<RollbackFailure>,
}

impl ExecutionError {
    pub(crate) fn new(
        commit: CommitFailure,
        rolled_back: Vec<TransactionInfo>,
        rollback_failures: Vec<RollbackFailure>,
    ) -> Self {
        Self {
            commit,
            rolled_back,
            rollback_failures,
        }
    }

    /// The commit failure that stopped the plan.
    pub fn commit_failure(&self) -> &CommitFailure {
        &self.commit
    }

    /// The step that failed to commit.
    pub fn failed_step(&self) -> &TransactionInfo {
        &self.commit.transaction
    }

    /// Steps that were rolled back successfully, in the order rollback ran.
    pub fn rolled_back(&self) -> &[TransactionInfo] {
        &self.rolled_back
    }

    /// Compensations that failed, in the order rollback ran. Empty when
    /// compensation was complete.
    pub fn rollback_failures(&self) -> &[RollbackFailure] {
        &self.rollback_failures
    }

    /// Classify the failure.
    pub fn kind(&self) -> FailureKind {
        if self.rollback_failures.is_empty() {
            FailureKind::Compensated
        } else {
            FailureKind::Inconsistent
        }
    }

    /// True if every committed step was rolled back.
    pub fn is_fully_compensated(&self) -> bool {
        self.kind() == FailureKind::Compensated
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.commit)?;
        if self.rollback_failures.is_empty() {
            write!(f, "; {} completed step(s) rolled back", self.rolled_back.len())
        } else {
            let names = self
                .rollback_failures
                .iter()
                .map(|failure| format!("'{}'", failure.transaction.name()))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "; compensation incomplete, rollback failed for {}", names)
        }
    }
}

impl StdError for ExecutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.commit)
    }
}
