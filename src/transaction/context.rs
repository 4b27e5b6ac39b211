//! The reversible unit of work.
//!
//! A [`Transaction`] is one externally visible effect (create a branch, stash
//! the working tree, patch a work item) together with the compensation that
//! undoes it. Implementations carry their own identity as a composed
//! [`TransactionInfo`] rather than through a shared base type.

use std::fmt;

use async_trait::async_trait;
use ulid::Ulid;

use crate::transaction::error::StepResult;

/// Process-unique identifier for a transaction.
///
/// Used for diagnostics and log correlation only; two transactions are never
/// compared by id to make decisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh ULID-based id.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string().to_lowercase())
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last eight characters, enough to tell steps apart in a log line.
    pub fn short(&self) -> &str {
        &self.0[self.0.len().saturating_sub(8)..]
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity and display name of a transaction.
#[derive(Debug, Clone)]
pub struct TransactionInfo {
    id: TransactionId,
    name: String,
}

impl TransactionInfo {
    /// Create info with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TransactionId::generate(),
            name: name.into(),
        }
    }

    /// Get the transaction ID.
    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TransactionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id.short())
    }
}

/// A reversible unit of externally visible work.
///
/// Construction must be free of side effects so plans can be built and thrown
/// away. `rollback` is only called after `commit` returned `Ok`, and must undo
/// the effect using state the transaction captured itself; nothing is passed
/// in by the executor.
#[async_trait]
pub trait Transaction: Send {
    /// Identity and display name.
    fn info(&self) -> &TransactionInfo;

    /// Apply the forward effect.
    ///
    /// If part of the effect was applied before failing, the external system
    /// must be left so that rolling back the earlier steps is still sound.
    async fn commit(&mut self) -> StepResult<()>;

    /// Undo the effect of a successful `commit`.
    async fn rollback(&mut self) -> StepResult<()>;
}
