//! Compensating-transaction executor.
//!
//! Runs a [`Plan`] front to back. The first commit failure stops forward
//! progress; every step committed so far is then rolled back, last first.
//! A failed rollback is recorded and the loop moves on to the next one.
//!
//! ```text
//!   commit:    A ──▶ B ──▶ C ──✗ D
//!   rollback:              C ──▶ B ──▶ A
//! ```

use std::fmt;

use crate::transaction::context::{Transaction, TransactionInfo};
use crate::transaction::error::{CommitFailure, ExecutionError, RollbackFailure};

/// Result of executing a plan.
pub type ExecutionResult = Result<ExecutionSummary, ExecutionError>;

/// An ordered list of transactions for one execution.
///
/// Order matters: later steps may rely on effects of earlier ones. A plan is
/// consumed by [`Plan::execute`], so its transactions cannot be reused.
#[derive(Default)]
pub struct Plan {
    steps: Vec<Box<dyn Transaction>>,
}

impl Plan {
    /// Create an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: impl Transaction + 'static) {
        self.steps.push(Box::new(step));
    }

    /// Builder-style [`Plan::push`].
    pub fn then(mut self, step: impl Transaction + 'static) -> Self {
        self.push(step);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step identities in plan order.
    pub fn steps(&self) -> impl Iterator<Item = &TransactionInfo> {
        self.steps.iter().map(|step| step.info())
    }

    /// Run the plan. See [`execute`].
    pub async fn execute(self) -> ExecutionResult {
        execute(self).await
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.steps()).finish()
    }
}

impl FromIterator<Box<dyn Transaction>> for Plan {
    fn from_iter<I: IntoIterator<Item = Box<dyn Transaction>>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// Outcome of a plan whose every step committed.
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    committed: Vec<TransactionInfo>,
}

impl ExecutionSummary {
    /// Committed steps in plan order.
    pub fn committed(&self) -> &[TransactionInfo] {
        &self.committed
    }
}

/// Commit every step of `plan` in order, or compensate.
///
/// On the first commit failure no further step is committed. Steps that did
/// commit are rolled back in reverse commit order; each rollback is attempted
/// even when an earlier one failed. The returned error carries the commit
/// failure and every rollback failure.
///
/// No retries happen here and nothing is logged; both belong to the caller or
/// to individual transactions.
pub async fn execute(plan: Plan) -> ExecutionResult {
    let mut completed: Vec<Box<dyn Transaction>> = Vec::with_capacity(plan.len());
    let mut failure = None;

    for (index, mut step) in plan.steps.into_iter().enumerate() {
        match step.commit().await {
            Ok(()) => completed.push(step),
            Err(error) => {
                failure = Some(CommitFailure {
                    transaction: step.info().clone(),
                    position: index + 1,
                    error,
                });
                break;
            }
        }
    }

    let Some(commit_failure) = failure else {
        return Ok(ExecutionSummary {
            committed: completed.iter().map(|step| step.info().clone()).collect(),
        });
    };

    let mut rolled_back = Vec::with_capacity(completed.len());
    let mut rollback_failures = Vec::new();
    while let Some(mut step) = completed.pop() {
        match step.rollback().await {
            Ok(()) => rolled_back.push(step.info().clone()),
            Err(error) => rollback_failures.push(RollbackFailure {
                transaction: step.info().clone(),
                error,
            }),
        }
    }

    Err(ExecutionError::new(
        commit_failure,
        rolled_back,
        rollback_failures,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::transaction::error::{FailureKind, StepError, StepResult};

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recording {
        info: TransactionInfo,
        journal: Journal,
        fail_commit: bool,
        fail_rollback: bool,
        committed: bool,
    }

    impl Recording {
        fn new(name: &str, journal: &Journal) -> Self {
            Self {
                info: TransactionInfo::new(name),
                journal: journal.clone(),
                fail_commit: false,
                fail_rollback: false,
                committed: false,
            }
        }

        fn failing_commit(mut self) -> Self {
            self.fail_commit = true;
            self
        }

        fn failing_rollback(mut self) -> Self {
            self.fail_rollback = true;
            self
        }
    }

    #[async_trait]
    impl Transaction for Recording {
        fn info(&self) -> &TransactionInfo {
            &self.info
        }

        async fn commit(&mut self) -> StepResult<()> {
            tokio::task::yield_now().await;
            self.journal.lock().push(format!("commit {}", self.info.name()));
            if self.fail_commit {
                return Err(StepError::new(format!("{} refused", self.info.name())));
            }
            self.committed = true;
            Ok(())
        }

        async fn rollback(&mut self) -> StepResult<()> {
            assert!(self.committed, "rollback of uncommitted {}", self.info.name());
            self.journal.lock().push(format!("rollback {}", self.info.name()));
            if self.fail_rollback {
                return Err(StepError::new(format!("{} stuck", self.info.name())));
            }
            Ok(())
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().clone()
    }

    #[tokio::test]
    async fn test_all_steps_commit_in_order() {
        let log = journal();
        let plan = Plan::new()
            .then(Recording::new("A", &log))
            .then(Recording::new("B", &log))
            .then(Recording::new("C", &log));

        let summary = plan.execute().await.unwrap();

        assert_eq!(entries(&log), ["commit A", "commit B", "commit C"]);
        let names: Vec<_> = summary.committed().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_middle_failure_rolls_back_prefix() {
        let log = journal();
        let plan = Plan::new()
            .then(Recording::new("A", &log))
            .then(Recording::new("B", &log).failing_commit())
            .then(Recording::new("C", &log));

        let err = plan.execute().await.unwrap_err();

        assert_eq!(entries(&log), ["commit A", "commit B", "rollback A"]);
        assert_eq!(err.failed_step().name(), "B");
        assert_eq!(err.commit_failure().position, 2);
        assert_eq!(err.commit_failure().error.message(), "B refused");
        assert!(err.rollback_failures().is_empty());
        assert_eq!(err.kind(), FailureKind::Compensated);
        assert_eq!(err.rolled_back().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_continues_past_failures() {
        let log = journal();
        let plan = Plan::new()
            .then(Recording::new("A", &log))
            .then(Recording::new("B", &log))
            .then(Recording::new("C", &log).failing_rollback())
            .then(Recording::new("D", &log).failing_commit());

        let err = plan.execute().await.unwrap_err();

        assert_eq!(
            entries(&log),
            [
                "commit A",
                "commit B",
                "commit C",
                "commit D",
                "rollback C",
                "rollback B",
                "rollback A",
            ]
        );
        assert_eq!(err.failed_step().name(), "D");
        let failed: Vec<_> = err
            .rollback_failures()
            .iter()
            .map(|f| f.transaction.name())
            .collect();
        assert_eq!(failed, ["C"]);
        let undone: Vec<_> = err.rolled_back().iter().map(|i| i.name()).collect();
        assert_eq!(undone, ["B", "A"]);
        assert_eq!(err.kind(), FailureKind::Inconsistent);
    }

    #[tokio::test]
    async fn test_every_rollback_failing_is_reported() {
        let log = journal();
        let plan = Plan::new()
            .then(Recording::new("A", &log).failing_rollback())
            .then(Recording::new("B", &log).failing_rollback())
            .then(Recording::new("C", &log).failing_commit());

        let err = plan.execute().await.unwrap_err();

        assert_eq!(
            entries(&log),
            ["commit A", "commit B", "commit C", "rollback B", "rollback A"]
        );
        assert_eq!(err.rollback_failures().len(), 2);
        assert!(err.rolled_back().is_empty());
        assert!(err.to_string().contains("rollback failed for 'B', 'A'"));
    }

    #[tokio::test]
    async fn test_first_step_failure_rolls_back_nothing() {
        let log = journal();
        let plan = Plan::new()
            .then(Recording::new("A", &log).failing_commit())
            .then(Recording::new("B", &log));

        let err = plan.execute().await.unwrap_err();

        assert_eq!(entries(&log), ["commit A"]);
        assert_eq!(err.commit_failure().position, 1);
        assert!(err.rolled_back().is_empty());
        assert!(err.is_fully_compensated());
    }

    #[tokio::test]
    async fn test_empty_plan_succeeds() {
        let summary = execute(Plan::new()).await.unwrap();
        assert!(summary.committed().is_empty());
    }

    #[tokio::test]
    async fn test_plan_from_boxed_steps() {
        let log = journal();
        let plan: Plan = ["A", "B"]
            .into_iter()
            .map(|name| Box::new(Recording::new(name, &log)) as Box<dyn Transaction>)
            .collect();
        assert_eq!(plan.len(), 2);
        let names: Vec<_> = plan.steps().map(|i| i.name().to_string()).collect();
        assert_eq!(names, ["A", "B"]);

        plan.execute().await.unwrap();
        assert_eq!(entries(&log), ["commit A", "commit B"]);
    }
}
