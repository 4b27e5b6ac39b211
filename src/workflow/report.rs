//! Human-readable rendering of execution results.

use std::fmt;

use crate::transaction::{ExecutionError, ExecutionResult, ExecutionSummary, FailureKind};

/// Process exit code for a successful run.
pub const EXIT_OK: u8 = 0;
/// A step failed and every completed step was rolled back.
pub const EXIT_COMPENSATED: u8 = 1;
/// A step failed and at least one rollback failed too.
pub const EXIT_INCONSISTENT: u8 = 2;
/// Nothing ran: the config, workflow name, variables or repository were unusable.
pub const EXIT_SETUP: u8 = 3;

/// Renders the outcome of running a workflow.
pub struct Report<'a> {
    workflow: &'a str,
    result: &'a ExecutionResult,
}

impl<'a> Report<'a> {
    pub fn new(workflow: &'a str, result: &'a ExecutionResult) -> Self {
        Self { workflow, result }
    }

    /// Exit code matching the outcome.
    pub fn exit_code(&self) -> u8 {
        match self.result {
            Ok(_) => EXIT_OK,
            Err(e) => match e.kind() {
                FailureKind::Compensated => EXIT_COMPENSATED,
                FailureKind::Inconsistent => EXIT_INCONSISTENT,
            },
        }
    }

    fn success(&self, f: &mut fmt::Formatter<'_>, summary: &ExecutionSummary) -> fmt::Result {
        writeln!(
            f,
            "workflow '{}' completed ({} step(s))",
            self.workflow,
            summary.committed().len()
        )?;
        for step in summary.committed() {
            writeln!(f, "  done        {}", step.name())?;
        }
        Ok(())
    }

    fn failure(&self, f: &mut fmt::Formatter<'_>, err: &ExecutionError) -> fmt::Result {
        let commit = err.commit_failure();
        writeln!(
            f,
            "workflow '{}' failed at step {} '{}'",
            self.workflow,
            commit.position,
            commit.transaction.name()
        )?;
        writeln!(f, "  error: {}", commit.error.detail())?;

        for step in err.rolled_back() {
            writeln!(f, "  undone      {}", step.name())?;
        }
        for failure in err.rollback_failures() {
            writeln!(f, "  NOT UNDONE  {} [{}]", failure.transaction.name(), failure.transaction.id())?;
            writeln!(f, "              {}", failure.error.detail())?;
        }

        match err.kind() {
            FailureKind::Compensated => writeln!(f, "all completed steps were rolled back"),
            FailureKind::Inconsistent => writeln!(
                f,
                "compensation incomplete: {} step(s) need manual recovery",
                err.rollback_failures().len()
            ),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            Ok(summary) => self.success(f, summary),
            Err(err) => self.failure(f, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Plan, StepError, StepResult, Transaction, TransactionInfo};
    use async_trait::async_trait;

    struct Step {
        info: TransactionInfo,
        commit_ok: bool,
        rollback_ok: bool,
    }

    fn step(name: &str, commit_ok: bool, rollback_ok: bool) -> Step {
        Step {
            info: TransactionInfo::new(name),
            commit_ok,
            rollback_ok,
        }
    }

    #[async_trait]
    impl Transaction for Step {
        fn info(&self) -> &TransactionInfo {
            &self.info
        }

        async fn commit(&mut self) -> StepResult<()> {
            if self.commit_ok {
                Ok(())
            } else {
                Err(StepError::new("remote rejected"))
            }
        }

        async fn rollback(&mut self) -> StepResult<()> {
            if self.rollback_ok {
                Ok(())
            } else {
                Err(StepError::new("branch is checked out"))
            }
        }
    }

    #[tokio::test]
    async fn test_success_report() {
        let result = Plan::new().then(step("stash changes", true, true)).execute().await;
        let report = Report::new("sync", &result);
        assert_eq!(report.exit_code(), EXIT_OK);
        assert_eq!(
            report.to_string(),
            "workflow 'sync' completed (1 step(s))\n  done        stash changes\n"
        );
    }

    #[tokio::test]
    async fn test_compensated_report() {
        let result = Plan::new()
            .then(step("create branch a", true, true))
            .then(step("pull origin/main", false, true))
            .execute()
            .await;
        let report = Report::new("x", &result);
        assert_eq!(report.exit_code(), EXIT_COMPENSATED);

        let text = report.to_string();
        assert!(text.starts_with("workflow 'x' failed at step 2 'pull origin/main'\n"));
        assert!(text.contains("  error: remote rejected\n"));
        assert!(text.contains("  undone      create branch a\n"));
        assert!(text.ends_with("all completed steps were rolled back\n"));
    }

    #[tokio::test]
    async fn test_inconsistent_report() {
        let result = Plan::new()
            .then(step("create branch a", true, false))
            .then(step("checkout a", true, true))
            .then(step("create Task 'x'", false, true))
            .execute()
            .await;
        let report = Report::new("x", &result);
        assert_eq!(report.exit_code(), EXIT_INCONSISTENT);

        let text = report.to_string();
        assert!(text.contains("  undone      checkout a\n"));
        assert!(text.contains("  NOT UNDONE  create branch a ["));
        assert!(text.contains("              branch is checked out\n"));
        assert!(text.ends_with("compensation incomplete: 1 step(s) need manual recovery\n"));
    }
}
