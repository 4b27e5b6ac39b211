//! Turning workflow definitions into executable plans.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::storage::{BranchName, GitRepository};
use crate::tracker::{CreateWorkItem, UpdateWorkItemFields, WorkItemClient, WorkItemDraft, WorkItemId};
use crate::transaction::{Plan, Transaction};
use crate::vcs::{CheckoutBranch, CreateBranch, PullBranch, StashChanges};
use crate::workflow::config::WorkflowConfig;
use crate::workflow::definition::{StepTemplate, WorkItemTemplate, WorkflowDefinition};
use crate::workflow::error::{WorkflowError, WorkflowResult};
use crate::workflow::template::{self, Vars};

/// Resolves placeholders and builds a [`Plan`] for one repository.
///
/// Building has no side effects; nothing touches git or the tracker until
/// the plan is executed.
pub struct PlanBuilder {
    repo: GitRepository,
    tracker: Option<Arc<dyn WorkItemClient>>,
    remote: String,
    work_item_type: String,
    vars: Vars,
}

impl PlanBuilder {
    /// Seeds the `base` and `remote` variables from the config.
    pub fn new(repo: GitRepository, config: &WorkflowConfig) -> Self {
        let mut vars = Vars::new();
        vars.insert("base".to_string(), config.repository.base_branch.clone());
        vars.insert("remote".to_string(), config.repository.remote.clone());

        Self {
            repo,
            tracker: None,
            remote: config.repository.remote.clone(),
            work_item_type: config
                .tracker
                .as_ref()
                .map(|t| t.work_item_type.clone())
                .unwrap_or_else(|| "Task".to_string()),
            vars,
        }
    }

    pub fn with_tracker(mut self, client: Arc<dyn WorkItemClient>) -> Self {
        self.tracker = Some(client);
        self
    }

    /// Set a variable, replacing any earlier value.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Build the plan for `workflow`.
    pub fn build(&self, workflow: &WorkflowDefinition) -> WorkflowResult<Plan> {
        if workflow.steps.is_empty() {
            return Err(WorkflowError::EmptyWorkflow(workflow.name.clone()));
        }
        if workflow.needs_tracker() && self.tracker.is_none() {
            return Err(WorkflowError::TrackerNotConfigured);
        }

        let plan = workflow
            .steps
            .iter()
            .map(|step| self.step(step))
            .collect::<WorkflowResult<Plan>>()?;

        debug!(workflow = %workflow.name, steps = plan.len(), "built plan");
        Ok(plan)
    }

    fn render(&self, text: &str) -> WorkflowResult<String> {
        template::render(text, &self.vars)
    }

    fn render_opt(&self, text: Option<&String>) -> WorkflowResult<Option<String>> {
        text.map(|t| self.render(t)).transpose()
    }

    fn branch(&self, text: &str) -> WorkflowResult<BranchName> {
        Ok(BranchName::new(self.render(text)?)?)
    }

    fn work_item_id(&self, field: &str, text: &str) -> WorkflowResult<WorkItemId> {
        let value = self.render(text)?;
        value
            .trim()
            .trim_start_matches('#')
            .parse()
            .map(WorkItemId)
            .map_err(|_| WorkflowError::InvalidValue {
                field: field.to_string(),
                value,
            })
    }

    fn tracker(&self) -> WorkflowResult<Arc<dyn WorkItemClient>> {
        self.tracker.clone().ok_or(WorkflowError::TrackerNotConfigured)
    }

    fn step(&self, step: &StepTemplate) -> WorkflowResult<Box<dyn Transaction>> {
        let repo = self.repo.clone();
        let tx: Box<dyn Transaction> = match step {
            StepTemplate::Stash { reason } => Box::new(StashChanges::new(repo, &self.render(reason)?)),
            StepTemplate::Checkout { branch } => Box::new(CheckoutBranch::new(repo, self.branch(branch)?)),
            StepTemplate::CreateBranch { branch, from } => {
                let start = from.as_deref().map(|f| self.branch(f)).transpose()?;
                Box::new(CreateBranch::new(repo, self.branch(branch)?, start))
            }
            StepTemplate::Pull { remote, branch } => {
                let remote = self.render_opt(remote.as_ref())?.unwrap_or_else(|| self.remote.clone());
                let upstream = branch.as_deref().map(|b| self.branch(b)).transpose()?;
                Box::new(PullBranch::new(repo, remote, upstream))
            }
            StepTemplate::CreateWorkItem(item) => {
                let kind = self
                    .render_opt(item.kind.as_ref())?
                    .unwrap_or_else(|| self.work_item_type.clone());
                Box::new(CreateWorkItem::new(self.tracker()?, kind, self.draft(item)?))
            }
            StepTemplate::UpdateWorkItem { id, fields } => {
                let id = self.work_item_id("id", id)?;
                let fields = fields
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), Value::String(self.render(value)?))))
                    .collect::<WorkflowResult<_>>()?;
                Box::new(UpdateWorkItemFields::new(self.tracker()?, id, fields))
            }
        };
        Ok(tx)
    }

    fn draft(&self, item: &WorkItemTemplate) -> WorkflowResult<WorkItemDraft> {
        let title = self.render(&item.title)?;
        if title.trim().is_empty() {
            return Err(WorkflowError::InvalidValue {
                field: "title".to_string(),
                value: title,
            });
        }

        Ok(WorkItemDraft {
            title,
            description: self.render_opt(item.description.as_ref())?,
            assigned_to: self.render_opt(item.assigned_to.as_ref())?,
            area_path: self.render_opt(item.area_path.as_ref())?,
            iteration_path: self.render_opt(item.iteration_path.as_ref())?,
            tags: item
                .tags
                .iter()
                .map(|t| self.render(t))
                .collect::<WorkflowResult<_>>()?,
            original_estimate: item.original_estimate,
            parent: item
                .parent
                .as_deref()
                .map(|p| self.work_item_id("parent", p))
                .transpose()?,
        })
    }
}
