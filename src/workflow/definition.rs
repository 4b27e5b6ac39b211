//! Workflow definitions as data.
//!
//! A workflow is a named list of [`StepTemplate`]s. Templates carry `{var}`
//! placeholders in their string fields and only become transactions once a
//! [`PlanBuilder`](crate::workflow::PlanBuilder) resolves them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflow::template;

/// A named, ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<StepTemplate>,
}

impl WorkflowDefinition {
    /// Every variable the steps refer to, in order of first use.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for step in &self.steps {
            for name in step.templates().iter().flat_map(|t| template::placeholders(t)) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// True if any step talks to the issue tracker.
    pub fn needs_tracker(&self) -> bool {
        self.steps.iter().any(StepTemplate::needs_tracker)
    }
}

/// One step of a workflow before placeholder resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepTemplate {
    /// Stash local changes, untracked files included.
    Stash {
        #[serde(default = "default_stash_reason")]
        reason: String,
    },
    Checkout {
        branch: String,
    },
    /// Create `branch` at `from`, or at HEAD.
    CreateBranch {
        branch: String,
        #[serde(default)]
        from: Option<String>,
    },
    /// Fast-forward the current branch from `remote`/`branch`. Both default:
    /// the configured remote and the current branch's name.
    Pull {
        #[serde(default)]
        remote: Option<String>,
        #[serde(default)]
        branch: Option<String>,
    },
    CreateWorkItem(WorkItemTemplate),
    UpdateWorkItem {
        id: String,
        fields: BTreeMap<String, String>,
    },
}

fn default_stash_reason() -> String {
    "workflow".to_string()
}

/// Fields of a work item to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemTemplate {
    /// Work-item type; the tracker's configured default when absent.
    #[serde(default)]
    pub kind: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub area_path: Option<String>,
    #[serde(default)]
    pub iteration_path: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub original_estimate: Option<f64>,
    /// Parent work-item id.
    #[serde(default)]
    pub parent: Option<String>,
}

impl StepTemplate {
    pub fn needs_tracker(&self) -> bool {
        matches!(self, StepTemplate::CreateWorkItem(_) | StepTemplate::UpdateWorkItem { .. })
    }

    /// All string fields that may hold placeholders.
    pub(crate) fn templates(&self) -> Vec<&str> {
        match self {
            StepTemplate::Stash { reason } => vec![reason.as_str()],
            StepTemplate::Checkout { branch } => vec![branch.as_str()],
            StepTemplate::CreateBranch { branch, from } => {
                std::iter::once(branch.as_str()).chain(from.as_deref()).collect()
            }
            StepTemplate::Pull { remote, branch } => remote.as_deref().into_iter().chain(branch.as_deref()).collect(),
            StepTemplate::CreateWorkItem(item) => {
                let mut out = vec![item.title.as_str()];
                out.extend(item.kind.as_deref());
                out.extend(item.description.as_deref());
                out.extend(item.assigned_to.as_deref());
                out.extend(item.area_path.as_deref());
                out.extend(item.iteration_path.as_deref());
                out.extend(item.parent.as_deref());
                out.extend(item.tags.iter().map(String::as_str));
                out
            }
            StepTemplate::UpdateWorkItem { id, fields } => {
                std::iter::once(id.as_str()).chain(fields.values().map(String::as_str)).collect()
            }
        }
    }
}

impl fmt::Display for StepTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepTemplate::Stash { .. } => write!(f, "stash changes"),
            StepTemplate::Checkout { branch } => write!(f, "checkout {}", branch),
            StepTemplate::CreateBranch { branch, from: Some(from) } => {
                write!(f, "create branch {} from {}", branch, from)
            }
            StepTemplate::CreateBranch { branch, from: None } => write!(f, "create branch {}", branch),
            StepTemplate::Pull { remote, branch } => {
                let remote = remote.as_deref().unwrap_or("{remote}");
                match branch {
                    Some(branch) => write!(f, "pull {}/{}", remote, branch),
                    None => write!(f, "pull from {}", remote),
                }
            }
            StepTemplate::CreateWorkItem(item) => {
                write!(f, "create {} '{}'", item.kind.as_deref().unwrap_or("work item"), item.title)
            }
            StepTemplate::UpdateWorkItem { id, fields } => {
                let names: Vec<&str> = fields.keys().map(String::as_str).collect();
                write!(f, "update work item {} ({})", id, names.join(", "))
            }
        }
    }
}
