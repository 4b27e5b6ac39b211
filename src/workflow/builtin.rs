//! Workflows that ship with the binary.
//!
//! They use the `base` and `remote` variables, which the plan builder fills
//! from the `[repository]` config section unless overridden.

use crate::workflow::definition::{StepTemplate, WorkItemTemplate, WorkflowDefinition};

pub const START_FEATURE: &str = "start-feature";
pub const SYNC: &str = "sync";
pub const CREATE_TASK: &str = "create-task";

fn s(value: &str) -> String {
    value.to_string()
}

/// Stash, update the base branch and branch off it as `feature/{name}`.
pub fn start_feature() -> WorkflowDefinition {
    WorkflowDefinition {
        name: s(START_FEATURE),
        description: s("stash local work, update {base} and start feature/{name} from it"),
        steps: vec![
            StepTemplate::Stash {
                reason: s("start feature/{name}"),
            },
            StepTemplate::Checkout { branch: s("{base}") },
            StepTemplate::Pull {
                remote: Some(s("{remote}")),
                branch: Some(s("{base}")),
            },
            StepTemplate::CreateBranch {
                branch: s("feature/{name}"),
                from: Some(s("{base}")),
            },
            StepTemplate::Checkout {
                branch: s("feature/{name}"),
            },
        ],
    }
}

/// Stash and fast-forward the current branch.
pub fn sync() -> WorkflowDefinition {
    WorkflowDefinition {
        name: s(SYNC),
        description: s("stash local work and fast-forward the current branch"),
        steps: vec![
            StepTemplate::Stash { reason: s("sync") },
            StepTemplate::Pull {
                remote: Some(s("{remote}")),
                branch: None,
            },
        ],
    }
}

/// Create a work item titled `{title}`.
pub fn create_task() -> WorkflowDefinition {
    WorkflowDefinition {
        name: s(CREATE_TASK),
        description: s("create a work item titled {title}"),
        steps: vec![StepTemplate::CreateWorkItem(WorkItemTemplate {
            title: s("{title}"),
            ..WorkItemTemplate::default()
        })],
    }
}

pub fn all() -> Vec<WorkflowDefinition> {
    vec![start_feature(), sync(), create_task()]
}
