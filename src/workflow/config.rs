//! Configuration file.
//!
//! ```toml
//! [repository]
//! remote = "origin"
//! base_branch = "main"
//!
//! [tracker]
//! base_url = "https://dev.azure.com/acme/web"
//! token_env = "GITSAGA_TRACKER_TOKEN"
//! work_item_type = "Task"
//!
//! [[workflows]]
//! name = "hotfix"
//! steps = [
//!     { type = "stash" },
//!     { type = "create_branch", branch = "hotfix/{name}", from = "{base}" },
//!     { type = "checkout", branch = "hotfix/{name}" },
//! ]
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::tracker::{HttpTrackerClient, WorkItemClient};
use crate::workflow::builtin;
use crate::workflow::definition::WorkflowDefinition;
use crate::workflow::error::{WorkflowError, WorkflowResult};

/// File looked up in the repository root when no config path is given.
pub const CONFIG_FILE: &str = ".gitsaga.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub repository: RepositoryConfig,
    pub tracker: Option<TrackerConfig>,
    /// User workflows. A user workflow with a built-in's name replaces it.
    pub workflows: Vec<WorkflowDefinition>,
}

/// Repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Working copy; the current directory when absent.
    pub path: Option<PathBuf>,
    pub remote: String,
    pub base_branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            remote: "origin".to_string(),
            base_branch: "main".to_string(),
        }
    }
}

/// Issue tracker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Project URL, e.g. `https://dev.azure.com/org/project`.
    pub base_url: String,
    /// Environment variable holding the personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Type used when a step does not name one.
    #[serde(default = "default_work_item_type")]
    pub work_item_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_token_env() -> String {
    "GITSAGA_TRACKER_TOKEN".to_string()
}

fn default_work_item_type() -> String {
    "Task".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl TrackerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_env: default_token_env(),
            work_item_type: default_work_item_type(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the token from the configured environment variable.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }

    /// Build an HTTP client for this tracker.
    pub fn client(&self) -> WorkflowResult<Arc<dyn WorkItemClient>> {
        let token = self.token();
        if token.is_none() {
            warn!(var = %self.token_env, "no tracker token set, sending unauthenticated requests");
        }
        let client = HttpTrackerClient::new(&self.base_url, token, self.timeout())?;
        Ok(Arc::new(client))
    }
}

impl WorkflowConfig {
    /// Parse a config from TOML text. `origin` names the source in errors.
    pub fn from_toml(text: &str, origin: &Path) -> WorkflowResult<Self> {
        let config: WorkflowConfig = toml::from_str(text).map_err(|source| WorkflowError::Config {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file that must exist.
    pub fn load(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| WorkflowError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml(&text, path)
    }

    /// Load `.gitsaga.toml` from `root`, or defaults when there is none.
    pub fn discover(root: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = root.as_ref().join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> WorkflowResult<()> {
        let mut seen = BTreeSet::new();
        for workflow in &self.workflows {
            if !seen.insert(workflow.name.as_str()) {
                return Err(WorkflowError::DuplicateWorkflow(workflow.name.clone()));
            }
            if workflow.steps.is_empty() {
                return Err(WorkflowError::EmptyWorkflow(workflow.name.clone()));
            }
        }
        Ok(())
    }

    /// Built-in workflows followed by user workflows, user definitions
    /// replacing built-ins of the same name.
    pub fn workflows(&self) -> Vec<WorkflowDefinition> {
        let mut all: Vec<WorkflowDefinition> = builtin::all()
            .into_iter()
            .filter(|b| !self.workflows.iter().any(|w| w.name == b.name))
            .collect();
        all.extend(self.workflows.iter().cloned());
        all
    }

    /// Look up a workflow by name.
    pub fn workflow(&self, name: &str) -> WorkflowResult<WorkflowDefinition> {
        self.workflows
            .iter()
            .find(|w| w.name == name)
            .cloned()
            .or_else(|| builtin::all().into_iter().find(|w| w.name == name))
            .ok_or_else(|| WorkflowError::UnknownWorkflow(name.to_string()))
    }
}
