//! Workflows: named step lists turned into plans.
//!
//! ```text
//!  .gitsaga.toml ──► WorkflowConfig ──► WorkflowDefinition (StepTemplates)
//!                                              │
//!                          --var k=v ──► PlanBuilder
//!                                              │
//!                                              ▼
//!                                     transaction::Plan ──► execute ──► Report
//! ```

pub mod builtin;
mod builder;
mod config;
mod definition;
mod error;
mod report;
mod template;

pub use builder::PlanBuilder;
pub use config::{RepositoryConfig, TrackerConfig, WorkflowConfig, CONFIG_FILE};
pub use definition::{StepTemplate, WorkItemTemplate, WorkflowDefinition};
pub use error::{WorkflowError, WorkflowResult};
pub use report::{Report, EXIT_COMPENSATED, EXIT_INCONSISTENT, EXIT_OK, EXIT_SETUP};
pub use template::{placeholders, render, Vars};
