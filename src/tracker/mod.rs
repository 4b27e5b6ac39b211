//! Issue tracker integration.
//!
//! Work items are created and edited through JSON-patch documents. The
//! transactions in this module wrap those calls so they can take part in a
//! plan next to the git steps:
//!
//! | step                   | commit                      | rollback                     |
//! |------------------------|-----------------------------|------------------------------|
//! | `CreateWorkItem`       | create an item              | delete it                    |
//! | `UpdateWorkItemFields` | set fields, snapshot old    | put the old values back      |

mod client;
mod error;
mod patch;
mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpTrackerClient, WorkItemClient};
pub use error::{TrackerError, TrackerResult};
pub use patch::{
    fields, PatchDocument, PatchOp, PatchOperation, WorkItem, WorkItemDraft, WorkItemId, PARENT_LINK,
};
pub use steps::{CreateWorkItem, UpdateWorkItemFields};
