//! Work-item transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::tracker::client::WorkItemClient;
use crate::tracker::patch::{PatchDocument, PatchOperation, WorkItemDraft, WorkItemId};
use crate::transaction::{StepError, StepResult, Transaction, TransactionInfo};

/// Create a work item; rollback deletes it.
pub struct CreateWorkItem {
    info: TransactionInfo,
    client: Arc<dyn WorkItemClient>,
    kind: String,
    draft: WorkItemDraft,
    created: Option<WorkItemId>,
}

impl CreateWorkItem {
    /// Create a `kind` item (`Task`, `Bug`, ...) from `draft`.
    pub fn new(client: Arc<dyn WorkItemClient>, kind: impl Into<String>, draft: WorkItemDraft) -> Self {
        let kind = kind.into();
        Self {
            info: TransactionInfo::new(format!("create {} '{}'", kind, draft.title)),
            client,
            kind,
            draft,
            created: None,
        }
    }

    /// Id of the created item, once committed.
    pub fn created_id(&self) -> Option<WorkItemId> {
        self.created
    }
}

impl std::fmt::Debug for CreateWorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateWorkItem")
            .field("info", &self.info)
            .field("kind", &self.kind)
            .field("created", &self.created)
            .finish()
    }
}

#[async_trait]
impl Transaction for CreateWorkItem {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let patch = self.draft.to_patch(self.client.base_url());
        let item = self
            .client
            .create(&self.kind, &patch)
            .await
            .map_err(|e| StepError::with_source(format!("could not create {}", self.kind), e))?;

        info!(tx = %self.info.id(), id = %item.id, kind = %self.kind, "created work item");
        self.created = Some(item.id);
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let Some(id) = self.created else {
            return Ok(());
        };

        match self.client.delete(id).await {
            Ok(()) => debug!(tx = %self.info.id(), %id, "deleted work item"),
            Err(e) if e.is_not_found() => {
                warn!(tx = %self.info.id(), %id, "work item already gone");
            }
            Err(e) => {
                return Err(StepError::with_source(format!("could not delete work item {}", id), e));
            }
        }
        self.created = None;
        Ok(())
    }
}

/// Set fields on an existing work item; rollback restores the previous values.
///
/// Fields that did not exist before the update are removed again.
pub struct UpdateWorkItemFields {
    info: TransactionInfo,
    client: Arc<dyn WorkItemClient>,
    id: WorkItemId,
    fields: BTreeMap<String, Value>,
    restore: Option<PatchDocument>,
}

impl UpdateWorkItemFields {
    /// Set `fields` (reference name to value) on item `id`.
    pub fn new(client: Arc<dyn WorkItemClient>, id: WorkItemId, fields: BTreeMap<String, Value>) -> Self {
        Self {
            info: TransactionInfo::new(format!("update work item {}", id)),
            client,
            id,
            fields,
            restore: None,
        }
    }
}

impl std::fmt::Debug for UpdateWorkItemFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateWorkItemFields")
            .field("info", &self.info)
            .field("id", &self.id)
            .field("fields", &self.fields)
            .finish()
    }
}

#[async_trait]
impl Transaction for UpdateWorkItemFields {
    fn info(&self) -> &TransactionInfo {
        &self.info
    }

    async fn commit(&mut self) -> StepResult<()> {
        let current = self
            .client
            .get(self.id)
            .await
            .map_err(|e| StepError::with_source(format!("could not read work item {}", self.id), e))?;

        let restore: PatchDocument = self
            .fields
            .keys()
            .map(|name| {
                let path = PatchOperation::field_path(name);
                match current.field(name) {
                    Some(old) => PatchOperation::replace(path, old.clone()),
                    None => PatchOperation::remove(path),
                }
            })
            .collect();

        self.client
            .update(self.id, &PatchDocument::set_fields(&self.fields))
            .await
            .map_err(|e| StepError::with_source(format!("could not update work item {}", self.id), e))?;

        info!(tx = %self.info.id(), id = %self.id, fields = self.fields.len(), "updated work item");
        self.restore = Some(restore);
        Ok(())
    }

    async fn rollback(&mut self) -> StepResult<()> {
        let Some(restore) = self.restore.take() else {
            return Ok(());
        };

        if let Err(e) = self.client.update(self.id, &restore).await {
            let err = StepError::with_source(format!("could not restore work item {}", self.id), e);
            self.restore = Some(restore);
            return Err(err);
        }
        debug!(tx = %self.info.id(), id = %self.id, "restored work item fields");
        Ok(())
    }
}
