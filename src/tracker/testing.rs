//! In-memory tracker for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::tracker::client::WorkItemClient;
use crate::tracker::error::{TrackerError, TrackerResult};
use crate::tracker::patch::{PatchDocument, PatchOp, WorkItem, WorkItemId};

#[derive(Default)]
pub(crate) struct FakeTracker {
    items: Mutex<BTreeMap<u64, Map<String, Value>>>,
    next_id: Mutex<u64>,
    /// Operations named here answer with a 500.
    failing: Mutex<Vec<&'static str>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            ..Self::default()
        }
    }

    pub(crate) fn fail(&self, operation: &'static str) {
        self.failing.lock().push(operation);
    }

    pub(crate) fn recover(&self, operation: &'static str) {
        self.failing.lock().retain(|op| *op != operation);
    }

    pub(crate) fn insert(&self, id: u64, fields: Map<String, Value>) {
        self.items.lock().insert(id, fields);
    }

    pub(crate) fn fields(&self, id: u64) -> Option<Map<String, Value>> {
        self.items.lock().get(&id).cloned()
    }

    fn enter(&self, operation: &'static str, target: String) -> TrackerResult<()> {
        self.calls.lock().push(format!("{} {}", operation, target));
        if self.failing.lock().contains(&operation) {
            return Err(TrackerError::Status {
                status: 500,
                body: format!("{} unavailable", operation),
            });
        }
        Ok(())
    }

    fn not_found(id: WorkItemId) -> TrackerError {
        TrackerError::Status {
            status: 404,
            body: format!("work item {} does not exist", id.0),
        }
    }
}

fn apply(fields: &mut Map<String, Value>, patch: &PatchDocument) {
    for op in patch.operations() {
        let Some(name) = op.path.strip_prefix("/fields/") else {
            continue;
        };
        match op.op {
            PatchOp::Add | PatchOp::Replace => {
                fields.insert(name.to_string(), op.value.clone().unwrap_or(Value::Null));
            }
            PatchOp::Remove => {
                fields.remove(name);
            }
        }
    }
}

#[async_trait]
impl WorkItemClient for FakeTracker {
    fn base_url(&self) -> &str {
        "https://tracker.test/org/project"
    }

    async fn create(&self, kind: &str, patch: &PatchDocument) -> TrackerResult<WorkItem> {
        self.enter("create", kind.to_string())?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        let mut fields = Map::new();
        fields.insert("System.WorkItemType".to_string(), Value::from(kind));
        apply(&mut fields, patch);
        self.items.lock().insert(id, fields.clone());
        Ok(WorkItem {
            id: WorkItemId(id),
            rev: Some(1),
            fields,
            url: None,
        })
    }

    async fn get(&self, id: WorkItemId) -> TrackerResult<WorkItem> {
        self.enter("get", id.0.to_string())?;
        let fields = self.fields(id.0).ok_or_else(|| Self::not_found(id))?;
        Ok(WorkItem {
            id,
            rev: None,
            fields,
            url: None,
        })
    }

    async fn update(&self, id: WorkItemId, patch: &PatchDocument) -> TrackerResult<WorkItem> {
        self.enter("update", id.0.to_string())?;
        let mut items = self.items.lock();
        let fields = items.get_mut(&id.0).ok_or_else(|| Self::not_found(id))?;
        apply(fields, patch);
        Ok(WorkItem {
            id,
            rev: None,
            fields: fields.clone(),
            url: None,
        })
    }

    async fn delete(&self, id: WorkItemId) -> TrackerResult<()> {
        self.enter("delete", id.0.to_string())?;
        self.items
            .lock()
            .remove(&id.0)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}
