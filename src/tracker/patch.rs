//! JSON-patch documents and work-item field mapping.
//!
//! Work items are created and edited with RFC 6902 patches whose paths
//! address fields by reference name (`/fields/System.Title`) or append links
//! (`/relations/-`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Well-known field reference names.
pub mod fields {
    pub const TITLE: &str = "System.Title";
    pub const DESCRIPTION: &str = "System.Description";
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    pub const AREA_PATH: &str = "System.AreaPath";
    pub const ITERATION_PATH: &str = "System.IterationPath";
    pub const TAGS: &str = "System.Tags";
    pub const ORIGINAL_ESTIMATE: &str = "Microsoft.VSTS.Scheduling.OriginalEstimate";
}

/// Link type that makes the target the parent of the item being patched.
pub const PARENT_LINK: &str = "System.LinkTypes.Hierarchy-Reverse";

/// Numeric work-item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(pub u64);

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A work item as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    #[serde(default)]
    pub rev: Option<u32>,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub url: Option<String>,
}

impl WorkItem {
    /// Value of a field, if set.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The title, if set and a string.
    pub fn title(&self) -> Option<&str> {
        self.field(fields::TITLE).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

/// One patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    /// Patch path for a field reference name.
    pub fn field_path(name: &str) -> String {
        format!("/fields/{}", name)
    }
}

/// An ordered list of patch operations, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn push(&mut self, op: PatchOperation) {
        self.0.push(op);
    }

    /// Set each field with an `add` operation (an upsert for fields).
    pub fn set_fields(fields: &BTreeMap<String, Value>) -> Self {
        fields
            .iter()
            .map(|(name, value)| PatchOperation::add(PatchOperation::field_path(name), value.clone()))
            .collect()
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<PatchOperation> for PatchDocument {
    fn from_iter<I: IntoIterator<Item = PatchOperation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A work item to be created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemDraft {
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
    /// Estimate in hours.
    #[serde(default)]
    pub original_estimate: Option<f64>,
    #[serde(default)]
    pub parent: Option<WorkItemId>,
}

impl WorkItemDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn assigned_to(mut self, who: impl Into<String>) -> Self {
        self.assigned_to = Some(who.into());
        self
    }

    pub fn area_path(mut self, path: impl Into<String>) -> Self {
        self.area_path = Some(path.into());
        self
    }

    pub fn iteration_path(mut self, path: impl Into<String>) -> Self {
        self.iteration_path = Some(path.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn original_estimate(mut self, hours: f64) -> Self {
        self.original_estimate = Some(hours);
        self
    }

    pub fn parent(mut self, parent: WorkItemId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Map the draft onto field reference names. Unset fields are omitted.
    pub fn fields(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        out.insert(fields::TITLE.to_string(), json!(self.title));

        let optional = [
            (fields::DESCRIPTION, &self.description),
            (fields::ASSIGNED_TO, &self.assigned_to),
            (fields::AREA_PATH, &self.area_path),
            (fields::ITERATION_PATH, &self.iteration_path),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                out.insert(name.to_string(), json!(value));
            }
        }

        if !self.tags.is_empty() {
            out.insert(fields::TAGS.to_string(), json!(self.tags.join("; ")));
        }
        if let Some(hours) = self.original_estimate {
            out.insert(fields::ORIGINAL_ESTIMATE.to_string(), json!(hours));
        }
        out
    }

    /// Creation patch. `base_url` is used to build the parent link.
    pub fn to_patch(&self, base_url: &str) -> PatchDocument {
        let mut patch = PatchDocument::set_fields(&self.fields());
        if let Some(parent) = self.parent {
            patch.push(PatchOperation::add(
                "/relations/-",
                json!({
                    "rel": PARENT_LINK,
                    "url": format!("{}/_apis/wit/workItems/{}", base_url.trim_end_matches('/'), parent.0),
                }),
            ));
        }
        patch
    }
}
