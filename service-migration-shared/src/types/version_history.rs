//! Append-only audit trail records produced by change capture.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Update,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "UPDATE",
        }
    }
}

/// Before and after values of a single changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Who made a change, taken from the document's `lastUpdatedBy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedBy {
    pub display: String,
    #[serde(rename = "type")]
    pub actor_type: String,
    pub value: String,
}

impl Default for ChangedBy {
    fn default() -> Self {
        Self {
            display: "Unknown".to_string(),
            actor_type: "system".to_string(),
            value: "unknown".to_string(),
        }
    }
}

/// One audit entry, keyed by `(entity_id, timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionHistoryRecord {
    pub entity_id: String,
    pub timestamp: String,
    pub change_type: ChangeType,
    pub changed_fields: BTreeMap<String, FieldChange>,
    pub changed_by: ChangedBy,
}
