//! Message types for the change-event queue.
//!
//! A queued message body is a per-row change notification from the legacy
//! database, optionally wrapped one level as `{"source": "relay", "event": {...}}`
//! when it was forwarded by another consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DecodeError;

/// Envelope `source` value marking a relayed event.
pub const RELAY_SOURCE: &str = "relay";

/// A message delivered by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
}

impl QueueMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
        }
    }
}

/// Partial-failure report returned to the queue or stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

impl BatchResponse {
    pub fn from_failures(failures: Vec<String>) -> Self {
        Self {
            batch_item_failures: failures
                .into_iter()
                .map(|item_identifier| BatchItemFailure { item_identifier })
                .collect(),
        }
    }
}

/// The database operation a change event reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ChangeMethod {
    Insert,
    Update,
    Delete,
    Other(String),
}

impl From<String> for ChangeMethod {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "insert" => Self::Insert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl ChangeMethod {
    /// Insert and update both mean "sync the current state".
    pub fn is_upsert(&self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }
}

/// A decoded change event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeEvent {
    #[serde(alias = "tableName")]
    pub table_name: String,
    #[serde(alias = "recordId")]
    pub record_id: i64,
    pub method: ChangeMethod,
    /// Parent service of a child-table row.
    #[serde(default, alias = "serviceId")]
    pub service_id: Option<i64>,
}

impl ChangeEvent {
    /// Decode a message body, unwrapping a relayed envelope.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let mut value: Value = serde_json::from_str(body)?;

        let is_relayed = value.get("source").and_then(Value::as_str) == Some(RELAY_SOURCE);
        if is_relayed {
            value = value
                .get_mut("event")
                .map(Value::take)
                .filter(Value::is_object)
                .ok_or_else(|| DecodeError::malformed("relayed envelope has no event object"))?;
        }

        Ok(serde_json::from_value(value)?)
    }
}
