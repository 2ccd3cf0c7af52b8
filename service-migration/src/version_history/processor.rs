//! Turns change-capture stream records into version-history entries.

use chrono::{SecondsFormat, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use service_migration_repository::AuditSink;
use service_migration_shared::{ChangeType, VersionHistoryRecord, RECORD_KIND_DOCUMENT};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::attribute_value::{image_to_plain, to_plain};
use super::diff::{detect_changes, extract_changed_by, EXCLUDED_FIELDS};
use crate::errors::ChangeCaptureError;

lazy_static! {
    static ref TABLE_NAME_REGEX: Regex = Regex::new(r"table/([^/]+)/stream/").unwrap();
}

/// Key attribute holding the record id.
const ID_KEY: &str = "id";

/// One change-capture record. Keys and images hold typed attribute values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(alias = "eventSourceARN")]
    pub source_locator: String,
    #[serde(default)]
    pub keys: Map<String, Value>,
    #[serde(default)]
    pub old_image: Option<Map<String, Value>>,
    #[serde(default)]
    pub new_image: Option<Map<String, Value>>,
    pub sequence_number: String,
}

/// What happened to one stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// One snapshot was absent, as for inserts and deletes.
    MissingImage,
    /// Only excluded fields differed.
    NoChanges,
    Recorded { entity_id: String, changed_fields: usize },
}

/// Extract the table name from a stream source locator.
pub fn table_name(source_locator: &str) -> Option<&str> {
    TABLE_NAME_REGEX
        .captures(source_locator)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

pub fn entity_id(table: &str, record_id: &str) -> String {
    format!("{table}|{record_id}|{RECORD_KIND_DOCUMENT}")
}

/// Current time in the version-history timestamp format.
pub fn audit_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Writes an audit entry for every business-relevant change in a stream.
pub struct ChangeDetector {
    sink: Arc<dyn AuditSink>,
}

impl ChangeDetector {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Process a batch of stream records and return the sequence numbers that failed.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub async fn process_stream_records(&self, records: &[StreamRecord]) -> Vec<String> {
        let mut failures = Vec::new();

        for record in records {
            match self.process_record(record).await {
                Ok(outcome) => debug!(sequence_number = %record.sequence_number, ?outcome, "Processed stream record"),
                Err(e) => {
                    error!(
                        sequence_number = %record.sequence_number,
                        error = %e,
                        "Failed to process stream record"
                    );
                    failures.push(record.sequence_number.clone());
                }
            }
        }

        info!(
            total_records = records.len(),
            failed_records = failures.len(),
            "Stream batch processed"
        );
        failures
    }

    /// Diff one record's snapshots and append an audit entry when they differ.
    pub async fn process_record(
        &self,
        record: &StreamRecord,
    ) -> Result<CaptureOutcome, ChangeCaptureError> {
        let table = table_name(&record.source_locator)
            .ok_or_else(|| ChangeCaptureError::MissingTableName(record.source_locator.clone()))?;
        let record_id = record_id(&record.keys)?;

        let (Some(old_image), Some(new_image)) = (&record.old_image, &record.new_image) else {
            debug!(table, %record_id, event = ?record.event_name, "Snapshot missing, skipping");
            return Ok(CaptureOutcome::MissingImage);
        };
        if old_image.is_empty() || new_image.is_empty() {
            return Ok(CaptureOutcome::MissingImage);
        }

        let old_document = image_to_plain(old_image)?;
        let new_document = image_to_plain(new_image)?;

        let changed_fields = detect_changes(&old_document, &new_document, &EXCLUDED_FIELDS);
        if changed_fields.is_empty() {
            debug!(table, %record_id, "No business changes, skipping");
            return Ok(CaptureOutcome::NoChanges);
        }

        let entry = VersionHistoryRecord {
            entity_id: entity_id(table, &record_id),
            timestamp: audit_timestamp(),
            change_type: ChangeType::Update,
            changed_by: extract_changed_by(&new_document),
            changed_fields,
        };
        self.sink.append(&entry).await?;

        info!(
            entity_id = %entry.entity_id,
            changed_field_count = entry.changed_fields.len(),
            "Recorded version history"
        );
        Ok(CaptureOutcome::Recorded {
            changed_fields: entry.changed_fields.len(),
            entity_id: entry.entity_id,
        })
    }
}

fn record_id(keys: &Map<String, Value>) -> Result<String, ChangeCaptureError> {
    let raw = keys.get(ID_KEY).ok_or(ChangeCaptureError::MissingRecordId)?;
    match to_plain(raw)? {
        Value::String(id) if !id.is_empty() => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(ChangeCaptureError::MissingRecordId),
    }
}
