//! Update record encoding
//!
//! This module wraps diagnostic events into self-describing JSON records with
//! producer metadata, so callers can ship them to logs or analytics.

use crate::error::ZoneError;
use crate::types::DiagnosticEvent;
use crate::{PRODUCER_NAME, ZONE_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current update record schema version
pub const RECORD_VERSION: &str = "1.0.0";

/// Producer metadata attached to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One encoded controller update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub record_version: String,
    pub producer: RecordProducer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub computed_at_utc: String,
    pub event: DiagnosticEvent,
}

/// Encoder producing update records
pub struct UpdateEncoder {
    instance_id: String,
}

impl Default for UpdateEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a diagnostic event into a record
    pub fn encode(&self, event: &DiagnosticEvent, student_id: Option<&str>) -> UpdateRecord {
        UpdateRecord {
            record_version: RECORD_VERSION.to_string(),
            producer: RecordProducer {
                name: PRODUCER_NAME.to_string(),
                version: ZONE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            student_id: student_id.map(str::to_string),
            computed_at_utc: Utc::now().to_rfc3339(),
            event: event.clone(),
        }
    }

    /// Encode to a compact JSON string
    pub fn encode_to_json(
        &self,
        event: &DiagnosticEvent,
        student_id: Option<&str>,
    ) -> Result<String, ZoneError> {
        let record = self.encode(event, student_id);
        serde_json::to_string(&record).map_err(ZoneError::JsonError)
    }
}
