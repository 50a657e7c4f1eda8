use std::path::Path;

use serde::{Deserialize, Serialize};

use super::HealthError;

/// Exported wearable record: `{"HealthData": {"Record": [{"@type", "@value"}, ...]}}`.
///
/// Missing `HealthData` or `Record` sections read as an empty record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    #[serde(rename = "HealthData", default)]
    pub health_data: HealthData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    #[serde(rename = "Record", default)]
    pub records: Vec<RecordEntry>,
}

/// One measurement. Exports carry more attributes (`@unit`, dates); only
/// the type and value are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// Kept as raw JSON: a non-string type is an unknown metric, not a bad record.
    #[serde(rename = "@type", default)]
    pub kind: Option<serde_json::Value>,
    /// Either a JSON number or a numeric string, as exporters differ.
    #[serde(rename = "@value", default)]
    pub value: Option<serde_json::Value>,
}

impl RecordEntry {
    pub fn new(kind: &str, value: serde_json::Value) -> Self {
        Self {
            kind: Some(serde_json::Value::String(kind.to_string())),
            value: Some(value),
        }
    }

    /// The `@type` identifier, when it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_ref()?.as_str()
    }

    /// Parse the value as a number. `None` when absent or not numeric.
    pub fn numeric_value(&self) -> Option<f64> {
        match self.value.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl HealthRecord {
    pub fn from_entries(records: Vec<RecordEntry>) -> Self {
        Self {
            health_data: HealthData { records },
        }
    }

    pub fn entries(&self) -> &[RecordEntry] {
        &self.health_data.records
    }

    pub fn parse(json: &str) -> Result<Self, HealthError> {
        serde_json::from_str(json).map_err(|e| HealthError::RecordMalformed(e.to_string()))
    }
}

/// Read and parse the record file at `path`.
pub fn load_record(path: &Path) -> Result<HealthRecord, HealthError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Cannot read health record");
        match e.kind() {
            std::io::ErrorKind::InvalidData => {
                HealthError::RecordMalformed(format!("{}: {e}", path.display()))
            }
            _ => HealthError::RecordNotFound(path.to_path_buf()),
        }
    })?;

    let record = HealthRecord::parse(&contents)?;
    tracing::debug!(entries = record.entries().len(), "Health record loaded");
    Ok(record)
}
