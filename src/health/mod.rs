//! Wearable health record: loading, per-metric summary and LLM diagnosis.

pub mod diagnose;
pub mod record;
pub mod summary;
pub mod vital;

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::rag::RagError;

pub use diagnose::{Diagnosis, DiagnosticComposer};
pub use record::{load_record, HealthRecord, RecordEntry};
pub use summary::{summarize, HealthSummary, MetricAverage};
pub use vital::VitalType;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("Health record not found: {0}")]
    RecordNotFound(PathBuf),

    #[error("Health record malformed: {0}")]
    RecordMalformed(String),

    #[error(transparent)]
    Generation(#[from] RagError),
}
