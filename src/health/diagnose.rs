use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::{load_record, HealthRecord};
use super::summary::summarize;
use super::HealthError;
use crate::pipeline::rag::orchestrator::{generate_with_mode, LlmGenerate};
use crate::pipeline::rag::prompt::build_diagnostic_prompt;
use crate::pipeline::rag::types::GenerationMode;

/// Free-text model output. Not parsed or validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub diagnosis: String,
}

/// Summarizes a record and asks the model for issues, risks and a next step.
#[derive(Clone)]
pub struct DiagnosticComposer {
    generator: Arc<dyn LlmGenerate>,
}

impl DiagnosticComposer {
    pub fn new(generator: Arc<dyn LlmGenerate>) -> Self {
        Self { generator }
    }

    pub fn diagnose(&self, record: &HealthRecord) -> Result<Diagnosis, HealthError> {
        let summary = summarize(record)?;
        tracing::info!(metrics = summary.averages.len(), "Composing diagnosis");

        let prompt = build_diagnostic_prompt(&summary.to_text());
        let diagnosis =
            generate_with_mode(self.generator.as_ref(), GenerationMode::Diagnostic, &prompt)?;

        Ok(Diagnosis { diagnosis })
    }

    /// Load the record at `path`, then diagnose it.
    pub fn diagnose_file(&self, path: &Path) -> Result<Diagnosis, HealthError> {
        let record = load_record(path)?;
        self.diagnose(&record)
    }
}
