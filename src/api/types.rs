//! Shared state for the API layer.

use std::path::PathBuf;
use std::sync::Arc;

use crate::health::DiagnosticComposer;
use crate::pipeline::rag::orchestrator::AskPipeline;

/// Shared context for all API routes.
/// Constructed once at startup; every handle is read-only.
#[derive(Clone)]
pub struct ApiContext {
    pub ask: Arc<AskPipeline>,
    pub diagnostics: Arc<DiagnosticComposer>,
    pub record_path: Arc<PathBuf>,
}

impl ApiContext {
    pub fn new(ask: AskPipeline, diagnostics: DiagnosticComposer, record_path: PathBuf) -> Self {
        Self {
            ask: Arc::new(ask),
            diagnostics: Arc::new(diagnostics),
            record_path: Arc::new(record_path),
        }
    }
}
