use serde::{Deserialize, Serialize};

use super::RagError;

/// Provenance fallback when a passage carries no origin metadata.
pub const UNKNOWN_ORIGIN: &str = "Unknown";
/// Provenance fallback when a passage carries no location metadata.
pub const UNKNOWN_LOCATION: &str = "N/A";

/// A user question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
}

/// Routing decision for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub in_domain: bool,
}

/// A passage returned by the vector index, with the provenance set at indexing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePassage {
    pub text: String,
    /// Origin identifier, e.g. the source book.
    pub origin: Option<String>,
    /// Location identifier, e.g. the page number.
    pub location: Option<String>,
    pub score: f32,
}

/// Passages ranked by similarity, most relevant first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub passages: Vec<EvidencePassage>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }
}

/// A source citation as exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub book: String,
    pub page: String,
}

/// Answer returned by `ask`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

/// How a prompt was constructed for the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Grounded,
    Free,
    Diagnostic,
}

/// Vector index similarity search
pub trait VectorSearch: Send + Sync {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>, RagError>;
}
