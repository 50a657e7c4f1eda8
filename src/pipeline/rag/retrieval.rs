use std::sync::Arc;

use super::RagError;
use super::types::{EvidencePassage, RetrievalResult, VectorSearch};
use crate::config::RETRIEVAL_TOP_K;
use crate::pipeline::storage::types::EmbeddingModel;

/// Run semantic search using a vector store.
///
/// Embedding failures are reported as `RetrievalUnavailable`: the index
/// cannot be queried without a query vector.
pub fn semantic_search(
    query_text: &str,
    embedder: &dyn EmbeddingModel,
    vector_store: &dyn VectorSearch,
    top_k: usize,
) -> Result<Vec<EvidencePassage>, RagError> {
    let query_embedding = embedder
        .embed(query_text)
        .map_err(|e| RagError::RetrievalUnavailable(format!("embedding failed: {e}")))?;

    vector_store.search(&query_embedding, top_k)
}

/// Fetches ranked evidence for grounded questions.
#[derive(Clone)]
pub struct EvidenceRetriever {
    embedder: Arc<dyn EmbeddingModel>,
    index: Arc<dyn VectorSearch>,
    top_k: usize,
}

impl EvidenceRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingModel>, index: Arc<dyn VectorSearch>) -> Self {
        Self {
            embedder,
            index,
            top_k: RETRIEVAL_TOP_K,
        }
    }

    /// Retrieve up to `top_k` passages, most relevant first.
    ///
    /// Provenance is forwarded exactly as the index returned it. A longer
    /// answer from the index is cut to `top_k` without reordering.
    pub fn retrieve(&self, question: &str) -> Result<RetrievalResult, RagError> {
        let mut passages =
            semantic_search(question, self.embedder.as_ref(), self.index.as_ref(), self.top_k)?;
        passages.truncate(self.top_k);

        tracing::info!(passages = passages.len(), "Evidence retrieved");

        Ok(RetrievalResult { passages })
    }
}

/// In-memory vector search, cosine similarity. Used offline and in tests.
pub struct InMemoryVectorSearch {
    entries: Vec<StoredEntry>,
}

struct StoredEntry {
    text: String,
    embedding: Vec<f32>,
    origin: Option<String>,
    location: Option<String>,
}

impl InMemoryVectorSearch {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(
        &mut self,
        text: &str,
        embedding: Vec<f32>,
        origin: Option<&str>,
        location: Option<&str>,
    ) {
        self.entries.push(StoredEntry {
            text: text.to_string(),
            embedding,
            origin: origin.map(str::to_string),
            location: location.map(str::to_string),
        });
    }

    /// Embed `text` with `embedder` and add it.
    pub fn add_text(
        &mut self,
        embedder: &dyn EmbeddingModel,
        text: &str,
        origin: Option<&str>,
        location: Option<&str>,
    ) -> Result<(), RagError> {
        let embedding = embedder
            .embed(text)
            .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))?;
        self.add(text, embedding, origin, location);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryVectorSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorSearch for InMemoryVectorSearch {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>, RagError> {
        let mut scored: Vec<(f32, &StoredEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query_embedding, &entry.embedding), entry))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| EvidencePassage {
                text: entry.text.clone(),
                origin: entry.origin.clone(),
                location: entry.location.clone(),
                score,
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
