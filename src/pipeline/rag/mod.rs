pub mod types;
pub mod classify;
pub mod retrieval;
pub mod pinecone;
pub mod prompt;
pub mod citation;
pub mod ollama;
pub mod orchestrator;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    /// The vector index (or the embedder feeding it) could not be queried.
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The language model call errored or returned an unusable response.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),
}
