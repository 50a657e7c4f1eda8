pub mod api;
pub mod config;
pub mod health; // Wearable record summary and diagnosis
pub mod pipeline; // Classify → retrieve → generate → verify → compose

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use api::ApiContext;
use config::{AppConfig, ConfigError};
use health::DiagnosticComposer;
use pipeline::rag::classify::QueryClassifier;
use pipeline::rag::ollama::OllamaClient;
use pipeline::rag::orchestrator::{AskPipeline, LlmGenerate};
use pipeline::rag::pinecone::PineconeIndex;
use pipeline::rag::retrieval::EvidenceRetriever;
use pipeline::rag::types::VectorSearch;
use pipeline::rag::RagError;
use pipeline::safety::grounding::GroundednessVerifier;
use pipeline::storage::embedder::OllamaEmbedder;
use pipeline::storage::types::EmbeddingModel;
use pipeline::storage::StorageError;
use pipeline::terms::TermTable;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Vector index: {0}")]
    Index(#[from] RagError),

    #[error("Language model client: {0}")]
    Generator(RagError),

    #[error("Embedder: {0}")]
    Embedder(#[from] StorageError),

    #[error("Cannot read term list {path}: {source}")]
    Terms {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Runtime: {0}")]
    Runtime(std::io::Error),

    #[error(transparent)]
    Server(#[from] api::server::ServerError),
}

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Construct every collaborator once and bundle them for the router.
///
/// Builds blocking HTTP clients, so it must run outside the async runtime.
pub fn build_context(config: &AppConfig) -> Result<ApiContext, StartupError> {
    let classifier = QueryClassifier::new(load_terms(
        config.domain_terms_file.as_deref(),
        pipeline::rag::classify::DEFAULT_DOMAIN_TERMS,
    )?);
    let verifier = GroundednessVerifier::new(load_terms(
        config.refusal_phrases_file.as_deref(),
        pipeline::safety::grounding::DEFAULT_REFUSAL_PHRASES,
    )?);

    let retrieval_timeout = config.retrieval_timeout_secs.map(Duration::from_secs);
    let pinecone = PineconeIndex::from_config(&config.index, retrieval_timeout)?;
    tracing::info!(index = pinecone.name(), host = pinecone.host(), "Vector index ready");
    let index: Arc<dyn VectorSearch> = Arc::new(pinecone);
    let embedder = build_embedder(config, retrieval_timeout)?;
    let retriever = EvidenceRetriever::new(embedder, index);

    let ollama = OllamaClient::new(
        &config.ollama_url,
        &config.llm_model,
        config.llm_temperature,
        config.llm_timeout_secs.map(Duration::from_secs),
    )
    .map_err(StartupError::Generator)?;

    tracing::info!(
        model = ollama.model(),
        temperature = ollama.temperature(),
        domain_terms = classifier.vocabulary().len(),
        refusal_phrases = verifier.phrases().len(),
        "Services ready"
    );
    let generator: Arc<dyn LlmGenerate> = Arc::new(ollama);

    Ok(ApiContext::new(
        AskPipeline::new(classifier, retriever, generator.clone(), verifier),
        DiagnosticComposer::new(generator),
        config.record_path.clone(),
    ))
}

/// Load config from the environment, build services, serve until ctrl-c.
pub fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let ctx = build_context(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    // Blocking clients must be dropped outside the runtime; keep a handle
    // here so the last reference goes away after `block_on` returns.
    let served = ctx.clone();
    runtime.block_on(api::server::run(served, config.bind_addr))?;
    drop(runtime);
    drop(ctx);
    Ok(())
}

fn load_terms(path: Option<&Path>, defaults: &[&str]) -> Result<TermTable, StartupError> {
    match path {
        Some(path) => {
            let table = TermTable::load(path).map_err(|source| StartupError::Terms {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), terms = table.len(), "Loaded term list");
            Ok(table)
        }
        None => Ok(TermTable::new(defaults)),
    }
}

/// In-process ONNX model when compiled in and present on disk, Ollama otherwise.
fn build_embedder(
    config: &AppConfig,
    timeout: Option<Duration>,
) -> Result<Arc<dyn EmbeddingModel>, StartupError> {
    #[cfg(feature = "onnx-embeddings")]
    if config.embedding_model_dir.exists() {
        let embedder = pipeline::storage::embedder::OnnxEmbedder::load(&config.embedding_model_dir)?;
        tracing::info!(dir = %config.embedding_model_dir.display(), "Using ONNX embeddings");
        return Ok(Arc::new(embedder));
    }

    let embedder = OllamaEmbedder::new(&config.ollama_url, &config.embedding_model, timeout)?;
    tracing::info!(model = embedder.model(), "Using Ollama embeddings");
    Ok(Arc::new(embedder))
}
