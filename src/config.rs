use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "RayBand";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Defaults mirror the deployed assistant.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3:8b";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_INDEX_NAME: &str = "medicalchatbot";
pub const DEFAULT_RECORD_PATH: &str = "/HealthRecordTest_week_2018-10-15.json";

/// Number of evidence passages fetched per grounded question.
pub const RETRIEVAL_TOP_K: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "rayband=info,tower_http=info"
}

/// Get the application data directory
/// ~/RayBand/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (for ONNX embeddings)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the embedding model directory (all-MiniLM-L6-v2)
pub fn embedding_model_dir() -> PathBuf {
    models_dir().join("all-MiniLM-L6-v2")
}

/// Connection details for the hosted vector index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub name: String,
    /// Data-plane host of the index, e.g. `https://medicalchatbot-xxxx.svc.pinecone.io`.
    /// Looked up by `name` on the control plane when unset.
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub namespace: Option<String>,
}

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub ollama_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    /// `None` leaves the HTTP client without a request timeout.
    pub llm_timeout_secs: Option<u64>,
    /// Same, for the embedder and the vector index.
    pub retrieval_timeout_secs: Option<u64>,
    pub embedding_model: String,
    pub embedding_model_dir: PathBuf,
    pub index: IndexConfig,
    pub record_path: PathBuf,
    pub domain_terms_file: Option<PathBuf>,
    pub refusal_phrases_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8000))),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: DEFAULT_LLM_TEMPERATURE,
            llm_timeout_secs: None,
            retrieval_timeout_secs: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_model_dir: embedding_model_dir(),
            index: IndexConfig {
                name: DEFAULT_INDEX_NAME.to_string(),
                host: None,
                api_key: None,
                namespace: None,
            },
            record_path: PathBuf::from(DEFAULT_RECORD_PATH),
            domain_terms_file: None,
            refusal_phrases_file: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("RAYBAND_BIND_ADDR") {
            cfg.bind_addr = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RAYBAND_BIND_ADDR",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("RAYBAND_OLLAMA_URL") {
            cfg.ollama_url = v;
        }
        if let Some(v) = get("RAYBAND_LLM_MODEL") {
            cfg.llm_model = v;
        }
        if let Some(v) = get("RAYBAND_LLM_TEMPERATURE") {
            cfg.llm_temperature = v
                .parse::<f32>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or(ConfigError::InvalidValue {
                    key: "RAYBAND_LLM_TEMPERATURE",
                    value: v.clone(),
                })?;
        }
        if let Some(v) = get("RAYBAND_LLM_TIMEOUT_SECS") {
            let secs = v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "RAYBAND_LLM_TIMEOUT_SECS",
                value: v.clone(),
            })?;
            cfg.llm_timeout_secs = Some(secs);
        }
        if let Some(v) = get("RAYBAND_RETRIEVAL_TIMEOUT_SECS") {
            let secs = v.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "RAYBAND_RETRIEVAL_TIMEOUT_SECS",
                value: v.clone(),
            })?;
            cfg.retrieval_timeout_secs = Some(secs);
        }
        if let Some(v) = get("RAYBAND_EMBEDDING_MODEL") {
            cfg.embedding_model = v;
        }
        if let Some(v) = get("RAYBAND_EMBEDDING_MODEL_DIR") {
            cfg.embedding_model_dir = PathBuf::from(v);
        }
        if let Some(v) = get("RAYBAND_INDEX_NAME") {
            cfg.index.name = v;
        }
        cfg.index.host = get("PINECONE_INDEX_HOST");
        cfg.index.api_key = get("PINECONE_API_KEY");
        cfg.index.namespace = get("PINECONE_NAMESPACE");
        if let Some(v) = get("RAYBAND_RECORD_PATH") {
            cfg.record_path = PathBuf::from(v);
        }
        cfg.domain_terms_file = get("RAYBAND_DOMAIN_TERMS_FILE").map(PathBuf::from);
        cfg.refusal_phrases_file = get("RAYBAND_REFUSAL_PHRASES_FILE").map(PathBuf::from);

        Ok(cfg)
    }
}
