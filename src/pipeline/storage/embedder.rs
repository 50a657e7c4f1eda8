use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::StorageError;
use super::types::EmbeddingModel;

/// Standard embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

// ═══════════════════════════════════════════════════════════
// ONNX Embedder, behind the `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use super::{mean_pool_normalized, EmbeddingModel, StorageError, EMBEDDING_DIM};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// all-MiniLM-L6-v2 run in-process through ONNX Runtime.
    ///
    /// The model directory must contain `model.onnx` and `tokenizer.json`.
    /// `Session::run` needs `&mut self`, hence the Mutex.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl OnnxEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, StorageError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            for path in [&model_path, &tokenizer_path] {
                if !path.exists() {
                    return Err(StorageError::ModelNotFound(path.to_path_buf()));
                }
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| StorageError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| StorageError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| StorageError::ModelInit(format!("ONNX load failed: {e}")))?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| StorageError::ModelInit(format!("Tokenizer load failed: {e}")))?;

            tracing::info!(dir = %model_dir.display(), "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| StorageError::Tokenization(e.to_string()))?;

            let to_i64 = |v: &[u32]| v.iter().map(|&x| x as i64).collect::<Vec<i64>>();
            let input_ids = to_i64(encoding.get_ids());
            let attention_mask = to_i64(encoding.get_attention_mask());
            let token_type_ids = to_i64(encoding.get_type_ids());
            let seq_len = input_ids.len();

            let as_array = |v: Vec<i64>| {
                ndarray::Array2::from_shape_vec((1, seq_len), v)
                    .map_err(|e| StorageError::Embedding(e.to_string()))
            };
            let ids_array = as_array(input_ids)?;
            let mask_array = as_array(attention_mask.clone())?;
            let type_array = as_array(token_type_ids)?;

            let tensor_err = |e: ort::Error| StorageError::Embedding(e.to_string());
            let ids_tensor = TensorRef::from_array_view(&ids_array).map_err(tensor_err)?;
            let mask_tensor = TensorRef::from_array_view(&mask_array).map_err(tensor_err)?;
            let type_tensor = TensorRef::from_array_view(&type_array).map_err(tensor_err)?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| StorageError::Embedding("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| StorageError::Embedding(format!("ONNX inference failed: {e}")))?;

            // Token embeddings: [1, seq_len, EMBEDDING_DIM]
            let (shape, output_data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| StorageError::Embedding(format!("Output extraction: {e}")))?;

            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(StorageError::Embedding(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]"
                )));
            }

            Ok(mean_pool_normalized(output_data, &attention_mask, EMBEDDING_DIM))
        }
    }

    impl EmbeddingModel for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
            self.infer(text)
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxEmbedder;

/// Mean-pool token embeddings under the attention mask, then L2-normalize.
///
/// `token_embeddings` is row-major `[seq_len, dim]`.
pub fn mean_pool_normalized(token_embeddings: &[f32], attention_mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut mask_sum = 0.0f32;

    for (token_idx, &mask) in attention_mask.iter().enumerate() {
        let offset = token_idx * dim;
        if offset + dim > token_embeddings.len() {
            break;
        }
        let weight = mask as f32;
        mask_sum += weight;
        for (p, v) in pooled.iter_mut().zip(&token_embeddings[offset..offset + dim]) {
            *p += v * weight;
        }
    }

    if mask_sum > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= mask_sum);
    }
    l2_normalize(&mut pooled);
    pooled
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

// ═══════════════════════════════════════════════════════════
// Ollama embedder (default build)
// ═══════════════════════════════════════════════════════════

/// Embeddings served by a local Ollama instance (`/api/embed`).
///
/// The `all-minilm` model is the same all-MiniLM-L6-v2 the index was built with.
/// The dimension is taken from the first embedding the server returns.
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    dimension: OnceLock<usize>,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, model: &str, timeout: Option<Duration>) -> Result<Self, StorageError> {
        // Overrides reqwest's 30s blocking default.
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ModelInit(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension: OnceLock::new(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingModel for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = OllamaEmbedRequest {
            model: &self.model,
            input: [text],
            truncate: true,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                StorageError::EmbeddingConnection(self.base_url.clone())
            } else {
                StorageError::Embedding(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StorageError::Embedding(format!("status {status}: {body}")));
        }

        let parsed: OllamaEmbedResponse = response
            .json()
            .map_err(|e| StorageError::Embedding(e.to_string()))?;

        let embedding = parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::Embedding("Embedding response was empty".to_string()))?;

        let dimension = *self.dimension.get_or_init(|| embedding.len());
        if embedding.len() != dimension {
            return Err(StorageError::Embedding(format!(
                "embedding length {} differs from earlier {dimension}",
                embedding.len()
            )));
        }
        Ok(embedding)
    }

    /// `EMBEDDING_DIM` until the first embedding has been returned.
    fn dimension(&self) -> usize {
        self.dimension.get().copied().unwrap_or(EMBEDDING_DIM)
    }
}

// ═══════════════════════════════════════════════════════════
// Mock embedder
// ═══════════════════════════════════════════════════════════

/// Mock embedding model for testing, produces deterministic vectors.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic unit vector derived from the text bytes.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let bytes = text.as_bytes();
    let mut vec: Vec<f32> = (0..dim)
        .map(|i| {
            let byte = bytes.get(i % bytes.len().max(1)).copied().unwrap_or(0);
            (byte as f32 + i as f32) / 255.0
        })
        .collect();
    l2_normalize(&mut vec);
    vec
}
