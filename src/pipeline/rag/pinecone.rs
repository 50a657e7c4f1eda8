//! Client for a hosted Pinecone index populated outside this service.
//!
//! Passages are stored LangChain-style: the chunk text under metadata `text`,
//! the source document under `source` and the page under `page`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::RagError;
use super::types::{EvidencePassage, VectorSearch};
use crate::config::IndexConfig;

const API_VERSION: &str = "2024-07";
/// Control plane used to look up an index host by name.
pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// Metadata key holding the passage text.
const TEXT_KEY: &str = "text";
const ORIGIN_KEY: &str = "source";
const LOCATION_KEY: &str = "page";

/// Read-only handle on a named Pinecone index.
pub struct PineconeIndex {
    name: String,
    host: String,
    api_key: String,
    namespace: Option<String>,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    #[serde(default)]
    host: String,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeIndex {
    /// Build a client from the index configuration.
    ///
    /// Without a configured host, the index is looked up by name on the
    /// control plane. `timeout` of `None` leaves requests unbounded.
    pub fn from_config(config: &IndexConfig, timeout: Option<Duration>) -> Result<Self, RagError> {
        Self::connect(config, CONTROL_PLANE_URL, timeout)
    }

    fn connect(
        config: &IndexConfig,
        control_plane: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, RagError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RagError::RetrievalUnavailable(format!("no API key configured for index '{}'", config.name))
        })?;
        // Overrides reqwest's 30s blocking default.
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))?;

        let host = match config.host.as_deref() {
            Some(host) => host.to_string(),
            None => describe_index_host(&client, control_plane, &config.name, &api_key)?,
        };

        Ok(Self {
            name: config.name.clone(),
            host: normalize_host(&host),
            api_key,
            namespace: config.namespace.clone(),
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

/// `GET {control_plane}/indexes/{name}` and return the data-plane host.
fn describe_index_host(
    client: &reqwest::blocking::Client,
    control_plane: &str,
    name: &str,
    api_key: &str,
) -> Result<String, RagError> {
    let url = format!("{}/indexes/{name}", control_plane.trim_end_matches('/'));

    let response = client
        .get(&url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .map_err(|e| RagError::RetrievalUnavailable(format!("cannot describe index '{name}': {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(RagError::RetrievalUnavailable(format!(
            "describe index '{name}' returned status {status}: {body}"
        )));
    }

    let raw = response
        .text()
        .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))?;
    let host = host_from_describe_response(&raw)?;
    tracing::info!(index = name, host = %host, "Resolved index host");
    Ok(host)
}

/// Extract `host` from a describe-index response.
fn host_from_describe_response(raw: &str) -> Result<String, RagError> {
    let parsed: DescribeIndexResponse = serde_json::from_str(raw)
        .map_err(|e| RagError::RetrievalUnavailable(format!("undecodable index description: {e}")))?;

    if parsed.host.trim().is_empty() {
        return Err(RagError::RetrievalUnavailable(
            "index description carries no host".to_string(),
        ));
    }
    Ok(parsed.host)
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

impl VectorSearch for PineconeIndex {
    fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<EvidencePassage>, RagError> {
        let url = format!("{}/query", self.host);
        let body = QueryRequest {
            vector: query_embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| {
                tracing::warn!(index = %self.name, error = %e, "Vector index unreachable");
                RagError::RetrievalUnavailable(format!("index '{}': {e}", self.name))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::RetrievalUnavailable(format!(
                "index '{}' returned status {status}: {body}",
                self.name
            )));
        }

        let raw = response
            .text()
            .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))?;
        passages_from_response(&raw)
    }
}

/// Decode a `/query` response body into passages, preserving match order.
pub(crate) fn passages_from_response(raw: &str) -> Result<Vec<EvidencePassage>, RagError> {
    let parsed: QueryResponse = serde_json::from_str(raw)
        .map_err(|e| RagError::RetrievalUnavailable(format!("undecodable index response: {e}")))?;

    Ok(parsed
        .matches
        .into_iter()
        .map(|m| {
            let metadata = m.metadata.unwrap_or_default();
            EvidencePassage {
                text: metadata
                    .get(TEXT_KEY)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                origin: metadata.get(ORIGIN_KEY).and_then(metadata_string),
                location: metadata.get(LOCATION_KEY).and_then(metadata_string),
                score: m.score,
            }
        })
        .collect())
}

/// Render a metadata value as citation text. Whole numbers lose their `.0`.
fn metadata_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::OneShotServer;

    fn index_config(host: Option<&str>, key: Option<&str>) -> IndexConfig {
        IndexConfig {
            name: "medicalchatbot".into(),
            host: host.map(str::to_string),
            api_key: key.map(str::to_string),
            namespace: None,
        }
    }

    #[test]
    fn parses_matches_in_order_with_provenance() {
        let raw = r#"{
            "matches": [
                {"id": "a", "score": 0.91, "metadata": {"text": "Chest pain can signal...", "source": "Medical_book.pdf", "page": 212.0}},
                {"id": "b", "score": 0.87, "metadata": {"text": "Angina is...", "source": "Medical_book.pdf", "page": "45"}},
                {"id": "c", "score": 0.80, "metadata": {"text": "No provenance here"}}
            ],
            "namespace": ""
        }"#;
        let passages = passages_from_response(raw).unwrap();
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].location.as_deref(), Some("212"));
        assert_eq!(passages[0].origin.as_deref(), Some("Medical_book.pdf"));
        assert_eq!(passages[1].location.as_deref(), Some("45"));
        assert_eq!(passages[2].origin, None);
        assert_eq!(passages[2].location, None);
        assert_eq!(passages[2].text, "No provenance here");
    }

    #[test]
    fn missing_metadata_yields_empty_passage() {
        let passages = passages_from_response(r#"{"matches":[{"id":"x","score":0.5}]}"#).unwrap();
        assert_eq!(passages[0].text, "");
        assert!(passages[0].origin.is_none());
    }

    #[test]
    fn empty_response_is_no_passages() {
        assert!(passages_from_response("{}").unwrap().is_empty());
    }

    #[test]
    fn garbage_response_is_retrieval_unavailable() {
        let err = passages_from_response("<html>").unwrap_err();
        assert!(matches!(err, RagError::RetrievalUnavailable(_)));
    }

    #[test]
    fn fractional_page_keeps_decimals() {
        assert_eq!(metadata_string(&serde_json::json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(metadata_string(&serde_json::json!(7)).as_deref(), Some("7"));
        assert_eq!(metadata_string(&Value::Null), None);
    }

    #[test]
    fn from_config_requires_api_key() {
        let err = PineconeIndex::from_config(&index_config(Some("h.example"), None), None)
            .err()
            .unwrap();
        assert!(matches!(err, RagError::RetrievalUnavailable(_)));
        assert!(PineconeIndex::from_config(&index_config(None, None), None).is_err());
    }

    #[test]
    fn from_config_normalizes_host() {
        let index =
            PineconeIndex::from_config(&index_config(Some("idx.svc.pinecone.io/"), Some("k")), None)
                .unwrap();
        assert_eq!(index.host(), "https://idx.svc.pinecone.io");
        assert_eq!(index.name(), "medicalchatbot");
    }

    const DESCRIBE_RESPONSE: &str = r#"{
        "name": "medicalchatbot",
        "dimension": 384,
        "metric": "cosine",
        "host": "medicalchatbot-abc123.svc.aped-4627-b74a.pinecone.io",
        "spec": {"serverless": {"cloud": "aws", "region": "us-east-1"}},
        "status": {"ready": true, "state": "Ready"}
    }"#;

    #[test]
    fn describe_response_yields_host() {
        assert_eq!(
            host_from_describe_response(DESCRIBE_RESPONSE).unwrap(),
            "medicalchatbot-abc123.svc.aped-4627-b74a.pinecone.io"
        );
    }

    #[test]
    fn describe_response_without_host_is_unavailable() {
        let err = host_from_describe_response(r#"{"name":"medicalchatbot","status":{"ready":false}}"#)
            .unwrap_err();
        assert!(matches!(err, RagError::RetrievalUnavailable(_)));
    }

    #[test]
    fn host_is_resolved_by_index_name() {
        let server = OneShotServer::reply_json(DESCRIBE_RESPONSE, Duration::ZERO);

        let index =
            PineconeIndex::connect(&index_config(None, Some("pc-test")), &server.url, None).unwrap();

        assert_eq!(
            index.host(),
            "https://medicalchatbot-abc123.svc.aped-4627-b74a.pinecone.io"
        );
        let request = server.received().to_lowercase();
        assert!(request.starts_with("get /indexes/medicalchatbot "));
        assert!(request.contains("api-key: pc-test"));
    }

    #[test]
    fn configured_timeout_bounds_queries() {
        let server = OneShotServer::reply_json(r#"{"matches":[]}"#, Duration::from_millis(1500));
        let index = PineconeIndex::from_config(
            &index_config(Some(&server.url), Some("k")),
            Some(Duration::from_millis(200)),
        )
        .unwrap();

        let err = index.search(&[0.1, 0.2], 3).unwrap_err();
        assert!(matches!(err, RagError::RetrievalUnavailable(_)));
    }

    #[test]
    fn no_timeout_waits_for_slow_index() {
        let server = OneShotServer::reply_json(
            r#"{"matches":[{"score":0.9,"metadata":{"text":"Late answer","source":"Book","page":3}}]}"#,
            Duration::from_millis(800),
        );
        let index =
            PineconeIndex::from_config(&index_config(Some(&server.url), Some("k")), None).unwrap();

        let passages = index.search(&[0.1, 0.2], 3).unwrap();
        assert_eq!(passages[0].text, "Late answer");
        assert_eq!(passages[0].location.as_deref(), Some("3"));
        assert!(server.received().contains("POST /query"));
    }

    #[test]
    fn query_request_uses_camel_case() {
        let body = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 3);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }
}
