use std::sync::Arc;

use super::citation::citations_from_evidence;
use super::classify::QueryClassifier;
use super::prompt::{build_free_prompt, build_grounded_prompt};
use super::retrieval::EvidenceRetriever;
use super::types::{Classification, FinalResponse, GenerationMode, RetrievalResult};
use super::RagError;
use crate::pipeline::safety::grounding::GroundednessVerifier;

/// Returned in place of a grounded answer the model could not support.
pub const UNGROUNDED_APOLOGY: &str =
    "Sorry, I couldn\u{2019}t find reliable medical information about this in my knowledge base.";

/// Trait for LLM text generation within the pipeline.
///
/// One blocking call per prompt; implementations do not retry.
pub trait LlmGenerate: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

/// Shape the final answer from the routing decision, the raw model output,
/// the evidence it was given and the verifier's verdict.
///
/// | in_domain | ungrounded | answer     | sources            |
/// |-----------|------------|------------|--------------------|
/// | true      | true       | apology    | empty              |
/// | true      | false      | raw answer | evidence, in order |
/// | false     | ignored    | raw answer | empty              |
pub fn compose(
    classification: Classification,
    raw_answer: String,
    evidence: &RetrievalResult,
    ungrounded: bool,
) -> FinalResponse {
    if !classification.in_domain {
        return FinalResponse {
            answer: raw_answer,
            sources: vec![],
        };
    }

    if ungrounded {
        return FinalResponse {
            answer: UNGROUNDED_APOLOGY.to_string(),
            sources: vec![],
        };
    }

    FinalResponse {
        answer: raw_answer,
        sources: citations_from_evidence(evidence),
    }
}

/// Run one generation call, logging the mode it serves.
pub fn generate_with_mode(
    generator: &dyn LlmGenerate,
    mode: GenerationMode,
    prompt: &str,
) -> Result<String, RagError> {
    tracing::debug!(?mode, prompt_chars = prompt.len(), "Invoking language model");
    generator.generate(prompt).inspect_err(|e| {
        tracing::warn!(?mode, error = %e, "Generation failed");
    })
}

/// Question answering pipeline.
///
/// Coordinates: classify → (retrieve → generate → verify) or generate → compose.
/// Holds only shared read-only handles; one instance serves all requests.
#[derive(Clone)]
pub struct AskPipeline {
    classifier: QueryClassifier,
    retriever: EvidenceRetriever,
    generator: Arc<dyn LlmGenerate>,
    verifier: GroundednessVerifier,
}

impl AskPipeline {
    pub fn new(
        classifier: QueryClassifier,
        retriever: EvidenceRetriever,
        generator: Arc<dyn LlmGenerate>,
        verifier: GroundednessVerifier,
    ) -> Self {
        Self {
            classifier,
            retriever,
            generator,
            verifier,
        }
    }

    /// Answer a question.
    ///
    /// A retrieval failure aborts the request before the model is called;
    /// medical questions are never downgraded to free generation.
    pub fn ask(&self, question: &str) -> Result<FinalResponse, RagError> {
        // Step 1: Route
        let classification = self.classifier.classify(question);
        tracing::info!(in_domain = classification.in_domain, "Question classified");

        if !classification.in_domain {
            let raw = self.generate(GenerationMode::Free, &build_free_prompt(question))?;
            return Ok(compose(classification, raw, &RetrievalResult::default(), false));
        }

        // Step 2: Evidence
        let evidence = self.retriever.retrieve(question)?;

        // Step 3: Grounded generation
        let raw = self.generate(
            GenerationMode::Grounded,
            &build_grounded_prompt(question, &evidence),
        )?;

        // Step 4: Verify, then compose
        let ungrounded = self.verifier.is_ungrounded(&raw);
        Ok(compose(classification, raw, &evidence, ungrounded))
    }

    fn generate(&self, mode: GenerationMode, prompt: &str) -> Result<String, RagError> {
        generate_with_mode(self.generator.as_ref(), mode, prompt)
    }
}
