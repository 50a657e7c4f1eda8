use super::types::Classification;
use crate::pipeline::terms::TermTable;

/// Terms that route a question into the grounded pipeline.
///
/// Matching is substring containment, so "head" also matches "ahead" and
/// "arm" matches "alarm". Borderline questions therefore land in the grounded
/// path rather than in free generation.
pub const DEFAULT_DOMAIN_TERMS: &[&str] = &[
    "pain", "symptom", "disease", "health", "medicine", "diagnosis",
    "treatment", "fever", "heart", "oxygen", "temperature", "blood",
    "infection", "illness", "fracture", "broken", "broke", "break",
    "injury", "sprain", "bpm", "pressure", "saturation",
    "leg", "arm", "bone", "head", "chest", "stomach", "hurt", "emergency", "help",
];

/// Decides whether a question is medical.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    vocabulary: TermTable,
}

impl QueryClassifier {
    pub fn new(vocabulary: TermTable) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &TermTable {
        &self.vocabulary
    }

    /// Classify a question. Pure and infallible.
    pub fn classify(&self, question: &str) -> Classification {
        let hit = self.vocabulary.first_match(question);
        if let Some(term) = hit {
            tracing::debug!(term, "Question matched domain vocabulary");
        }
        Classification {
            in_domain: hit.is_some(),
        }
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(TermTable::new(DEFAULT_DOMAIN_TERMS))
    }
}
