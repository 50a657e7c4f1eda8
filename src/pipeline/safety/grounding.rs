use crate::pipeline::terms::TermTable;

/// Phrases a model uses when the retrieved context did not cover the question.
pub const DEFAULT_REFUSAL_PHRASES: &[&str] = &[
    "i don't know",
    "unable to answer",
    "not mentioned",
    "does not mention",
    "no information",
    "not provided",
    "cannot find",
    "unclear",
];

/// Flags grounded answers in which the model hedged or refused.
///
/// This only detects the model's own admission that the evidence was
/// insufficient. A confident answer unsupported by the evidence passes.
#[derive(Debug, Clone)]
pub struct GroundednessVerifier {
    phrases: TermTable,
}

impl GroundednessVerifier {
    pub fn new(phrases: TermTable) -> Self {
        Self { phrases }
    }

    pub fn phrases(&self) -> &TermTable {
        &self.phrases
    }

    /// True when the answer contains any refusal phrase, ignoring case.
    pub fn is_ungrounded(&self, answer: &str) -> bool {
        match self.phrases.first_match(answer) {
            Some(phrase) => {
                tracing::info!(phrase, "Grounded answer flagged as unsupported");
                true
            }
            None => false,
        }
    }
}

impl Default for GroundednessVerifier {
    fn default() -> Self {
        Self::new(TermTable::new(DEFAULT_REFUSAL_PHRASES))
    }
}
