use super::types::RetrievalResult;

/// Instruction wrapped around retrieved evidence. The model is told to admit
/// when the context does not cover the question; the groundedness verifier
/// relies on that admission.
pub const GROUNDED_INSTRUCTION: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Constraints for the diagnostic prompt.
pub const DIAGNOSTIC_INSTRUCTION: &str = r#"You are a medical assistant.
ONLY use the provided data.
Do not invent anything.

Return:
- Possible issues
- Risks
- Recommended next step"#;

/// Build the grounded-mode prompt: instruction, passage text in rank order, question.
pub fn build_grounded_prompt(question: &str, evidence: &RetrievalResult) -> String {
    let context = evidence
        .passages
        .iter()
        .map(|p| p.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{GROUNDED_INSTRUCTION}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}

/// Build the free-mode prompt. No evidence is attached.
pub fn build_free_prompt(question: &str) -> String {
    format!("Answer this question: {question}")
}

/// Build the diagnostic prompt around a health summary.
pub fn build_diagnostic_prompt(summary: &str) -> String {
    format!("{DIAGNOSTIC_INSTRUCTION}\n\nDATA:\n{summary}\n")
}
