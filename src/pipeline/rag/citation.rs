use super::types::{RetrievalResult, SourceCitation, UNKNOWN_LOCATION, UNKNOWN_ORIGIN};

/// Turn retrieved passages into client citations.
///
/// One citation per passage, in retrieval rank order. Missing provenance
/// falls back to `"Unknown"` / `"N/A"`. No deduplication or re-sorting.
pub fn citations_from_evidence(evidence: &RetrievalResult) -> Vec<SourceCitation> {
    evidence
        .passages
        .iter()
        .map(|p| SourceCitation {
            book: p.origin.clone().unwrap_or_else(|| UNKNOWN_ORIGIN.to_string()),
            page: p.location.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        })
        .collect()
}
