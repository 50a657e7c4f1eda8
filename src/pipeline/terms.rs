//! Lexical rule tables shared by the query classifier and the groundedness
//! verifier. A table is a list of lowercase terms matched by case-insensitive
//! substring containment; no word boundaries are enforced.

use std::fs;
use std::path::Path;

/// A data-driven list of match terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermTable {
    terms: Vec<String>,
}

impl TermTable {
    /// Build a table from terms. Terms are trimmed and normalized the same way
    /// as matched text; blanks are dropped.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| normalize(t.as_ref().trim()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    /// Parse a newline-delimited term list. `#` starts a comment line.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        )
    }

    /// Load a newline-delimited term list from disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// First term contained anywhere in `text`, ignoring case.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let lower = normalize(text);
        self.terms
            .iter()
            .find(|t| lower.contains(t.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Lowercase and fold typographic apostrophes so "don’t" matches "don't".
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lowercases_and_drops_blanks() {
        let table = TermTable::new(["Pain", "  ", " Fever "]);
        assert_eq!(table.terms(), &["pain".to_string(), "fever".to_string()]);
    }

    #[test]
    fn matches_ignore_case_and_position() {
        let table = TermTable::new(["chest"]);
        assert!(table.matches("My CHEST hurts"));
        assert!(table.matches("chestnut trees"));
        assert!(!table.matches("my back hurts"));
    }

    #[test]
    fn first_match_reports_term_in_table_order() {
        let table = TermTable::new(["fever", "pain"]);
        assert_eq!(table.first_match("pain and fever"), Some("fever"));
    }

    #[test]
    fn typographic_apostrophe_is_folded() {
        let table = TermTable::new(["i don't know"]);
        assert!(table.matches("I don\u{2019}t know the answer"));
    }

    #[test]
    fn typographic_apostrophe_in_term_is_folded() {
        let table = TermTable::parse("i don\u{2019}t know\n");
        assert_eq!(table.terms(), &["i don't know".to_string()]);
        assert!(table.matches("I don\u{2019}t know."));
        assert!(table.matches("I don't know."));
    }

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let table = TermTable::parse("# vitals\nbpm\n\n  Saturation \n# end\n");
        assert_eq!(table.len(), 2);
        assert!(table.matches("oxygen SATURATION"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.txt");
        std::fs::write(&path, "migraine\n").unwrap();
        let table = TermTable::load(&path).unwrap();
        assert!(table.matches("A migraine again"));
    }

    #[test]
    fn empty_table_never_matches() {
        let table = TermTable::new(Vec::<String>::new());
        assert!(table.is_empty());
        assert!(!table.matches("anything"));
    }
}
