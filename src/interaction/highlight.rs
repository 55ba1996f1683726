use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightMode {
    #[default]
    Substring,
    Fuzzy,
}

pub(super) struct LabelMatcher {
    mode: HighlightMode,
    query: String,
    lowered_query: String,
    fuzzy: SkimMatcherV2,
}

impl LabelMatcher {
    /// The query is matched as typed; surrounding whitespace is significant.
    pub(super) fn new(mode: HighlightMode, query: &str) -> Self {
        Self {
            mode,
            query: query.to_owned(),
            lowered_query: query.to_lowercase(),
            fuzzy: SkimMatcherV2::default(),
        }
    }

    /// An empty or whitespace-only query matches nothing.
    pub(super) fn matches(&self, label: &str) -> bool {
        if self.query.trim().is_empty() {
            return false;
        }

        match self.mode {
            HighlightMode::Substring => label.to_lowercase().contains(&self.lowered_query),
            HighlightMode::Fuzzy => self
                .fuzzy
                .fuzzy_match(label, &self.query)
                .or_else(|| {
                    self.fuzzy
                        .fuzzy_match(&label.to_lowercase(), &self.lowered_query)
                })
                .is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_is_case_insensitive() {
        let matcher = LabelMatcher::new(HighlightMode::Substring, "RuSt");
        assert!(matcher.matches("The Rust Book"));
        assert!(matcher.matches("trustworthy"));
        assert!(!matcher.matches("Go by Example"));
    }

    #[test]
    fn surrounding_whitespace_is_part_of_the_query() {
        let matcher = LabelMatcher::new(HighlightMode::Substring, "rust ");
        assert!(matcher.matches("The Rust Book"));
        assert!(!matcher.matches("trustworthy"));
        assert!(!matcher.matches("Rust"));

        let matcher = LabelMatcher::new(HighlightMode::Substring, " go");
        assert!(matcher.matches("Learn Go"));
        assert!(!matcher.matches("Go by Example"));
    }

    #[test]
    fn empty_query_matches_nothing() {
        let matcher = LabelMatcher::new(HighlightMode::Substring, "   ");
        assert!(!matcher.matches("anything"));
        let matcher = LabelMatcher::new(HighlightMode::Fuzzy, "");
        assert!(!matcher.matches("anything"));
        let matcher = LabelMatcher::new(HighlightMode::Fuzzy, " \t ");
        assert!(!matcher.matches("a b\tc"));
    }

    #[test]
    fn fuzzy_accepts_scattered_characters() {
        let matcher = LabelMatcher::new(HighlightMode::Fuzzy, "rsbk");
        assert!(matcher.matches("Rust Book"));
        assert!(!LabelMatcher::new(HighlightMode::Substring, "rsbk").matches("Rust Book"));
        assert!(!matcher.matches("Python"));
    }
}
