use std::fmt;

use log::warn;
use regex::{Regex, RegexBuilder};

use crate::cache::MatchSpan;

/// Stable identity of a logical row: the declared primary-key value, never a
/// display position. Positions shift under sort, filter and paging; keys do
/// not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(value) => write!(f, "{value}"),
            RowKey::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RowKey {
    fn from(value: i64) -> Self {
        RowKey::Int(value)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        RowKey::Text(value.to_string())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        RowKey::Text(value)
    }
}

/// What the user asked to find, with the comparison modes that shape the scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchTerm {
    pub text: String,
    pub case_sensitive: bool,
    pub exact_match: bool,
}

impl SearchTerm {
    pub fn new(text: impl Into<String>, case_sensitive: bool, exact_match: bool) -> Self {
        Self {
            text: text.into(),
            case_sensitive,
            exact_match,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A term compiled for repeated matching against cell text.
///
/// The pattern is always a literal: the term is escaped before compilation,
/// so user input is never interpreted as a regular expression. Matching runs
/// against the original cell text, which keeps the reported byte offsets
/// valid for rendering regardless of case folding.
pub struct TermMatcher {
    pattern: Option<Regex>,
}

impl TermMatcher {
    pub fn compile(term: &SearchTerm) -> Self {
        if term.text.is_empty() {
            return Self { pattern: None };
        }

        let mut source = regex::escape(&term.text);
        if term.exact_match {
            source = format!("^(?:{source})$");
        }

        let pattern = match RegexBuilder::new(&source)
            .case_insensitive(!term.case_sensitive)
            .build()
        {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                // Escaped literals only fail to compile past the size limit.
                warn!("search term rejected by matcher: {err}");
                None
            }
        };

        Self { pattern }
    }

    pub fn has_pattern(&self) -> bool {
        self.pattern.is_some()
    }

    /// Non-overlapping spans of the term within `text`, left to right. In
    /// exact mode there is at most one span and it covers the entire text.
    pub fn find_spans(&self, text: &str) -> Vec<MatchSpan> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        if text.is_empty() {
            return Vec::new();
        }

        pattern
            .find_iter(text)
            .map(|m| MatchSpan {
                start: m.start(),
                len: m.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(term: &SearchTerm, text: &str) -> Vec<MatchSpan> {
        TermMatcher::compile(term).find_spans(text)
    }

    #[test]
    fn test_substring_spans() {
        let term = SearchTerm::new("hello", false, false);
        let found = spans(&term, "hello world, hello!");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], MatchSpan { start: 0, len: 5 });
        assert_eq!(found[1], MatchSpan { start: 13, len: 5 });
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let term = SearchTerm::new("director", false, false);
        assert_eq!(spans(&term, "Director").len(), 1);
    }

    #[test]
    fn test_case_sensitive() {
        let term = SearchTerm::new("director", true, false);
        assert!(spans(&term, "Director").is_empty());
        assert_eq!(spans(&term, "director").len(), 1);
    }

    #[test]
    fn test_exact_match_requires_entire_text() {
        let term = SearchTerm::new("Developer", false, true);
        assert!(spans(&term, "Software Developer").is_empty());

        let term = SearchTerm::new("Software Developer", false, true);
        let found = spans(&term, "Software Developer");
        assert_eq!(found, vec![MatchSpan { start: 0, len: 18 }]);
    }

    #[test]
    fn test_exact_match_folds_case() {
        let term = SearchTerm::new("director", false, true);
        assert_eq!(spans(&term, "Director").len(), 1);

        let term = SearchTerm::new("director", true, true);
        assert!(spans(&term, "Director").is_empty());
    }

    #[test]
    fn test_occurrences_do_not_overlap() {
        let term = SearchTerm::new("aa", false, false);
        let found = spans(&term, "aaaa");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[1].start, 2);
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let term = SearchTerm::new("1.5", false, false);
        assert!(spans(&term, "125").is_empty());
        assert_eq!(spans(&term, "1.5").len(), 1);
    }

    #[test]
    fn test_empty_term_has_no_pattern() {
        let term = SearchTerm::new("", false, false);
        let matcher = TermMatcher::compile(&term);
        assert!(!matcher.has_pattern());
        assert!(matcher.find_spans("anything").is_empty());
    }

    #[test]
    fn test_empty_text_never_matches() {
        let term = SearchTerm::new("x", false, false);
        assert!(spans(&term, "").is_empty());
    }
}
