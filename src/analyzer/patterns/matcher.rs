//! Pattern matching over extracted page text

use std::ops::Range;

use super::{PatternCatalog, PatternKind};

/// A located occurrence of a pattern in page text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Exact matched substring
    pub text: String,
    /// Byte span within the page text
    pub span: Range<usize>,
    /// Pattern that produced the match
    pub kind: PatternKind,
}

/// Anything that produces identifier matches from plain text
pub trait TextMatcher {
    /// Every match, grouped by pattern in catalog order, non-overlapping
    /// within each pattern.
    fn find_matches(&self, text: &str) -> Vec<Match>;

    /// Cheap existence check.
    fn is_match(&self, text: &str) -> bool {
        !self.find_matches(text).is_empty()
    }
}

impl TextMatcher for PatternCatalog {
    fn find_matches(&self, text: &str) -> Vec<Match> {
        self.patterns()
            .iter()
            .flat_map(|pattern| {
                pattern.regex().find_iter(text).map(move |m| Match {
                    text: m.as_str().to_string(),
                    span: m.range(),
                    kind: pattern.kind(),
                })
            })
            .collect()
    }

    fn is_match(&self, text: &str) -> bool {
        self.patterns().iter().any(|p| p.regex().is_match(text))
    }
}
