//! Mapping text matches back to page rectangles

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::analyzer::{Match, TextMatcher};
use crate::content::TextExtractor;
use crate::types::Rect;

/// A match together with every rectangle it is rendered in
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedMatch {
    pub matched: Match,
    pub rects: Vec<Rect>,
}

/// Runs `matcher` over the page text and locates each occurrence.
///
/// The same span may appear once per pattern that matched it.
pub fn locate_matches<P, M>(page: &P, matcher: &M) -> Vec<LocatedMatch>
where
    P: TextExtractor + ?Sized,
    M: TextMatcher + ?Sized,
{
    let located: Vec<LocatedMatch> = matcher
        .find_matches(page.extract_text())
        .into_iter()
        .map(|matched| {
            let rects = page.locate(&matched.text);
            trace!(kind = %matched.kind, rects = rects.len(), "match located");
            LocatedMatch { matched, rects }
        })
        .collect();

    debug!(matches = located.len(), "identifier matches located");
    located
}

/// Flattens located rectangles in first-seen order, dropping exact repeats.
pub fn candidate_rects(located: &[LocatedMatch]) -> Vec<Rect> {
    let mut seen = HashSet::new();
    located
        .iter()
        .flat_map(|m| m.rects.iter().copied())
        .filter(|rect| seen.insert(rect.key()))
        .collect()
}
