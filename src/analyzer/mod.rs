//! Text analysis for identifier detection
//!
//! Holds the compiled identifier catalog and the matching trait the rest of
//! the pipeline is written against.

pub mod patterns;

pub use self::patterns::{
    IdentifierFamily, Match, Pattern, PatternCatalog, PatternKind, TextMatcher,
};
