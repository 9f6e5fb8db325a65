//! Identifier pattern catalog
//!
//! The catalog is built once at startup and shared read-only by every worker.
//! Order is fixed: strict primary, loose primary, strict secondary, loose
//! secondary.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::error::CatalogError;

pub mod matcher;

pub use matcher::{Match, TextMatcher};

/// Compiled-program ceiling; the catalog expressions need a fraction of it.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Identifier family a pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentifierFamily {
    /// Eleven-digit taxpayer number (CPF shape).
    Primary,
    /// Regional ID number with a check character (RG shape).
    Secondary,
}

/// Tagged catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternKind {
    StrictPrimary,
    LoosePrimary,
    StrictSecondary,
    LooseSecondary,
}

impl PatternKind {
    /// Every kind, in catalog order.
    pub const ALL: [PatternKind; 4] = [
        PatternKind::StrictPrimary,
        PatternKind::LoosePrimary,
        PatternKind::StrictSecondary,
        PatternKind::LooseSecondary,
    ];

    pub fn expression(&self) -> &'static str {
        match self {
            PatternKind::StrictPrimary => r"\b\d{3}\.\d{3}\.\d{3}-\d{2}\b",
            PatternKind::LoosePrimary => r"\b\d{11}\b",
            PatternKind::StrictSecondary => r"\b\d{1,2}\.\d{3}\.\d{3}-[\dxX]\b",
            PatternKind::LooseSecondary => r"\b\d{7,10}[-\s]?[\dxX]?\b",
        }
    }

    pub fn family(&self) -> IdentifierFamily {
        match self {
            PatternKind::StrictPrimary | PatternKind::LoosePrimary => IdentifierFamily::Primary,
            PatternKind::StrictSecondary | PatternKind::LooseSecondary => {
                IdentifierFamily::Secondary
            }
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, PatternKind::StrictPrimary | PatternKind::StrictSecondary)
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::StrictPrimary => "strict-primary",
            PatternKind::LoosePrimary => "loose-primary",
            PatternKind::StrictSecondary => "strict-secondary",
            PatternKind::LooseSecondary => "loose-secondary",
        };
        f.write_str(name)
    }
}

/// A compiled identifier pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    kind: PatternKind,
    regex: Regex,
}

impl Pattern {
    /// Compiles `expression` for `kind`, rejecting anything that could match
    /// an unbounded or empty span.
    pub fn compile(kind: PatternKind, expression: &str) -> Result<Self, CatalogError> {
        if !is_length_bounded(expression) {
            return Err(CatalogError::Unbounded {
                kind,
                expression: expression.to_string(),
            });
        }

        let regex = RegexBuilder::new(expression)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map_err(|source| CatalogError::Compile { kind, source })?;

        if regex.is_match("") {
            return Err(CatalogError::MatchesEmpty { kind });
        }

        Ok(Self { kind, regex })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn family(&self) -> IdentifierFamily {
        self.kind.family()
    }

    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Immutable, ordered set of identifier patterns
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<Pattern>,
}

impl PatternCatalog {
    /// Builds the fixed catalog. Fails fast on a broken expression.
    pub fn compile() -> Result<Self, CatalogError> {
        let patterns = PatternKind::ALL
            .iter()
            .map(|kind| Pattern::compile(*kind, kind.expression()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = patterns.len(), "compiled identifier pattern catalog");
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Rejects unescaped `*`, `+` and open-ended `{n,}` quantifiers.
fn is_length_bounded(expression: &str) -> bool {
    let mut chars = expression.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '*' | '+' if !in_class => return false,
            '{' if !in_class => {
                let mut body = String::new();
                for next in chars.by_ref() {
                    if next == '}' {
                        break;
                    }
                    body.push(next);
                }
                if body.ends_with(',') {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}
