//! Redaction engine
//!
//! Locating identifier matches on a page, filtering them through the
//! protected label band, planning shrunk fills and burning them into the
//! page content.

pub mod applier;
pub mod exclusion;
pub mod locator;
pub mod planner;

pub use applier::{rewrite_content, ContentRedactor, RedactionApplier};
pub use exclusion::ExclusionZone;
pub use locator::{candidate_rects, locate_matches, LocatedMatch};
pub use planner::{plan, PlanPolicy};
