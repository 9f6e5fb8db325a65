// Shared value types for the redaction pipeline

pub mod geometry;
pub mod document;

pub use geometry::*;
pub use document::*;
