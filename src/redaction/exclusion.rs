//! Protected label band

use tracing::debug;

use crate::content::TextExtractor;
use crate::types::Rect;

/// Horizontal cutoff derived from the protected label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionZone {
    cutoff: Option<f64>,
    margin: f64,
}

impl ExclusionZone {
    /// A zone that excludes nothing.
    pub fn none() -> Self {
        Self {
            cutoff: None,
            margin: 0.0,
        }
    }

    pub fn with_cutoff(cutoff: f64, margin: f64) -> Self {
        Self {
            cutoff: Some(cutoff),
            margin,
        }
    }

    /// Places the cutoff at the lowest top edge among the label's
    /// occurrences on `page`.
    pub fn resolve<P: TextExtractor + ?Sized>(page: &P, label: &str, margin: f64) -> Self {
        let cutoff = page
            .locate(label)
            .iter()
            .map(|r| r.y0)
            .reduce(f64::max);

        match cutoff {
            Some(cutoff) => {
                debug!(cutoff, margin, "protected label found");
                Self::with_cutoff(cutoff, margin)
            }
            None => {
                debug!("protected label absent");
                Self::none()
            }
        }
    }

    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// True when `rect` falls in the protected band.
    pub fn excludes(&self, rect: &Rect) -> bool {
        match self.cutoff {
            Some(cutoff) => rect.y0 > cutoff - self.margin,
            None => false,
        }
    }
}
