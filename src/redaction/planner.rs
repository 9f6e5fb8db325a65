//! Turning candidate rectangles into fill instructions

use tracing::debug;

use super::ExclusionZone;
use crate::config::RedactionConfig;
use crate::types::{Color, RedactionInstruction, Rect};

/// Shrink and fill settings applied to every surviving rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanPolicy {
    pub shrink_ratio: f64,
    pub fill: Color,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            shrink_ratio: 0.1,
            fill: Color::BLACK,
        }
    }
}

impl From<&RedactionConfig> for PlanPolicy {
    fn from(config: &RedactionConfig) -> Self {
        Self {
            shrink_ratio: config.shrink_ratio,
            fill: config.fill,
        }
    }
}

/// Drops rectangles in the protected band and shrinks the rest from the top.
pub fn plan(rects: &[Rect], zone: &ExclusionZone, policy: &PlanPolicy) -> Vec<RedactionInstruction> {
    let instructions: Vec<RedactionInstruction> = rects
        .iter()
        .filter(|rect| !zone.excludes(rect))
        .map(|rect| RedactionInstruction {
            rect: rect.shrink_top(policy.shrink_ratio),
            fill: policy.fill,
        })
        .collect();

    debug!(
        candidates = rects.len(),
        planned = instructions.len(),
        "redactions planned"
    );
    instructions
}
