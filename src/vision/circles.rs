use tracing::trace;

use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::geometry::BubbleCandidate;
use crate::pipeline::CircleDetector;
use crate::raster::{BinaryImage, ImageView};

use super::contours::{contour_bounds, trace_borders};

/// Longest-to-shortest side ratio still accepted as a circle outline.
const MAX_ASPECT: f64 = 1.25;

/// Finds printed bubbles as near-square traced borders whose inscribed
/// radius falls in `min_radius..=max_radius`.
///
/// Both the outer and the inner border of a ring are reported, so callers
/// are expected to dedup the candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourCircleDetector {
    pub min_radius: i32,
    pub max_radius: i32,
    pub max_aspect: f64,
}

impl ContourCircleDetector {
    pub fn new(min_radius: i32, max_radius: i32) -> Self {
        Self {
            min_radius,
            max_radius,
            max_aspect: MAX_ASPECT,
        }
    }

    pub fn from_config(config: &GradingConfig) -> Self {
        Self::new(config.min_bubble_radius, config.max_bubble_radius)
    }
}

impl CircleDetector for ContourCircleDetector {
    fn detect(
        &self,
        page: &BinaryImage,
        view: ImageView,
    ) -> Result<Vec<BubbleCandidate>, GradeError> {
        let mut out = Vec::new();
        for contour in trace_borders(page, view) {
            let Some(bounds) = contour_bounds(&contour) else {
                continue;
            };
            let long = bounds.width.max(bounds.height) as f64;
            let short = bounds.width.min(bounds.height) as f64;
            if short <= 0.0 || long / short > self.max_aspect {
                continue;
            }
            let radius = (bounds.width + bounds.height) / 4;
            if radius < self.min_radius || radius > self.max_radius {
                continue;
            }
            out.push(BubbleCandidate::new(
                view.x as i32 + bounds.x + bounds.width / 2,
                view.y as i32 + bounds.y + bounds.height / 2,
                radius,
            ));
        }
        trace!(?view, candidates = out.len(), "circle candidates");
        Ok(out)
    }
}
