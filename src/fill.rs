use tracing::trace;

use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::geometry::{BubbleCandidate, ClassifiedBubble};
use crate::raster::{BinaryImage, PixelSample};

/// Decides whether a bubble is marked from the ink inside its bounding square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillClassifier {
    /// Pixels strictly above this value count as ink.
    pub luma_threshold: u8,
    /// Minimum fill percentage for a bubble to count as marked.
    pub filled_percent: f64,
}

impl Default for FillClassifier {
    fn default() -> Self {
        Self::from_config(&GradingConfig::default())
    }
}

impl FillClassifier {
    pub fn from_config(config: &GradingConfig) -> Self {
        Self {
            luma_threshold: config.sample_luma_threshold,
            filled_percent: config.fill_threshold_percent,
        }
    }

    /// Percentage of ink pixels in `sample`, `0.0..=100.0`.
    pub fn fill_ratio(&self, sample: &PixelSample<'_>) -> Result<f64, GradeError> {
        let total = sample.pixel_count();
        if total == 0 {
            let view = sample.view();
            return Err(GradeError::EmptySample {
                x: view.x as i32,
                y: view.y as i32,
                radius: 0,
            });
        }
        let on = sample.count_above(self.luma_threshold);
        Ok(on as f64 / total as f64 * 100.0)
    }

    pub fn is_filled(&self, fill_ratio: f64) -> bool {
        fill_ratio >= self.filled_percent
    }

    /// Samples the bubble's bounding square (clipped to the page) and
    /// classifies it. A degenerate square is reported as `EmptySample`.
    pub fn measure(
        &self,
        page: &BinaryImage,
        candidate: BubbleCandidate,
    ) -> Result<ClassifiedBubble, GradeError> {
        let view = page.clipped_view(candidate.bounding_square());
        let fill_ratio = self
            .fill_ratio(&page.sample(view))
            .map_err(|_| GradeError::EmptySample {
                x: candidate.center_x,
                y: candidate.center_y,
                radius: candidate.radius,
            })?;
        trace!(?candidate, fill_ratio, "measured bubble");
        Ok(ClassifiedBubble {
            candidate,
            fill_ratio,
            is_filled: self.is_filled(fill_ratio),
        })
    }

    /// Like [`measure`](Self::measure), but an empty sample degrades to an
    /// unfilled bubble with ratio zero.
    pub fn classify(&self, page: &BinaryImage, candidate: BubbleCandidate) -> ClassifiedBubble {
        match self.measure(page, candidate) {
            Ok(bubble) => bubble,
            Err(err) => {
                trace!(%err, "treating bubble as unfilled");
                ClassifiedBubble {
                    candidate,
                    fill_ratio: 0.0,
                    is_filled: false,
                }
            }
        }
    }
}
