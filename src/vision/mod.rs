//! Default raster collaborators: page binarization, contour extraction,
//! contour-based circle detection and overlay drawing.

pub mod circles;
pub use circles::ContourCircleDetector;
pub mod contours;
pub use contours::ContourSegmenter;
pub mod preprocess;
pub use preprocess::binarize_page;
pub mod render;
pub use render::render_overlay;

use image::DynamicImage;

use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::pipeline::{SheetGrader, SheetResult};

/// Grader wired to the contour-based collaborators.
pub fn default_grader(config: GradingConfig) -> SheetGrader<ContourSegmenter, ContourCircleDetector> {
    let detector = ContourCircleDetector::from_config(&config);
    SheetGrader::new(ContourSegmenter, detector, config)
}

/// Binarizes `source` and grades it with the default collaborators.
pub fn grade_image(source: &DynamicImage, config: &GradingConfig) -> Result<SheetResult, GradeError> {
    let page = binarize_page(source, config.threshold_method)?;
    default_grader(config.clone()).grade(&page)
}
