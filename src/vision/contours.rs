use imageproc::contours::{BorderType, Contour, find_contours};

use crate::error::GradeError;
use crate::geometry::Rect;
use crate::pipeline::PageSegmenter;
use crate::raster::{BinaryImage, ImageView};

/// Axis-aligned bounding box of a traced border.
pub fn contour_bounds(contour: &Contour<i32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Traces every border inside `view` and returns the contours in trace
/// order, with coordinates relative to the view.
pub(crate) fn trace_borders(page: &BinaryImage, view: ImageView) -> Vec<Contour<i32>> {
    if view.pixel_count() == 0 {
        return Vec::new();
    }
    find_contours::<i32>(&page.to_gray(view))
}

/// Page segmentation from border following over the binarized page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourSegmenter;

impl PageSegmenter for ContourSegmenter {
    /// Outer borders that no other border encloses.
    fn page_boxes(&self, page: &BinaryImage) -> Result<Vec<Rect>, GradeError> {
        Ok(trace_borders(page, page.full_view())
            .iter()
            .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
            .filter_map(contour_bounds)
            .collect())
    }

    fn boxes_within(&self, page: &BinaryImage, view: ImageView) -> Result<Vec<Rect>, GradeError> {
        Ok(trace_borders(page, view)
            .iter()
            .filter_map(contour_bounds)
            .map(|r| r.translate(view.x as i32, view.y as i32))
            .collect())
    }
}
