//! Reading order of bubbles inside one block.
//!
//! Bubbles are grouped into bands along the primary axis (rows for
//! row-major, columns for column-major). A band starts at the lowest
//! remaining coordinate and takes every bubble within `tolerance` of that
//! start; bands are read in order, each one along the secondary axis.
//! Banding keeps the comparison a total order, which a plain
//! "equal within tolerance" comparator is not.

use serde::{Deserialize, Serialize};

use crate::geometry::BubbleCandidate;

/// Reading order of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// Rows top to bottom, each row left to right. Answer and letter blocks.
    RowMajor { y_tolerance: i32 },
    /// Columns left to right, each column top to bottom. Digit blocks.
    ColumnMajor { x_tolerance: i32 },
}

impl Layout {
    fn tolerance(&self) -> i32 {
        match *self {
            Layout::RowMajor { y_tolerance } => y_tolerance,
            Layout::ColumnMajor { x_tolerance } => x_tolerance,
        }
    }

    /// `(primary, secondary)` coordinates of a bubble.
    fn axes(&self, c: &BubbleCandidate) -> (i32, i32) {
        match self {
            Layout::RowMajor { .. } => (c.center_y, c.center_x),
            Layout::ColumnMajor { .. } => (c.center_x, c.center_y),
        }
    }
}

/// Orders `bubbles` into the block's canonical reading order.
pub fn order_bubbles(bubbles: &[BubbleCandidate], layout: Layout) -> Vec<BubbleCandidate> {
    bands(bubbles, layout).into_iter().flatten().collect()
}

/// Groups `bubbles` into the rows (or columns) of the block, each band
/// already in reading order.
pub fn bands(bubbles: &[BubbleCandidate], layout: Layout) -> Vec<Vec<BubbleCandidate>> {
    let mut sorted = bubbles.to_vec();
    sorted.sort_by_key(|c| {
        let (primary, secondary) = layout.axes(c);
        (primary, secondary, c.radius)
    });

    let tolerance = layout.tolerance().max(0);
    let mut out: Vec<Vec<BubbleCandidate>> = Vec::new();
    let mut band_start = 0;

    for c in sorted {
        let primary = layout.axes(&c).0;
        match out.last_mut() {
            Some(band) if primary - band_start <= tolerance => band.push(c),
            _ => {
                band_start = primary;
                out.push(vec![c]);
            }
        }
    }

    for band in &mut out {
        band.sort_by_key(|c| {
            let (primary, secondary) = layout.axes(c);
            (secondary, primary, c.radius)
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> BubbleCandidate {
        BubbleCandidate::new(x, y, 12)
    }

    #[test]
    fn row_major_reads_jittered_rows_left_to_right() {
        let bubbles = [c(90, 52), c(10, 48), c(50, 10), c(10, 14), c(90, 8), c(50, 55)];
        let ordered = order_bubbles(&bubbles, Layout::RowMajor { y_tolerance: 10 });
        assert_eq!(
            ordered,
            vec![c(10, 14), c(50, 10), c(90, 8), c(10, 48), c(50, 55), c(90, 52)]
        );
    }

    #[test]
    fn column_major_reads_columns_top_to_bottom() {
        let bubbles = [c(42, 0), c(0, 30), c(40, 30), c(2, 0), c(0, 60), c(38, 60)];
        let ordered = order_bubbles(&bubbles, Layout::ColumnMajor { x_tolerance: 20 });
        assert_eq!(
            ordered,
            vec![c(2, 0), c(0, 30), c(0, 60), c(42, 0), c(40, 30), c(38, 60)]
        );
    }

    #[test]
    fn coordinates_past_the_tolerance_start_a_new_band() {
        let bubbles = [c(0, 0), c(100, 11), c(50, 5)];
        let ordered = order_bubbles(&bubbles, Layout::RowMajor { y_tolerance: 10 });
        assert_eq!(ordered, vec![c(0, 0), c(50, 5), c(100, 11)]);
        let rows = bands(&bubbles, Layout::RowMajor { y_tolerance: 10 });
        assert_eq!(rows, vec![vec![c(0, 0), c(50, 5)], vec![c(100, 11)]]);
    }

    #[test]
    fn order_ignores_input_permutation() {
        let a = [c(10, 10), c(30, 12), c(10, 40), c(30, 38)];
        let b = [a[3], a[1], a[2], a[0]];
        let layout = Layout::RowMajor { y_tolerance: 10 };
        assert_eq!(order_bubbles(&a, layout), order_bubbles(&b, layout));
    }

    #[test]
    fn coordinate_exactly_at_the_tolerance_joins_the_band() {
        let bubbles = [c(0, 20), c(50, 10), c(0, 0)];
        let rows = bands(&bubbles, Layout::RowMajor { y_tolerance: 10 });
        assert_eq!(rows, vec![vec![c(0, 0), c(50, 10)], vec![c(0, 20)]]);
    }
}
