//! Annotation shapes describing what was detected on a sheet.
//!
//! Shapes are plain data in page coordinates; [`crate::vision::render_overlay`]
//! rasterizes them onto the scanned page.

use serde::Serialize;

use crate::geometry::{BubbleCandidate, ClassifiedBubble, Rect};
use crate::ordering::Layout;
use crate::pipeline::{SheetResult, SubBlock};
use crate::region::BlockRole;
use crate::sequencer::letter_at;

pub type Rgb = [u8; 3];

pub const ANSWER_COLOR: Rgb = [0, 255, 0];
pub const ID_COLOR: Rgb = [255, 255, 0];
pub const CODE_COLOR: Rgb = [255, 0, 0];
pub const SUB_BLOCK_COLOR: Rgb = [255, 0, 255];
pub const BUBBLE_SQUARE_COLOR: Rgb = [0, 255, 255];
pub const CIRCLE_COLOR: Rgb = [255, 0, 0];
pub const FILLED_COLOR: Rgb = [0, 0, 255];
pub const LABEL_COLOR: Rgb = [0, 160, 0];

/// Offset of a bubble label from the bubble center.
const LABEL_OFFSET: (i32, i32) = (-10, 10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum OverlayShape {
    Rect {
        rect: Rect,
        color: Rgb,
    },
    Circle {
        center_x: i32,
        center_y: i32,
        radius: i32,
        color: Rgb,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub shapes: Vec<OverlayShape>,
}

impl Overlay {
    fn rect(&mut self, rect: Rect, color: Rgb) {
        self.shapes.push(OverlayShape::Rect { rect, color });
    }

    fn bubble(&mut self, bubble: &ClassifiedBubble, label: String) {
        let BubbleCandidate {
            center_x,
            center_y,
            radius,
        } = bubble.candidate;
        self.rect(bubble.candidate.bounding_square(), BUBBLE_SQUARE_COLOR);
        self.shapes.push(OverlayShape::Circle {
            center_x,
            center_y,
            radius,
            color: if bubble.is_filled {
                FILLED_COLOR
            } else {
                CIRCLE_COLOR
            },
        });
        self.shapes.push(OverlayShape::Text {
            x: center_x + LABEL_OFFSET.0,
            y: center_y + LABEL_OFFSET.1,
            text: label,
            color: LABEL_COLOR,
        });
    }

    fn sub_block(&mut self, sub_block: &SubBlock, label: impl Fn(usize) -> String) {
        self.rect(sub_block.bounding_box, SUB_BLOCK_COLOR);
        for (ordinal, bubble) in sub_block.bubbles.iter().enumerate() {
            self.bubble(bubble, label(ordinal));
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

pub fn role_color(role: BlockRole) -> Rgb {
    match role {
        BlockRole::Answer(_) => ANSWER_COLOR,
        BlockRole::Id => ID_COLOR,
        BlockRole::ExamCode => CODE_COLOR,
    }
}

/// Label of an ID bubble: the digit for column-major digit grids, the
/// letter otherwise. Letters past `Z` are unlabelled, as they are never read.
fn id_label(layout: Layout, ordinal: usize) -> String {
    match layout {
        Layout::ColumnMajor { .. } => (ordinal % 10).to_string(),
        Layout::RowMajor { .. } => letter_at(ordinal).map(String::from).unwrap_or_default(),
    }
}

/// Builds the annotation for a graded sheet: block outlines by role,
/// sub-block outlines, and for every bubble its sampled square, its circle
/// and a label (answer ordinal, ID letter or digit).
pub fn build_overlay(result: &SheetResult) -> Overlay {
    let mut overlay = Overlay::default();
    for region in result.regions.iter() {
        overlay.rect(region.bounding_box, role_color(region.role));
    }

    for block in &result.answer_blocks {
        for (ordinal, bubble) in block.bubbles.iter().enumerate() {
            overlay.bubble(bubble, (ordinal + 1).to_string());
        }
    }

    for sub_block in &result.id.sub_blocks {
        overlay.sub_block(sub_block, |ordinal| id_label(sub_block.layout, ordinal));
    }

    overlay.sub_block(&result.exam_code.sub_block, |ordinal| (ordinal % 10).to_string());
    overlay
}
