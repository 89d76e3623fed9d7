//! Synthetic answer sheets for tests and demos.
//!
//! [`SheetLayout::standard`] describes a small printed sheet: a header
//! banner (the dominant frame), the ID block with two 13x2 letter columns
//! around an 8-column digit grid, a 3-column exam-code block and four
//! answer blocks of eleven four-option questions. Every block is drawn as a
//! triple-line frame, every bubble as a ring; marked bubbles are solid.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;

use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::geometry::Rect;
use crate::ordering::Layout;
use crate::region::ANSWER_BLOCK_COUNT;
use crate::sequencer::IdSubBlock;

pub const BUBBLE_RADIUS: i32 = 12;
const RING_INNER_RADIUS: i32 = 10;
const PITCH: i32 = 32;
const GRID_MARGIN: i32 = 16;
const FRAME_LINES: i32 = 3;

const PAGE_MARGIN: i32 = 20;
const BLOCK_GAP: i32 = 20;
const HEADER_HEIGHT: i32 = 360;
const CODE_MARGIN: i32 = 8;

const OPTIONS: usize = 4;
const QUESTIONS: usize = 11;

const INK: Rgb<u8> = Rgb([0, 0, 0]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

fn grid_extent(cells: usize) -> i32 {
    2 * GRID_MARGIN + 2 * BUBBLE_RADIUS + (cells as i32 - 1) * PITCH
}

/// A framed grid of bubbles read in `order`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleGrid {
    pub frame: Rect,
    pub columns: usize,
    pub rows: usize,
    pub order: Layout,
}

impl BubbleGrid {
    fn at(x: i32, y: i32, columns: usize, rows: usize, order: Layout) -> Self {
        Self {
            frame: Rect::new(x, y, grid_extent(columns), grid_extent(rows)),
            columns,
            rows,
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Center of the bubble at reading-order `ordinal`.
    pub fn center(&self, ordinal: usize) -> (i32, i32) {
        let (column, row) = match self.order {
            Layout::RowMajor { .. } => (ordinal % self.columns, ordinal / self.columns),
            Layout::ColumnMajor { .. } => (ordinal / self.rows, ordinal % self.rows),
        };
        let origin = GRID_MARGIN + BUBBLE_RADIUS;
        (
            self.frame.x + origin + column as i32 * PITCH,
            self.frame.y + origin + row as i32 * PITCH,
        )
    }
}

/// Geometry of the generated sheet, in page pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub width: u32,
    pub height: u32,
    pub header: Rect,
    pub id_block: Rect,
    pub id_columns: [BubbleGrid; 3],
    pub code_block: Rect,
    pub code_grid: BubbleGrid,
    pub answer_blocks: [BubbleGrid; ANSWER_BLOCK_COUNT],
}

impl SheetLayout {
    pub fn standard() -> Self {
        let row_major = Layout::RowMajor { y_tolerance: 0 };
        let column_major = Layout::ColumnMajor { x_tolerance: 0 };

        let header_width = 760;
        let header = Rect::new(PAGE_MARGIN, PAGE_MARGIN, header_width, HEADER_HEIGHT);
        let blocks_y = header.bottom() + BLOCK_GAP;

        let letters_x = PAGE_MARGIN + GRID_MARGIN;
        let inner_y = blocks_y + GRID_MARGIN;
        let leading = BubbleGrid::at(letters_x, inner_y, 2, 13, row_major);
        let digits_x = leading.frame.right() + GRID_MARGIN;
        let digits = BubbleGrid::at(digits_x, inner_y, 8, 10, column_major);
        let trailing_x = digits.frame.right() + GRID_MARGIN;
        let trailing = BubbleGrid::at(trailing_x, inner_y, 2, 13, row_major);
        let id_block = Rect::new(
            PAGE_MARGIN,
            blocks_y,
            trailing.frame.right() + GRID_MARGIN - PAGE_MARGIN,
            leading.frame.height + 2 * GRID_MARGIN,
        );

        let code_x = id_block.right() + BLOCK_GAP;
        let code_grid =
            BubbleGrid::at(code_x + CODE_MARGIN, blocks_y + CODE_MARGIN, 3, 10, column_major);
        let code_block = Rect::new(
            code_x,
            blocks_y,
            code_grid.frame.width + 2 * CODE_MARGIN,
            code_grid.frame.height + 2 * CODE_MARGIN,
        );

        let answers_y = id_block.bottom() + BLOCK_GAP;
        let answer_width = grid_extent(OPTIONS);
        let answer_blocks = std::array::from_fn(|i| {
            BubbleGrid::at(
                PAGE_MARGIN + i as i32 * (answer_width + BLOCK_GAP),
                answers_y,
                OPTIONS,
                QUESTIONS,
                row_major,
            )
        });

        Self {
            width: (header.right() + PAGE_MARGIN) as u32,
            height: (answers_y + grid_extent(QUESTIONS) + PAGE_MARGIN) as u32,
            header,
            id_block,
            id_columns: [leading, digits, trailing],
            code_block,
            code_grid,
            answer_blocks,
        }
    }

    /// Grading parameters matching the generated bubble size.
    pub fn grading_config(&self) -> GradingConfig {
        GradingConfig {
            min_bubble_radius: BUBBLE_RADIUS - 3,
            max_bubble_radius: BUBBLE_RADIUS + 3,
            ..GradingConfig::default()
        }
    }

    fn id_column(&self, sub_block: IdSubBlock) -> &BubbleGrid {
        match sub_block {
            IdSubBlock::LeadingLetters => &self.id_columns[0],
            IdSubBlock::Digits => &self.id_columns[1],
            IdSubBlock::TrailingLetters => &self.id_columns[2],
        }
    }

    fn grids(&self) -> impl Iterator<Item = &BubbleGrid> {
        self.id_columns
            .iter()
            .chain(std::iter::once(&self.code_grid))
            .chain(self.answer_blocks.iter())
    }
}

/// Bubbles to darken, by reading-order ordinal within their grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetMarks {
    answers: Vec<(usize, usize)>,
    id: Vec<(IdSubBlock, usize)>,
    code: Vec<usize>,
}

impl SheetMarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks option `option` (`'A'..`) of zero-based sheet question `question`.
    pub fn answer(mut self, question: usize, option: char) -> Self {
        let ordinal = (question % QUESTIONS) * OPTIONS + letter_index(option);
        self.answers.push((question / QUESTIONS, ordinal));
        self
    }

    pub fn id_letter(mut self, sub_block: IdSubBlock, letter: char) -> Self {
        self.id.push((sub_block, letter_index(letter)));
        self
    }

    pub fn id_digit(mut self, column: usize, digit: u8) -> Self {
        self.id.push((IdSubBlock::Digits, column * 10 + digit as usize));
        self
    }

    pub fn code_digit(mut self, column: usize, digit: u8) -> Self {
        self.code.push(column * 10 + digit as usize);
        self
    }
}

fn letter_index(letter: char) -> usize {
    (letter.to_ascii_uppercase() as usize).saturating_sub('A' as usize)
}

fn draw_frame(image: &mut RgbImage, rect: Rect) {
    for inset in 0..FRAME_LINES {
        let outline = PixelRect::at(rect.x + inset, rect.y + inset).of_size(
            (rect.width - 2 * inset) as u32,
            (rect.height - 2 * inset) as u32,
        );
        draw_hollow_rect_mut(image, outline, INK);
    }
}

fn draw_bubble(image: &mut RgbImage, center: (i32, i32), marked: bool) {
    draw_filled_circle_mut(image, center, BUBBLE_RADIUS, INK);
    if !marked {
        draw_filled_circle_mut(image, center, RING_INNER_RADIUS, PAPER);
    }
}

/// Draws the standard sheet with `marks` filled in.
pub fn render_sheet(layout: &SheetLayout, marks: &SheetMarks) -> RgbImage {
    let mut image = RgbImage::from_pixel(layout.width, layout.height, PAPER);

    draw_frame(&mut image, layout.header);
    draw_frame(&mut image, layout.id_block);
    draw_frame(&mut image, layout.code_block);
    for grid in layout.grids() {
        draw_frame(&mut image, grid.frame);
        for ordinal in 0..grid.len() {
            draw_bubble(&mut image, grid.center(ordinal), false);
        }
    }

    let answer_marks = marks.answers.iter().filter_map(|&(block, ordinal)| {
        layout.answer_blocks.get(block).map(|grid| (grid, ordinal))
    });
    let id_marks = marks
        .id
        .iter()
        .map(|&(sub_block, ordinal)| (layout.id_column(sub_block), ordinal));
    let code_marks = marks.code.iter().map(|&ordinal| (&layout.code_grid, ordinal));
    for (grid, ordinal) in answer_marks.chain(id_marks).chain(code_marks) {
        if ordinal < grid.len() {
            draw_bubble(&mut image, grid.center(ordinal), true);
        }
    }
    image
}

pub fn save_sheet(
    path: &Path,
    layout: &SheetLayout,
    marks: &SheetMarks,
) -> Result<(), GradeError> {
    render_sheet(layout, marks).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_blocks_rank_as_expected() {
        let layout = SheetLayout::standard();
        let answer_area = layout.answer_blocks[0].frame.area();
        assert!(layout.header.area() > layout.id_block.area());
        assert!(layout.id_block.area() > answer_area);
        assert!(answer_area > layout.code_block.area());
        assert!(!layout.id_block.is_tall());
        assert!(layout.id_columns.iter().all(|c| c.frame.is_tall()));
        assert!(layout.code_block.contains_rect(&layout.code_grid.frame));
        let page = Rect::new(0, 0, layout.width as i32, layout.height as i32);
        assert!(layout.answer_blocks.iter().all(|b| page.contains_rect(&b.frame)));
    }

    #[test]
    fn grid_centers_follow_reading_order() {
        let layout = SheetLayout::standard();
        let digits = &layout.id_columns[1];
        let (x0, y0) = digits.center(0);
        assert_eq!(digits.center(1), (x0, y0 + PITCH));
        assert_eq!(digits.center(10), (x0 + PITCH, y0));
        let answers = &layout.answer_blocks[0];
        let (ax, ay) = answers.center(0);
        assert_eq!(answers.center(5), (ax + PITCH, ay + PITCH));
    }

    #[test]
    fn marked_bubbles_are_solid() {
        let layout = SheetLayout::standard();
        let image = render_sheet(&layout, &SheetMarks::new().answer(0, 'B'));
        let (mx, my) = layout.answer_blocks[0].center(1);
        let (ux, uy) = layout.answer_blocks[0].center(0);
        assert_eq!(image.get_pixel(mx as u32, my as u32), &INK);
        assert_eq!(image.get_pixel(ux as u32, uy as u32), &PAPER);
    }
}
