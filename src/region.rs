//! Page-level block location.
//!
//! The sheet carries six printed blocks inside one dominant frame. Raw page
//! boxes are ranked by area; the largest is the frame, the next six are the
//! blocks. Roles are assigned once here and never re-derived from an index
//! elsewhere.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GradeError;
use crate::geometry::Rect;

/// Number of content blocks on a sheet.
pub const CANONICAL_REGION_COUNT: usize = 6;
/// Number of answer blocks among them.
pub const ANSWER_BLOCK_COUNT: usize = 4;

/// Semantic role of a page block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum BlockRole {
    /// Answer block, numbered `1..=4` from left to right.
    Answer(u8),
    Id,
    ExamCode,
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRole::Answer(n) => write!(f, "answer block {n}"),
            BlockRole::Id => f.write_str("ID block"),
            BlockRole::ExamCode => f.write_str("exam-code block"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub bounding_box: Rect,
    pub role: BlockRole,
}

/// The six located blocks with their roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSet {
    id: Region,
    answers: [Region; ANSWER_BLOCK_COUNT],
    exam_code: Region,
}

impl RegionSet {
    pub fn id_block(&self) -> &Region {
        &self.id
    }

    pub fn exam_code_block(&self) -> &Region {
        &self.exam_code
    }

    /// Answer blocks in ascending x order.
    pub fn answer_blocks(&self) -> &[Region] {
        &self.answers
    }

    /// All regions in canonical order: ID, answers 1..=4, exam code.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        std::iter::once(&self.id)
            .chain(self.answers.iter())
            .chain(std::iter::once(&self.exam_code))
    }

    /// Checks the positional assumptions behind the role assignment.
    ///
    /// Every block must be non-degenerate and inside the page, and the
    /// printed blocks must not overlap one another.
    pub fn validate_layout(&self, page_width: u32, page_height: u32) -> Result<(), GradeError> {
        let page = Rect::new(0, 0, page_width as i32, page_height as i32);
        let regions: Vec<&Region> = self.iter().collect();
        for region in &regions {
            if region.bounding_box.is_empty() {
                return Err(GradeError::LayoutAssumptionViolated(format!(
                    "{} has an empty bounding box",
                    region.role
                )));
            }
            if !page.contains_rect(&region.bounding_box) {
                return Err(GradeError::LayoutAssumptionViolated(format!(
                    "{} lies outside the {page_width}x{page_height} page",
                    region.role
                )));
            }
        }
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.bounding_box.intersection(&b.bounding_box).is_some() {
                    return Err(GradeError::LayoutAssumptionViolated(format!(
                        "{} overlaps {}",
                        a.role, b.role
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Ranks raw page boxes and assigns the six block roles.
///
/// Boxes are sorted by descending area (stable), exact duplicates are
/// dropped keeping the first occurrence, the largest box is discarded as
/// the page frame and the next six become, in order: ID block, four answer
/// blocks (re-sorted by x), exam-code block.
pub fn locate_regions(boxes: &[Rect]) -> Result<RegionSet, GradeError> {
    let mut ranked: Vec<Rect> = boxes.to_vec();
    ranked.sort_by(|a, b| b.area().cmp(&a.area()));

    let mut seen = HashSet::new();
    ranked.retain(|r| seen.insert(*r));

    let required = CANONICAL_REGION_COUNT + 1;
    if ranked.len() < required {
        return Err(GradeError::InsufficientRegions {
            found: ranked.len().saturating_sub(1),
            required: CANONICAL_REGION_COUNT,
        });
    }

    let frame = ranked[0];
    let blocks = &ranked[1..required];
    debug!(?frame, ?blocks, "ranked page regions");

    let mut answer_boxes = [blocks[1], blocks[2], blocks[3], blocks[4]];
    answer_boxes.sort_by_key(|r| r.x);

    let answers = std::array::from_fn(|i| Region {
        bounding_box: answer_boxes[i],
        role: BlockRole::Answer(i as u8 + 1),
    });

    Ok(RegionSet {
        id: Region {
            bounding_box: blocks[0],
            role: BlockRole::Id,
        },
        answers,
        exam_code: Region {
            bounding_box: blocks[5],
            role: BlockRole::ExamCode,
        },
    })
}

/// Picks the `count` largest tall boxes that are not nested inside a larger
/// pick, returned left to right. Used for the printed columns inside the ID
/// and exam-code blocks.
pub fn select_tall_sub_blocks(boxes: &[Rect], count: usize) -> Vec<Rect> {
    let mut tall: Vec<Rect> = boxes.iter().copied().filter(Rect::is_tall).collect();
    tall.sort_by(|a, b| b.area().cmp(&a.area()));

    let mut picked: Vec<Rect> = Vec::with_capacity(count);
    for candidate in tall {
        if picked.len() == count {
            break;
        }
        if picked.iter().any(|p| p.contains_rect(&candidate)) {
            continue;
        }
        picked.push(candidate);
    }
    picked.sort_by_key(|r| r.x);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_boxes() -> Vec<Rect> {
        vec![
            Rect::new(320, 600, 140, 360), // answer 3
            Rect::new(0, 0, 1000, 1400),   // frame
            Rect::new(20, 20, 500, 460),   // id
            Rect::new(20, 600, 144, 368),  // answer 1
            Rect::new(560, 20, 130, 350),  // code
            Rect::new(470, 600, 142, 364), // answer 4
            Rect::new(170, 600, 143, 366), // answer 2
        ]
    }

    #[test]
    fn assigns_roles_by_rank_and_x() {
        let set = locate_regions(&sheet_boxes()).expect("six regions");
        assert_eq!(set.id_block().bounding_box, Rect::new(20, 20, 500, 460));
        assert_eq!(set.exam_code_block().bounding_box, Rect::new(560, 20, 130, 350));
        let xs: Vec<i32> = set.answer_blocks().iter().map(|r| r.bounding_box.x).collect();
        assert_eq!(xs, vec![20, 170, 320, 470]);
        let roles: Vec<BlockRole> = set.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                BlockRole::Id,
                BlockRole::Answer(1),
                BlockRole::Answer(2),
                BlockRole::Answer(3),
                BlockRole::Answer(4),
                BlockRole::ExamCode,
            ]
        );
        assert!(set.validate_layout(1000, 1400).is_ok());
    }

    #[test]
    fn duplicates_do_not_count_towards_the_six() {
        let mut boxes = sheet_boxes();
        boxes.truncate(6);
        boxes.push(Rect::new(20, 20, 500, 460));
        let err = locate_regions(&boxes).unwrap_err();
        assert!(matches!(
            err,
            GradeError::InsufficientRegions {
                found: 5,
                required: 6
            }
        ));
    }

    #[test]
    fn extra_small_boxes_are_ignored() {
        let mut boxes = sheet_boxes();
        boxes.push(Rect::new(900, 900, 5, 5));
        boxes.push(Rect::new(910, 900, 4, 4));
        let set = locate_regions(&boxes).expect("six regions");
        assert_eq!(set.exam_code_block().bounding_box, Rect::new(560, 20, 130, 350));
    }

    #[test]
    fn overlapping_blocks_violate_layout() {
        let mut boxes = sheet_boxes();
        boxes[4] = Rect::new(400, 20, 130, 350);
        let set = locate_regions(&boxes).expect("six regions");
        assert!(matches!(
            set.validate_layout(1000, 1400),
            Err(GradeError::LayoutAssumptionViolated(_))
        ));
    }

    #[test]
    fn sub_blocks_skip_wide_and_nested_boxes() {
        let boxes = [
            Rect::new(0, 0, 500, 460),   // block frame, wide
            Rect::new(100, 20, 270, 330), // digits
            Rect::new(102, 22, 266, 326), // digits frame hole
            Rect::new(10, 20, 80, 430),   // letters
            Rect::new(400, 20, 80, 430),  // letters
            Rect::new(120, 40, 24, 24),   // bubble
        ];
        assert_eq!(
            select_tall_sub_blocks(&boxes, 3),
            vec![
                Rect::new(10, 20, 80, 430),
                Rect::new(100, 20, 270, 330),
                Rect::new(400, 20, 80, 430),
            ]
        );
        assert_eq!(select_tall_sub_blocks(&boxes, 1), vec![Rect::new(100, 20, 270, 330)]);
        assert!(select_tall_sub_blocks(&boxes[5..], 1).is_empty());
    }

    #[test]
    fn region_outside_page_violates_layout() {
        let set = locate_regions(&sheet_boxes()).expect("six regions");
        assert!(set.validate_layout(600, 1400).is_err());
    }
}
