//! Sheet grading pipeline.
//!
//! The grader only consumes geometry: page boxes, boxes inside a block and
//! circle candidates come from the [`PageSegmenter`] and [`CircleDetector`]
//! collaborators, pixels come from the shared [`BinaryImage`]. Regions are
//! graded independently (optionally on the rayon pool) and reassembled by
//! role, so the output never depends on completion order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GradingConfig;
use crate::dedup::dedup_bubbles;
use crate::error::GradeError;
use crate::fill::FillClassifier;
use crate::geometry::{BubbleCandidate, ClassifiedBubble, Rect};
use crate::ordering::{Layout, order_bubbles};
use crate::raster::{BinaryImage, ImageView};
use crate::region::{BlockRole, Region, RegionSet, locate_regions, select_tall_sub_blocks};
use crate::sequencer::{
    AnswerRecord, CodeRecord, CodeSequencer, IdRecord, IdSequencer, IdSubBlock,
    fill_blank_questions, sequence_answers,
};

/// Printed columns of the ID block, left to right.
const ID_COLUMNS: [IdSubBlock; 3] = [
    IdSubBlock::LeadingLetters,
    IdSubBlock::Digits,
    IdSubBlock::TrailingLetters,
];

/// Contour extraction over the binarized page.
pub trait PageSegmenter: Sync {
    /// Bounding boxes of the outermost shapes on the page.
    fn page_boxes(&self, page: &BinaryImage) -> Result<Vec<Rect>, GradeError>;

    /// Bounding boxes of every shape inside `view`, in page coordinates.
    fn boxes_within(&self, page: &BinaryImage, view: ImageView) -> Result<Vec<Rect>, GradeError>;
}

/// Circle detection inside one view. Candidates are in page coordinates and
/// in a stable detector order.
pub trait CircleDetector: Sync {
    fn detect(
        &self,
        page: &BinaryImage,
        view: ImageView,
    ) -> Result<Vec<BubbleCandidate>, GradeError>;
}

/// A problem confined to one region; the rest of the sheet was graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionIssue {
    pub role: BlockRole,
    pub message: String,
}

/// Ordered, classified bubbles of one printed column or block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubBlock {
    pub bounding_box: Rect,
    pub layout: Layout,
    pub bubbles: Vec<ClassifiedBubble>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerBlockResult {
    pub region: Region,
    /// Questions numbered before this block.
    pub question_offset: usize,
    pub bubbles: Vec<ClassifiedBubble>,
    pub records: Vec<AnswerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdBlockResult {
    pub region: Region,
    pub sub_blocks: Vec<SubBlock>,
    pub record: IdRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBlockResult {
    pub region: Region,
    pub sub_block: SubBlock,
    pub record: CodeRecord,
}

/// Everything decoded from one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    pub page_width: u32,
    pub page_height: u32,
    pub regions: RegionSet,
    pub answer_blocks: Vec<AnswerBlockResult>,
    pub id: IdBlockResult,
    pub exam_code: CodeBlockResult,
    pub issues: Vec<RegionIssue>,
}

impl SheetResult {
    /// Answer records of all blocks in block order.
    pub fn answers(&self) -> Vec<AnswerRecord> {
        self.answer_blocks
            .iter()
            .flat_map(|b| b.records.iter().copied())
            .collect()
    }
}

pub struct SheetGrader<S, D> {
    segmenter: S,
    detector: D,
    classifier: FillClassifier,
    config: GradingConfig,
}

impl<S: PageSegmenter, D: CircleDetector> SheetGrader<S, D> {
    pub fn new(segmenter: S, detector: D, config: GradingConfig) -> Self {
        Self {
            segmenter,
            detector,
            classifier: FillClassifier::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &GradingConfig {
        &self.config
    }

    /// Grades a binarized page.
    ///
    /// Missing or misplaced blocks, and any failure in the ID or exam-code
    /// block, fail the page. An answer block that cannot be read is
    /// reported in [`SheetResult::issues`] with no records.
    pub fn grade(&self, page: &BinaryImage) -> Result<SheetResult, GradeError> {
        let boxes = self.segmenter.page_boxes(page)?;
        debug!(count = boxes.len(), "page boxes");
        let regions = locate_regions(&boxes)?;
        regions.validate_layout(page.width(), page.height())?;

        let answer_regions = regions.answer_blocks();
        let (answer_outcomes, (id, exam_code)) = if self.config.parallel_regions {
            rayon::join(
                || {
                    answer_regions
                        .par_iter()
                        .map(|r| self.read_answer_block(page, r))
                        .collect::<Vec<_>>()
                },
                || {
                    rayon::join(
                        || self.read_id_block(page, regions.id_block()),
                        || self.read_code_block(page, regions.exam_code_block()),
                    )
                },
            )
        } else {
            let outcomes = answer_regions
                .iter()
                .map(|r| self.read_answer_block(page, r))
                .collect::<Vec<_>>();
            (
                outcomes,
                (
                    self.read_id_block(page, regions.id_block()),
                    self.read_code_block(page, regions.exam_code_block()),
                ),
            )
        };

        let (id, mut issues) = id?;
        let (exam_code, code_issues) = exam_code?;
        issues.extend(code_issues);

        let mut answer_blocks = Vec::with_capacity(answer_regions.len());
        let total_questions = answer_regions.iter().zip(answer_outcomes).fold(
            0usize,
            |question_offset, (region, outcome)| {
                let bubbles = match outcome {
                    Ok(bubbles) => bubbles,
                    Err(err) => {
                        warn!(role = %region.role, %err, "answer block skipped");
                        issues.push(RegionIssue {
                            role: region.role,
                            message: err.to_string(),
                        });
                        Vec::new()
                    }
                };
                answer_blocks.push(self.sequence_block(*region, question_offset, bubbles));
                question_offset + self.config.questions_per_block
            },
        );

        info!(
            questions = total_questions,
            answers = answer_blocks.iter().map(|b| b.records.len()).sum::<usize>(),
            id = %id.record.text(),
            code = %exam_code.record.text(),
            issues = issues.len(),
            "graded sheet"
        );

        Ok(SheetResult {
            page_width: page.width(),
            page_height: page.height(),
            regions,
            answer_blocks,
            id,
            exam_code,
            issues,
        })
    }

    fn sequence_block(
        &self,
        region: Region,
        question_offset: usize,
        bubbles: Vec<ClassifiedBubble>,
    ) -> AnswerBlockResult {
        let mut records =
            sequence_answers(&bubbles, question_offset, self.config.options_per_question);
        if self.config.report_blank_questions {
            records =
                fill_blank_questions(&records, question_offset, self.config.questions_per_block);
        }
        AnswerBlockResult {
            region,
            question_offset,
            bubbles,
            records,
        }
    }

    fn read_answer_block(
        &self,
        page: &BinaryImage,
        region: &Region,
    ) -> Result<Vec<ClassifiedBubble>, GradeError> {
        let layout = Layout::RowMajor {
            y_tolerance: self.config.answer_row_tolerance,
        };
        let bubbles = self.read_bubbles(
            page,
            region.bounding_box,
            region.role,
            layout,
            self.config.bubbles_per_block(),
        )?;
        debug!(role = %region.role, bubbles = bubbles.len(), "read answer block");
        Ok(bubbles)
    }

    fn read_id_block(
        &self,
        page: &BinaryImage,
        region: &Region,
    ) -> Result<(IdBlockResult, Vec<RegionIssue>), GradeError> {
        let view = page.view(region.bounding_box)?;
        let boxes = self.segmenter.boxes_within(page, view)?;
        let columns = select_tall_sub_blocks(&boxes, ID_COLUMNS.len());
        if columns.len() < ID_COLUMNS.len() {
            return Err(GradeError::LayoutAssumptionViolated(format!(
                "{} holds {} columns, expected {}",
                region.role,
                columns.len(),
                ID_COLUMNS.len()
            )));
        }

        let kinds = ID_COLUMNS;
        let mut issues = Vec::new();
        let mut sub_blocks = Vec::with_capacity(kinds.len());
        let mut sequencer = IdSequencer::new();
        for (kind, column) in kinds.into_iter().zip(columns) {
            let layout = match kind {
                IdSubBlock::Digits => Layout::ColumnMajor {
                    x_tolerance: self.config.id_tolerance,
                },
                _ => Layout::RowMajor {
                    y_tolerance: self.config.id_tolerance,
                },
            };
            let bubbles = self.read_column(page, column, region.role, layout, &mut issues)?;
            match kind {
                IdSubBlock::Digits => sequencer.push_digits(&bubbles),
                letters => sequencer.push_letters(letters, &bubbles),
            }
            sub_blocks.push(SubBlock {
                bounding_box: column,
                layout,
                bubbles,
            });
        }

        Ok((
            IdBlockResult {
                region: *region,
                sub_blocks,
                record: sequencer.finish(),
            },
            issues,
        ))
    }

    fn read_code_block(
        &self,
        page: &BinaryImage,
        region: &Region,
    ) -> Result<(CodeBlockResult, Vec<RegionIssue>), GradeError> {
        let view = page.view(region.bounding_box)?;
        let boxes = self.segmenter.boxes_within(page, view)?;
        let Some(column) = select_tall_sub_blocks(&boxes, 1).into_iter().next() else {
            return Err(GradeError::LayoutAssumptionViolated(format!(
                "{} has no digit column",
                region.role
            )));
        };

        let layout = Layout::ColumnMajor {
            x_tolerance: self.config.code_tolerance,
        };
        let mut issues = Vec::new();
        let bubbles = self.read_column(page, column, region.role, layout, &mut issues)?;
        let mut sequencer = CodeSequencer::new();
        sequencer.push_digits(&bubbles);

        Ok((
            CodeBlockResult {
                region: *region,
                sub_block: SubBlock {
                    bounding_box: column,
                    layout,
                    bubbles,
                },
                record: sequencer.finish(),
            },
            issues,
        ))
    }

    /// Reads one column; a column without circles is an issue, not a failure.
    fn read_column(
        &self,
        page: &BinaryImage,
        column: Rect,
        role: BlockRole,
        layout: Layout,
        issues: &mut Vec<RegionIssue>,
    ) -> Result<Vec<ClassifiedBubble>, GradeError> {
        match self.read_bubbles(page, column, role, layout, usize::MAX) {
            Ok(bubbles) => Ok(bubbles),
            Err(err) if err.is_recoverable() => {
                warn!(%role, ?column, error = %err, "column unreadable");
                issues.push(RegionIssue {
                    role,
                    message: err.to_string(),
                });
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Detect, dedup, order, cap at `limit` and classify the bubbles of `rect`.
    fn read_bubbles(
        &self,
        page: &BinaryImage,
        rect: Rect,
        role: BlockRole,
        layout: Layout,
        limit: usize,
    ) -> Result<Vec<ClassifiedBubble>, GradeError> {
        let view = page.view(rect)?;
        let raw = self.detector.detect(page, view)?;
        if raw.is_empty() {
            return Err(GradeError::NoCirclesDetected { role });
        }
        let unique = dedup_bubbles(&raw, self.config.overlap_factor);
        let mut ordered = order_bubbles(&unique, layout);
        if ordered.len() > limit {
            debug!(%role, found = ordered.len(), limit, "dropping bubbles past the last row");
            ordered.truncate(limit);
        }
        Ok(ordered
            .into_iter()
            .map(|c| self.classifier.classify(page, c))
            .collect())
    }
}
