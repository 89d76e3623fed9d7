use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;

const FILL_THRESHOLD_PERCENT: f64 = 65.0;
const SAMPLE_LUMA_THRESHOLD: u8 = 127;
const OVERLAP_FACTOR: f64 = 0.5;
const ANSWER_ROW_TOLERANCE: i32 = 10;
const ID_TOLERANCE: i32 = 20;
const CODE_TOLERANCE: i32 = 20;
const OPTIONS_PER_QUESTION: usize = 4;
const QUESTIONS_PER_BLOCK: usize = 11;
const MIN_BUBBLE_RADIUS: i32 = 30;
const MAX_BUBBLE_RADIUS: i32 = 38;

/// How the page threshold is chosen before contour extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    Triangle,
    Otsu,
}

/// Tunable parameters for grading one sheet.
///
/// Defaults reproduce the printed layout the grader was calibrated on:
/// four answer blocks of eleven four-option questions, a three-column ID
/// block and a single-column exam code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    pub fill_threshold_percent: f64,
    pub sample_luma_threshold: u8,
    pub overlap_factor: f64,
    pub answer_row_tolerance: i32,
    pub id_tolerance: i32,
    pub code_tolerance: i32,
    pub options_per_question: usize,
    pub questions_per_block: usize,
    pub min_bubble_radius: i32,
    pub max_bubble_radius: i32,
    pub threshold_method: ThresholdMethod,
    /// Materialise every question missing from a block as `Unanswered`.
    pub report_blank_questions: bool,
    pub parallel_regions: bool,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            fill_threshold_percent: FILL_THRESHOLD_PERCENT,
            sample_luma_threshold: SAMPLE_LUMA_THRESHOLD,
            overlap_factor: OVERLAP_FACTOR,
            answer_row_tolerance: ANSWER_ROW_TOLERANCE,
            id_tolerance: ID_TOLERANCE,
            code_tolerance: CODE_TOLERANCE,
            options_per_question: OPTIONS_PER_QUESTION,
            questions_per_block: QUESTIONS_PER_BLOCK,
            min_bubble_radius: MIN_BUBBLE_RADIUS,
            max_bubble_radius: MAX_BUBBLE_RADIUS,
            threshold_method: ThresholdMethod::Triangle,
            report_blank_questions: false,
            parallel_regions: true,
        }
    }
}

impl GradingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GradeError> {
        let config: GradingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, GradeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Bubbles sequenced per answer block.
    pub fn bubbles_per_block(&self) -> usize {
        self.questions_per_block * self.options_per_question
    }

    fn validate(&self) -> Result<(), GradeError> {
        if self.options_per_question == 0 || self.options_per_question > 26 {
            return Err(GradeError::LayoutAssumptionViolated(format!(
                "options_per_question must be within 1..=26, got {}",
                self.options_per_question
            )));
        }
        if self.min_bubble_radius > self.max_bubble_radius {
            return Err(GradeError::LayoutAssumptionViolated(format!(
                "bubble radius window {}..={} is empty",
                self.min_bubble_radius, self.max_bubble_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GradingConfig::from_json_str(
            r#"{ "fill_threshold_percent": 50.0, "threshold_method": "otsu" }"#,
        )
        .expect("parse");
        assert_eq!(config.fill_threshold_percent, 50.0);
        assert_eq!(config.threshold_method, ThresholdMethod::Otsu);
        assert_eq!(config.questions_per_block, 11);
        assert_eq!(config.bubbles_per_block(), 44);
    }

    #[test]
    fn empty_radius_window_is_rejected() {
        let err = GradingConfig::from_json_str(
            r#"{ "min_bubble_radius": 40, "max_bubble_radius": 10 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, GradeError::LayoutAssumptionViolated(_)));
    }
}
