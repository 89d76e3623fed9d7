//! Per-sheet reports: a JSON document and the numbered console listing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::pipeline::{RegionIssue, SheetResult};
use crate::sequencer::{AnswerRecord, AnswerStatus, CodeDigit, IdMark};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetReport {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
    pub answers: Vec<AnswerRecord>,
    pub id: String,
    pub id_marks: Vec<IdMark>,
    pub exam_code: String,
    pub exam_code_digits: Vec<CodeDigit>,
    pub issues: Vec<RegionIssue>,
}

impl SheetReport {
    pub fn new(result: &SheetResult, source: Option<&Path>) -> Self {
        Self {
            source: source.map(|p| p.display().to_string()),
            answers: result.answers(),
            id: result.id.record.text(),
            id_marks: result.id.record.marks.clone(),
            exam_code: result.exam_code.record.text(),
            exam_code_digits: result.exam_code.record.digits.clone(),
            issues: result.issues.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, GradeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), GradeError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Renders the console listing of one sheet.
///
/// Answer lines are numbered starting at `first_line`; the returned counter
/// is the number for the next line, so a batch keeps one running count
/// across sheets.
pub fn render_text(result: &SheetResult, first_line: usize) -> (String, usize) {
    let mut out = String::new();
    let next_line = result.answers().iter().fold(first_line, |line, record| {
        out.push_str(&answer_line(line, record));
        line + 1
    });
    out.push_str(&format!("ID: {}\n", or_dash(result.id.record.text())));
    out.push_str(&format!("Exam code: {}\n", or_dash(result.exam_code.record.text())));
    for issue in &result.issues {
        out.push_str(&format!("warning: {}: {}\n", issue.role, issue.message));
    }
    (out, next_line)
}

fn answer_line(line: usize, record: &AnswerRecord) -> String {
    format!("{line}.- question {}: {}\n", record.question + 1, describe(record))
}

fn describe(record: &AnswerRecord) -> String {
    match (record.status, record.selection) {
        (AnswerStatus::Answered, Some(letter)) => letter.to_string(),
        (AnswerStatus::Answered, None) => "?".into(),
        (AnswerStatus::Unanswered, _) => "unanswered".into(),
        (AnswerStatus::Invalid, _) => "invalid (multiple marks)".into(),
    }
}

fn or_dash(text: String) -> String {
    if text.is_empty() { "-".into() } else { text }
}
