//! Turns ordered, classified bubbles into answers, ID characters and exam
//! code digits.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::ClassifiedBubble;

const DIGIT_BASE: usize = 10;
const ALPHABET_LEN: usize = 26;

/// Outcome of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    /// Left blank between two answered questions.
    Unanswered,
    /// More than one option marked.
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Zero-based question number across the whole sheet.
    pub question: usize,
    pub selection: Option<char>,
    pub status: AnswerStatus,
}

impl AnswerRecord {
    fn answered(question: usize, letter: char) -> Self {
        Self {
            question,
            selection: Some(letter),
            status: AnswerStatus::Answered,
        }
    }

    fn unanswered(question: usize) -> Self {
        Self {
            question,
            selection: None,
            status: AnswerStatus::Unanswered,
        }
    }
}

pub(crate) fn letter_at(index: usize) -> Option<char> {
    if index >= ALPHABET_LEN {
        return None;
    }
    char::from_u32('A' as u32 + index as u32)
}

/// Stateful walk over one answer block.
///
/// Every `options_per_question` consecutive bubbles form one question.
/// Filled bubbles emit `Answered` records; a second mark in the same
/// question turns the earlier record `Invalid`; a gap of exactly one
/// question between two marks emits an `Unanswered` record for it. Longer
/// gaps are not reconstructed.
#[derive(Debug, Clone)]
pub struct AnswerSequencer {
    question_offset: usize,
    options_per_question: usize,
    previous_filled: Option<usize>,
    records: Vec<AnswerRecord>,
}

impl AnswerSequencer {
    /// `question_offset` is the number of questions in the blocks before
    /// this one.
    pub fn new(question_offset: usize, options_per_question: usize) -> Self {
        Self {
            question_offset,
            options_per_question: options_per_question.max(1),
            previous_filled: None,
            records: Vec::new(),
        }
    }

    /// Feeds the bubble with block ordinal `ordinal`.
    pub fn push(&mut self, ordinal: usize, is_filled: bool) {
        if !is_filled {
            return;
        }
        if let Some(previous) = self.previous_filled
            && ordinal <= previous
        {
            warn!(ordinal, previous, "ordinal out of reading order, skipped");
            return;
        }
        let per = self.options_per_question;
        let question = ordinal / per;
        let Some(letter) = letter_at(ordinal % per) else {
            warn!(ordinal, "option index has no letter");
            return;
        };

        match self.previous_filled {
            None => self.emit(AnswerRecord::answered(question, letter)),
            Some(previous) if question == previous / per => {
                let global = self.question_offset + question;
                if let Some(last) = self.records.last_mut()
                    && last.question == global
                {
                    debug!(question = global, "multiple marks");
                    last.status = AnswerStatus::Invalid;
                    last.selection = None;
                }
            }
            Some(previous) => {
                let previous_question = previous / per;
                if question.checked_sub(previous_question) == Some(2) {
                    self.emit(AnswerRecord::unanswered(previous_question + 1));
                }
                self.emit(AnswerRecord::answered(question, letter));
            }
        }
        self.previous_filled = Some(ordinal);
    }

    fn emit(&mut self, mut record: AnswerRecord) {
        record.question += self.question_offset;
        self.records.push(record);
    }

    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn finish(self) -> Vec<AnswerRecord> {
        self.records
    }
}

/// Sequences a whole ordered answer block.
pub fn sequence_answers(
    bubbles: &[ClassifiedBubble],
    question_offset: usize,
    options_per_question: usize,
) -> Vec<AnswerRecord> {
    let mut sequencer = AnswerSequencer::new(question_offset, options_per_question);
    for (ordinal, bubble) in bubbles.iter().enumerate() {
        sequencer.push(ordinal, bubble.is_filled);
    }
    sequencer.finish()
}

/// Adds an `Unanswered` record for every question of
/// `question_offset..question_offset + question_count` that has none.
pub fn fill_blank_questions(
    records: &[AnswerRecord],
    question_offset: usize,
    question_count: usize,
) -> Vec<AnswerRecord> {
    let mut out = Vec::with_capacity(records.len().max(question_count));
    let mut pending = records.iter().peekable();
    for question in question_offset..question_offset + question_count {
        let mut found = false;
        while let Some(record) = pending.next_if(|r| r.question <= question) {
            found |= record.question == question;
            out.push(*record);
        }
        if !found {
            out.push(AnswerRecord::unanswered(question));
        }
    }
    out.extend(pending.copied());
    out
}

/// Column of the ID block a mark came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSubBlock {
    LeadingLetters,
    Digits,
    TrailingLetters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdMark {
    pub sub_block: IdSubBlock,
    /// Ordinal of the bubble within its sub-block.
    pub position: usize,
    pub symbol: char,
}

/// Marked characters of the student-ID block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRecord {
    pub marks: Vec<IdMark>,
}

impl IdRecord {
    pub fn letters(&self) -> impl Iterator<Item = &IdMark> {
        self.marks.iter().filter(|m| m.sub_block != IdSubBlock::Digits)
    }

    pub fn digits(&self) -> impl Iterator<Item = &IdMark> {
        self.marks.iter().filter(|m| m.sub_block == IdSubBlock::Digits)
    }

    /// Letters followed by digits, in reading order.
    pub fn text(&self) -> String {
        self.letters().chain(self.digits()).map(|m| m.symbol).collect()
    }
}

/// Collects ID marks; no per-slot multiple-mark detection.
#[derive(Debug, Clone, Default)]
pub struct IdSequencer {
    record: IdRecord,
}

impl IdSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Letter sub-block: ordinal `n` reads as `'A' + n`.
    pub fn push_letters(&mut self, sub_block: IdSubBlock, bubbles: &[ClassifiedBubble]) {
        for (position, bubble) in bubbles.iter().enumerate() {
            if !bubble.is_filled {
                continue;
            }
            match letter_at(position) {
                Some(symbol) => self.record.marks.push(IdMark {
                    sub_block,
                    position,
                    symbol,
                }),
                None => warn!(position, "marked bubble past the end of the alphabet"),
            }
        }
    }

    /// Digit sub-block: ordinal `n` reads as `n mod 10`.
    pub fn push_digits(&mut self, bubbles: &[ClassifiedBubble]) {
        for (position, bubble) in bubbles.iter().enumerate() {
            if bubble.is_filled {
                self.record.marks.push(IdMark {
                    sub_block: IdSubBlock::Digits,
                    position,
                    symbol: digit_symbol(position),
                });
            }
        }
    }

    pub fn finish(self) -> IdRecord {
        self.record
    }
}

fn digit_symbol(position: usize) -> char {
    char::from_digit((position % DIGIT_BASE) as u32, DIGIT_BASE as u32).unwrap_or('?')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeDigit {
    pub position: usize,
    pub digit: u8,
}

impl CodeDigit {
    /// Printed column of the digit, ten bubbles per column.
    pub fn column(&self) -> usize {
        self.position / DIGIT_BASE
    }
}

/// Marked digits of the exam-code block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub digits: Vec<CodeDigit>,
}

impl CodeRecord {
    pub fn text(&self) -> String {
        self.digits
            .iter()
            .map(|d| {
                char::from_digit(u32::from(d.digit), DIGIT_BASE as u32).unwrap_or('?')
            })
            .collect()
    }
}

/// Collects exam-code digits from the column-major digit grid.
#[derive(Debug, Clone, Default)]
pub struct CodeSequencer {
    record: CodeRecord,
}

impl CodeSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_digits(&mut self, bubbles: &[ClassifiedBubble]) {
        for (position, bubble) in bubbles.iter().enumerate() {
            if bubble.is_filled {
                self.record.digits.push(CodeDigit {
                    position,
                    digit: (position % DIGIT_BASE) as u8,
                });
            }
        }
    }

    pub fn finish(self) -> CodeRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BubbleCandidate;

    fn bubbles(filled: &[usize], count: usize) -> Vec<ClassifiedBubble> {
        (0..count)
            .map(|i| {
                let is_filled = filled.contains(&i);
                ClassifiedBubble {
                    candidate: BubbleCandidate::new(i as i32 * 10, 0, 4),
                    fill_ratio: if is_filled { 80.0 } else { 0.0 },
                    is_filled,
                }
            })
            .collect()
    }

    fn answered(question: usize, letter: char) -> AnswerRecord {
        AnswerRecord::answered(question, letter)
    }

    #[test]
    fn single_mark_in_eleven_rows() {
        let records = sequence_answers(&bubbles(&[5], 44), 0, 4);
        assert_eq!(records, vec![answered(1, 'B')]);
    }

    #[test]
    fn one_skipped_question_is_reported() {
        let records = sequence_answers(&bubbles(&[0, 8], 16), 0, 4);
        assert_eq!(
            records,
            vec![answered(0, 'A'), AnswerRecord::unanswered(1), answered(2, 'A')]
        );
    }

    #[test]
    fn two_skipped_questions_are_not_reconstructed() {
        let records = sequence_answers(&bubbles(&[1, 14], 16), 0, 4);
        assert_eq!(records, vec![answered(0, 'B'), answered(3, 'C')]);
    }

    #[test]
    fn second_mark_invalidates_the_question() {
        let records = sequence_answers(&bubbles(&[4, 6, 9], 12), 0, 4);
        assert_eq!(
            records,
            vec![
                AnswerRecord {
                    question: 1,
                    selection: None,
                    status: AnswerStatus::Invalid,
                },
                answered(2, 'B'),
            ]
        );
    }

    #[test]
    fn triple_mark_stays_invalid() {
        let records = sequence_answers(&bubbles(&[0, 1, 3], 4), 0, 4);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AnswerStatus::Invalid);
    }

    #[test]
    fn offset_shifts_every_record() {
        let records = sequence_answers(&bubbles(&[2, 11], 12), 11, 4);
        assert_eq!(
            records,
            vec![answered(11, 'C'), AnswerRecord::unanswered(12), answered(13, 'D')]
        );
    }

    #[test]
    fn no_marks_no_records() {
        assert!(sequence_answers(&bubbles(&[], 44), 0, 4).is_empty());
        assert!(sequence_answers(&[], 0, 4).is_empty());
    }

    #[test]
    fn blank_policy_fills_every_gap_in_order() {
        let records = vec![answered(11, 'A'), answered(14, 'D')];
        let filled = fill_blank_questions(&records, 11, 5);
        let questions: Vec<(usize, AnswerStatus)> =
            filled.iter().map(|r| (r.question, r.status)).collect();
        assert_eq!(
            questions,
            vec![
                (11, AnswerStatus::Answered),
                (12, AnswerStatus::Unanswered),
                (13, AnswerStatus::Unanswered),
                (14, AnswerStatus::Answered),
                (15, AnswerStatus::Unanswered),
            ]
        );
    }

    #[test]
    fn blank_policy_keeps_existing_unanswered_records() {
        let records = sequence_answers(&bubbles(&[0, 8], 12), 0, 4);
        let filled = fill_blank_questions(&records, 0, 3);
        assert_eq!(filled, records);
    }

    #[test]
    fn id_letters_then_digits() {
        let mut seq = IdSequencer::new();
        seq.push_letters(IdSubBlock::LeadingLetters, &bubbles(&[2], 26));
        seq.push_letters(IdSubBlock::TrailingLetters, &bubbles(&[25], 26));
        seq.push_digits(&bubbles(&[3, 10, 29], 80));
        let record = seq.finish();
        assert_eq!(record.text(), "CZ309");
        let positions: Vec<usize> = record.digits().map(|m| m.position).collect();
        assert_eq!(positions, vec![3, 10, 29]);
    }

    #[test]
    fn id_letters_past_z_are_dropped() {
        let mut seq = IdSequencer::new();
        seq.push_letters(IdSubBlock::LeadingLetters, &bubbles(&[26], 28));
        assert!(seq.finish().marks.is_empty());
    }

    #[test]
    fn code_digits_wrap_per_column() {
        let mut seq = CodeSequencer::new();
        seq.push_digits(&bubbles(&[7, 10, 25], 30));
        let record = seq.finish();
        assert_eq!(record.text(), "705");
        let columns: Vec<usize> = record.digits.iter().map(|d| d.column()).collect();
        assert_eq!(columns, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_order_ordinal_is_skipped() {
        let mut seq = AnswerSequencer::new(0, 4);
        seq.push(12, true);
        seq.push(0, true);
        seq.push(12, true);
        assert_eq!(seq.finish(), vec![answered(3, 'A')]);
    }

    #[test]
    fn code_digit_out_of_range_reads_as_placeholder() {
        let json = r#"{"digits":[{"position":0,"digit":250},{"position":11,"digit":1}]}"#;
        let record: CodeRecord = serde_json::from_str(json).expect("valid record");
        assert_eq!(record.text(), "?1");
    }
}
