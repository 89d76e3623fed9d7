use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use omr_grader::sequencer::IdSubBlock;
use omr_grader::synthetic::{SheetLayout, SheetMarks, save_sheet};

/// Writes a synthetic answer sheet, optionally with marks filled in.
#[derive(Parser, Debug)]
#[command(name = "gen_sheet", version)]
struct Cli {
    /// Output PNG path
    #[arg(short = 'o', long = "out", default_value = "sheet.png")]
    out: PathBuf,

    /// Answers as `question=option`, e.g. `1=B,3=D` (questions start at 1)
    #[arg(short = 'a', long = "answers", value_delimiter = ',')]
    answers: Vec<String>,

    /// Letter marked in the leading ID column
    #[arg(long = "lead")]
    lead: Option<char>,

    /// Letter marked in the trailing ID column
    #[arg(long = "trail")]
    trail: Option<char>,

    /// ID digits, one per column from the left
    #[arg(long = "id-digits", default_value = "")]
    id_digits: String,

    /// Exam code digits, one per column from the left
    #[arg(long = "code", default_value = "")]
    code: String,
}

fn parse_answer(entry: &str) -> Result<(usize, char), String> {
    let (question, option) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected question=option, got {entry:?}"))?;
    let question: usize = question
        .trim()
        .parse()
        .map_err(|e| format!("bad question in {entry:?}: {e}"))?;
    let mut letters = option.trim().chars();
    match (question, letters.next(), letters.next()) {
        (1.., Some(letter), None) if letter.is_ascii_alphabetic() => Ok((question - 1, letter)),
        _ => Err(format!("bad answer {entry:?}")),
    }
}

fn digits(text: &str) -> Result<Vec<u8>, String> {
    text.chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or_else(|| format!("not a digit: {c:?}"))
        })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut marks = SheetMarks::new();
    for entry in cli.answers.iter().filter(|s| !s.is_empty()) {
        let (question, option) = parse_answer(entry)?;
        marks = marks.answer(question, option);
    }
    if let Some(letter) = cli.lead {
        marks = marks.id_letter(IdSubBlock::LeadingLetters, letter);
    }
    if let Some(letter) = cli.trail {
        marks = marks.id_letter(IdSubBlock::TrailingLetters, letter);
    }
    for (column, digit) in digits(&cli.id_digits)?.into_iter().enumerate() {
        marks = marks.id_digit(column, digit);
    }
    for (column, digit) in digits(&cli.code)?.into_iter().enumerate() {
        marks = marks.code_digit(column, digit);
    }

    save_sheet(&cli.out, &SheetLayout::standard(), &marks)?;
    println!("Wrote {}", cli.out.display());
    Ok(())
}
