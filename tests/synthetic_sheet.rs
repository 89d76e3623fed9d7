use image::DynamicImage;
use omr_grader::overlay::build_overlay;
use omr_grader::report::{SheetReport, render_text};
use omr_grader::sequencer::{AnswerRecord, AnswerStatus, IdSubBlock};
use omr_grader::synthetic::{SheetLayout, SheetMarks, render_sheet, save_sheet};
use omr_grader::vision::{grade_image, render_overlay};

fn marks() -> SheetMarks {
    SheetMarks::new()
        .answer(0, 'B')
        .answer(2, 'D')
        .answer(13, 'A')
        .answer(40, 'C')
        .id_letter(IdSubBlock::LeadingLetters, 'C')
        .id_letter(IdSubBlock::TrailingLetters, 'X')
        .id_digit(0, 1)
        .id_digit(1, 2)
        .code_digit(0, 4)
        .code_digit(1, 0)
        .code_digit(2, 7)
}

#[test]
fn grades_a_generated_sheet() {
    let layout = SheetLayout::standard();
    let image = DynamicImage::ImageRgb8(render_sheet(&layout, &marks()));
    let result = grade_image(&image, &layout.grading_config()).expect("graded");

    let answered = |question, letter| AnswerRecord {
        question,
        selection: Some(letter),
        status: AnswerStatus::Answered,
    };
    assert_eq!(
        result.answers(),
        vec![
            answered(0, 'B'),
            AnswerRecord {
                question: 1,
                selection: None,
                status: AnswerStatus::Unanswered,
            },
            answered(2, 'D'),
            answered(13, 'A'),
            answered(40, 'C'),
        ]
    );
    assert_eq!(result.id.record.text(), "CX12");
    assert_eq!(result.exam_code.record.text(), "407");
    assert!(result.issues.is_empty(), "issues: {:?}", result.issues);
    assert!(result.answer_blocks.iter().all(|b| b.bubbles.len() == 44));
    assert_eq!(result.regions.id_block().bounding_box, layout.id_block);
    assert_eq!(result.regions.exam_code_block().bounding_box, layout.code_block);

    let (text, next_line) = render_text(&result, 1);
    assert_eq!(next_line, 6);
    assert!(text.starts_with("1.- question 1: B\n2.- question 2: unanswered\n"));
    assert!(text.contains("ID: CX12"));
    assert!(text.contains("Exam code: 407"));

    let canvas = render_overlay(&image, &build_overlay(&result));
    assert_eq!(canvas.dimensions(), (layout.width, layout.height));
}

#[test]
fn report_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sheet_path = dir.path().join("sheet.png");
    let layout = SheetLayout::standard();
    save_sheet(&sheet_path, &layout, &marks()).expect("saved");

    let image = image::open(&sheet_path).expect("reopened");
    let result = grade_image(&image, &layout.grading_config()).expect("graded");

    let report_path = dir.path().join("sheet_report.json");
    let report = SheetReport::new(&result, Some(&sheet_path));
    report.write_json(&report_path).expect("written");

    let text = std::fs::read_to_string(&report_path).expect("read back");
    let parsed: SheetReport = serde_json::from_str(&text).expect("valid report");
    assert_eq!(parsed, report);
    assert_eq!(parsed.id, "CX12");
    assert_eq!(parsed.exam_code, "407");
    assert_eq!(parsed.answers.len(), 5);
}

#[test]
fn blank_page_has_no_regions() {
    let image = DynamicImage::new_rgb8(200, 200);
    let err = grade_image(&image, &SheetLayout::standard().grading_config()).unwrap_err();
    assert!(matches!(
        err,
        omr_grader::GradeError::InsufficientRegions { .. }
    ));
}
