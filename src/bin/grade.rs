use clap::{ArgGroup, Parser};
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use omr_grader::overlay::build_overlay;
use omr_grader::report::{SheetReport, render_text};
use omr_grader::vision::{binarize_page, default_grader, render_overlay};
use omr_grader::GradingConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "grade",
    about = "Read answers, student ID and exam code from scanned answer sheets",
    version,
    group(ArgGroup::new("input").required(true).args(["dir", "image"]))
)]
struct Cli {
    /// Directory containing scanned sheets
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// A single scanned sheet
    #[arg(short = 'i', long = "image")]
    image: Option<PathBuf>,

    /// JSON file overriding grading parameters
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write `<stem>_report.json` next to the outputs
    #[arg(long = "json", short = 'j')]
    json: bool,

    /// Write `<stem>_overlay.png` with the detections drawn on the page
    #[arg(long = "overlay", short = 'o')]
    overlay: bool,

    /// Output directory for reports and overlays
    #[arg(long = "out", default_value = ".")]
    out: PathBuf,
}

/// Extensions of scans the grader opens from a directory.
const SCAN_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

fn is_scan(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SCAN_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

fn collect_images(cli: &Cli) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    if let Some(image) = &cli.image {
        return Ok(vec![image.clone()]);
    }
    let Some(dir) = &cli.dir else {
        return Ok(Vec::new());
    };
    if !dir.is_dir() {
        return Err(format!("Not a directory: {}", dir.display()).into());
    }
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_scan(p))
        .collect();
    images.sort();
    Ok(images)
}

fn output_path(out: &Path, source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("sheet");
    out.join(format!("{stem}_{suffix}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GradingConfig::from_json_file(path)?,
        None => GradingConfig::default(),
    };

    let images = collect_images(&cli)?;
    if images.is_empty() {
        eprintln!("No images found");
        return Ok(());
    }
    if cli.json || cli.overlay {
        fs::create_dir_all(&cli.out)?;
    }

    let grader = default_grader(config.clone());
    let mut line = 1;
    let mut failures = 0usize;

    for image_path in &images {
        let img = match image::open(image_path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Failed to open {}: {e}", image_path.display());
                failures += 1;
                continue;
            }
        };

        let result = binarize_page(&img, config.threshold_method)
            .and_then(|page| grader.grade(&page));
        let result = match result {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %image_path.display(), error = %e, "sheet skipped");
                eprintln!("Grading failed for {}: {e}", image_path.display());
                failures += 1;
                continue;
            }
        };

        let (text, next_line) = render_text(&result, line);
        line = next_line;
        println!("== {}", image_path.display());
        print!("{text}");

        if cli.json {
            let out_json = output_path(&cli.out, image_path, "report.json");
            let report = SheetReport::new(&result, Some(image_path));
            if let Err(e) = report.write_json(&out_json) {
                eprintln!("Failed to write report {}: {e}", out_json.display());
            }
        }

        if cli.overlay {
            let out_overlay = output_path(&cli.out, image_path, "overlay.png");
            let canvas = render_overlay(&img, &build_overlay(&result));
            if let Err(e) = canvas.save(&out_overlay) {
                eprintln!("Failed to save overlay {}: {e}", out_overlay.display());
            }
        }
    }

    info!(sheets = images.len(), failures, "done");
    Ok(())
}
