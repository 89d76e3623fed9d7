//! Optical mark recognition for printed multiple-choice answer sheets.
//!
//! A scanned page is binarized, its printed blocks are located and given
//! roles (student ID, four answer blocks, exam code), and the bubbles of
//! every block are detected, deduplicated, put in reading order and
//! classified as marked or blank. Sequencers turn the ordered marks into
//! answers, ID characters and exam-code digits.

pub mod config;
pub mod dedup;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod ordering;
pub mod overlay;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod report;
pub mod sequencer;
pub mod synthetic;
pub mod vision;

pub use config::{GradingConfig, ThresholdMethod};
pub use error::GradeError;
pub use geometry::{BubbleCandidate, ClassifiedBubble, Rect};
pub use pipeline::{CircleDetector, PageSegmenter, SheetGrader, SheetResult};
pub use raster::{BinaryImage, ImageView};
pub use vision::grade_image;
