use crate::region::BlockRole;

/// Errors raised while locating, sampling or decoding an answer sheet.
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("found {found} usable page regions, need at least {required}")]
    InsufficientRegions { found: usize, required: usize },

    #[error("bubble at ({x}, {y}) with radius {radius} has an empty sample")]
    EmptySample { x: i32, y: i32, radius: i32 },

    #[error("no circles detected in {role}")]
    NoCirclesDetected { role: BlockRole },

    #[error("layout assumption violated: {0}")]
    LayoutAssumptionViolated(String),

    #[error("view {x},{y} {width}x{height} lies outside a {image_width}x{image_height} image")]
    ViewOutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        image_width: u32,
        image_height: u32,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("kornia image error: {0}")]
    Kornia(#[from] kornia::image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl GradeError {
    /// Whether the error only degrades a single bubble or region instead of
    /// invalidating the page.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GradeError::EmptySample { .. } | GradeError::NoCirclesDetected { .. }
        )
    }
}
