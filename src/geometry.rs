//! Plain geometric records shared by every stage of the grader.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area in pixels; degenerate boxes report zero.
    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            return 0;
        }
        self.width as i64 * self.height as i64
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// Taller than wide, the shape of ID and exam-code columns.
    pub fn is_tall(&self) -> bool {
        self.width < self.height
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A raw circular detection: center and radius in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BubbleCandidate {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: i32,
}

impl BubbleCandidate {
    pub const fn new(center_x: i32, center_y: i32, radius: i32) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }

    /// Square circumscribing the bubble: side `2 * radius`, anchored at
    /// `center - radius`.
    pub fn bounding_square(&self) -> Rect {
        let side = self.radius * 2;
        Rect::new(
            self.center_x - self.radius,
            self.center_y - self.radius,
            side,
            side,
        )
    }

    pub fn distance_to(&self, other: &BubbleCandidate) -> f64 {
        let dx = (self.center_x - other.center_x) as f64;
        let dy = (self.center_y - other.center_y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn translate(&self, dx: i32, dy: i32) -> BubbleCandidate {
        BubbleCandidate::new(self.center_x + dx, self.center_y + dy, self.radius)
    }
}

/// A candidate after its pixel sample has been measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedBubble {
    pub candidate: BubbleCandidate,
    /// Percentage of "on" pixels in the bounding square, `0..=100`.
    pub fill_ratio: f64,
    pub is_filled: bool,
}
