//! Shared page raster and read-only views into it.
//!
//! The binarized page is stored once behind an `Arc`; every stage works on
//! [`ImageView`] descriptors (offset + extent) and borrows pixels through
//! [`PixelSample`], so no crop can write into another stage's pixels.

use std::sync::Arc;

use image::GrayImage;

use crate::error::GradeError;
use crate::geometry::Rect;

/// Single-channel page buffer where ink is non-zero.
#[derive(Debug, Clone)]
pub struct BinaryImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

/// Rectangular window into a [`BinaryImage`], always inside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageView {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ImageView {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl BinaryImage {
    /// Wraps a row-major buffer of `width * height` bytes.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    pub fn from_gray(gray: &GrayImage) -> Self {
        Self {
            width: gray.width(),
            height: gray.height(),
            pixels: gray.as_raw().clone().into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    pub fn full_view(&self) -> ImageView {
        ImageView {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// View over `rect`, which must lie entirely within the image.
    pub fn view(&self, rect: Rect) -> Result<ImageView, GradeError> {
        let out_of_bounds = rect.x < 0
            || rect.y < 0
            || rect.width < 0
            || rect.height < 0
            || rect.right() as i64 > self.width as i64
            || rect.bottom() as i64 > self.height as i64;
        if out_of_bounds {
            return Err(GradeError::ViewOutOfBounds {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                image_width: self.width,
                image_height: self.height,
            });
        }
        Ok(ImageView {
            x: rect.x as u32,
            y: rect.y as u32,
            width: rect.width as u32,
            height: rect.height as u32,
        })
    }

    /// View over the part of `rect` that overlaps the image; may be empty.
    pub fn clipped_view(&self, rect: Rect) -> ImageView {
        let bounds = Rect::new(0, 0, self.width as i32, self.height as i32);
        match bounds.intersection(&rect) {
            Some(r) => ImageView {
                x: r.x as u32,
                y: r.y as u32,
                width: r.width as u32,
                height: r.height as u32,
            },
            None => ImageView {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
        }
    }

    pub fn sample(&self, view: ImageView) -> PixelSample<'_> {
        PixelSample { image: self, view }
    }

    /// Copies a view out as an owned `GrayImage` for contour tracing.
    pub fn to_gray(&self, view: ImageView) -> GrayImage {
        let mut out = Vec::with_capacity(view.pixel_count());
        for row in self.sample(view).rows() {
            out.extend_from_slice(row);
        }
        // Length matches `width * height` by construction.
        GrayImage::from_raw(view.width, view.height, out).unwrap_or_default()
    }
}

/// Borrowed pixels of one view.
#[derive(Debug, Clone, Copy)]
pub struct PixelSample<'a> {
    image: &'a BinaryImage,
    view: ImageView,
}

impl<'a> PixelSample<'a> {
    pub fn view(&self) -> ImageView {
        self.view
    }

    pub fn pixel_count(&self) -> usize {
        self.view.pixel_count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let image = self.image;
        let view = self.view;
        let stride = image.width as usize;
        (view.y..view.y + view.height).map(move |y| {
            let start = y as usize * stride + view.x as usize;
            &image.pixels[start..start + view.width as usize]
        })
    }

    /// Number of pixels strictly brighter than `threshold`.
    pub fn count_above(&self, threshold: u8) -> usize {
        self.rows()
            .map(|row| row.iter().filter(|&&px| px > threshold).count())
            .sum()
    }
}
