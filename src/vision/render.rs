use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;

use crate::overlay::{Overlay, OverlayShape, Rgb};

fn rgba([r, g, b]: Rgb) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Draws `overlay` over a copy of the scanned page.
///
/// Text shapes carry their position and content for consumers that can set
/// type; they are not rasterized here.
pub fn render_overlay(page: &DynamicImage, overlay: &Overlay) -> RgbaImage {
    let mut canvas = page.to_rgba8();
    for shape in &overlay.shapes {
        match shape {
            OverlayShape::Rect { rect, color } => {
                if rect.width <= 0 || rect.height <= 0 {
                    continue;
                }
                let outline =
                    PixelRect::at(rect.x, rect.y).of_size(rect.width as u32, rect.height as u32);
                draw_hollow_rect_mut(&mut canvas, outline, rgba(*color));
            }
            OverlayShape::Circle {
                center_x,
                center_y,
                radius,
                color,
            } => {
                draw_hollow_circle_mut(
                    &mut canvas,
                    (*center_x, *center_y),
                    *radius,
                    rgba(*color),
                );
            }
            OverlayShape::Text { .. } => {}
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn outlines_are_drawn_in_shape_colors() {
        let page = DynamicImage::new_rgb8(40, 40);
        let overlay = Overlay {
            shapes: vec![
                OverlayShape::Rect {
                    rect: Rect::new(2, 2, 10, 10),
                    color: [0, 255, 0],
                },
                OverlayShape::Circle {
                    center_x: 25,
                    center_y: 25,
                    radius: 5,
                    color: [255, 0, 0],
                },
                OverlayShape::Text {
                    x: 0,
                    y: 0,
                    text: "A".into(),
                    color: [0, 0, 255],
                },
            ],
        };
        let canvas = render_overlay(&page, &overlay);
        assert_eq!(canvas.get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(30, 25), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }
}
