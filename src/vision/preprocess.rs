use image::{DynamicImage, GrayImage};
use imageproc::contrast::{equalize_histogram, otsu_level};
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};
use tracing::debug;

use crate::config::ThresholdMethod;
use crate::error::GradeError;
use crate::raster::BinaryImage;

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

/// Converts a scanned page into a foreground mask: ink is 255, paper is 0.
///
/// The page is reduced to grey, histogram-equalized, thresholded with
/// `method` and flipped so the minority class is the foreground.
pub fn binarize_page(
    source: &DynamicImage,
    method: ThresholdMethod,
) -> Result<BinaryImage, GradeError> {
    let rgb = source.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Ok(BinaryImage::from_gray(&GrayImage::new(width, height)));
    }

    let size = ImageSize {
        width: width as usize,
        height: height as usize,
    };
    let image = CpuImage::<u8, 3>::new(size, rgb.into_raw(), CpuAllocator)?;
    let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
    imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;

    let equalized = match GrayImage::from_raw(width, height, gray.as_slice().to_vec()) {
        Some(grey) => equalize_histogram(&grey),
        None => {
            return Err(GradeError::LayoutAssumptionViolated(format!(
                "grey buffer does not match a {width}x{height} page"
            )));
        }
    };

    let threshold = match method {
        ThresholdMethod::Triangle => triangle_threshold(equalized.as_raw()),
        ThresholdMethod::Otsu => otsu_level(&equalized),
    };
    debug!(?method, threshold, "page threshold");

    let enhanced = CpuImage::<u8, 1>::new(gray.size(), equalized.into_raw(), CpuAllocator)?;
    let mut binary = CpuImage::<u8, 1>::from_size_val(enhanced.size(), 0u8, CpuAllocator)?;
    imgproc::threshold::threshold_binary(&enhanced, &mut binary, threshold, 255)?;

    let mut mask = binary.as_slice().to_vec();
    make_ink_foreground(&mut mask);
    BinaryImage::from_raw(width, height, mask).ok_or_else(|| {
        GradeError::LayoutAssumptionViolated(format!("mask does not match a {width}x{height} page"))
    })
}

/// Flips the mask when the "on" class covers at least half of it; paper
/// always dominates a printed sheet.
fn make_ink_foreground(mask: &mut [u8]) {
    let on = mask.iter().filter(|&&px| px != 0).count();
    if on * 2 < mask.len() {
        return;
    }
    for px in mask.iter_mut() {
        *px = if *px == 0 { 255 } else { 0 };
    }
}

/// Triangle threshold over the grey histogram.
///
/// A line is drawn from the histogram peak to the far end of its longer
/// tail; the threshold is the level whose bin lies furthest from that line.
/// Suits pages where paper forms one dominant peak and ink a thin tail.
pub fn triangle_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0i64; 256];
    for &value in pixels {
        histogram[value as usize] += 1;
    }

    let Some(first) = histogram.iter().position(|&count| count > 0) else {
        return 0;
    };
    let last = histogram.iter().rposition(|&count| count > 0).unwrap_or(first);
    let mut peak = first;
    for level in first..=last {
        if histogram[level] > histogram[peak] {
            peak = level;
        }
    }

    let (tail_end, levels) = if peak - first >= last - peak {
        (first, first..peak)
    } else {
        (last, peak + 1..last + 1)
    };
    if levels.is_empty() {
        return peak as u8;
    }

    let (x0, y0) = (tail_end as i64, histogram[tail_end]);
    let (x1, y1) = (peak as i64, histogram[peak]);
    let mut best = (levels.start, i64::MIN);
    for level in levels {
        let distance = ((y1 - y0) * level as i64 - (x1 - x0) * histogram[level] + x1 * y0
            - y1 * x0)
            .abs();
        if distance > best.1 {
            best = (level, distance);
        }
    }
    best.0 as u8
}
