//! Image preprocessing for OCR.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::models::config::OcrConfig;

/// Grayscale, contrast, and binarization pass applied before recognition.
pub struct ImagePreprocessor {
    /// Binarize after the contrast stretch.
    binarize: bool,
    /// Local window side length for the adaptive threshold.
    block_size: u32,
    /// Offset subtracted from the local mean.
    offset: i32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binarize: config.binarize,
            block_size: config.threshold_block_size.max(3) | 1,
            offset: config.threshold_offset,
        }
    }

    /// Apply enhancement for better OCR.
    pub fn enhance(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let stretched = stretch_contrast(&gray);

        let output = if self.binarize {
            self.adaptive_threshold(&stretched)
        } else {
            stretched
        };

        debug!(
            "Preprocessed {}x{} page (binarize={})",
            output.width(),
            output.height(),
            self.binarize
        );
        DynamicImage::ImageLuma8(output)
    }

    /// Local-mean threshold computed with an integral image.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        let half = (self.block_size / 2) as usize;

        // integral[(y + 1) * (w + 1) + (x + 1)] = sum of pixels above-left of (x, y)
        let stride = w + 1;
        let mut integral = vec![0u64; stride * (h + 1)];
        for y in 0..h {
            let mut row_sum = 0u64;
            for x in 0..w {
                row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
                integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
            }
        }

        GrayImage::from_fn(width, height, |x, y| {
            let (x, y) = (x as usize, y as usize);
            let x0 = x.saturating_sub(half);
            let y0 = y.saturating_sub(half);
            let x1 = (x + half + 1).min(w);
            let y1 = (y + half + 1).min(h);

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((x1 - x0) * (y1 - y0)) as u64;

            let mean = (sum / count) as i32;
            let pixel = i32::from(image.get_pixel(x as u32, y as u32)[0]);

            Luma([if pixel > mean - self.offset { 255 } else { 0 }])
        })
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Linearly stretch intensities to span the full 0..=255 range.
fn stretch_contrast(image: &GrayImage) -> GrayImage {
    let (min, max) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max <= min {
        return image.clone();
    }

    let range = f32::from(max - min);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let scaled = f32::from(pixel[0] - min) * 255.0 / range;
        pixel[0] = scaled.round() as u8;
    }
    out
}
