//! OCR fallback for pages without a usable text layer.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::{PureOcrEngine, create_engine_from_dir};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// A text recognition engine.
pub trait OcrEngine {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize text in a preprocessed page image.
    fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    fn center_y(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (min_y + max_y) / 2.0
    }

    fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        (max_y - min_y).max(1.0)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            processing_time_ms: 0,
            image_size: (width, height),
        }
    }

    /// Group boxes into reading-order lines.
    ///
    /// Boxes are sorted top to bottom; a box joins the current line when its
    /// vertical center lies within `tolerance` times the line's box height.
    /// Boxes within a line are ordered left to right and joined by a space,
    /// which keeps a form's label row on one line.
    pub fn lines(&self, tolerance: f32) -> Vec<String> {
        let mut boxes: Vec<&TextBox> = self
            .boxes
            .iter()
            .filter(|b| !b.text.trim().is_empty())
            .collect();
        boxes.sort_by(|a, b| {
            a.center_y()
                .partial_cmp(&b.center_y())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut rows: Vec<Vec<&TextBox>> = Vec::new();
        for text_box in boxes {
            let joins_last = rows.last().is_some_and(|row| {
                let anchor = row[0];
                let limit = tolerance * anchor.height().min(text_box.height());
                (text_box.center_y() - anchor.center_y()).abs() <= limit
            });

            match rows.last_mut() {
                Some(row) if joins_last => row.push(text_box),
                _ => rows.push(vec![text_box]),
            }
        }

        rows.into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| {
                    a.rect()
                        .0
                        .partial_cmp(&b.rect().0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                row.iter()
                    .map(|b| b.text.trim())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Full transcription, one reading-order line per text line.
    pub fn text(&self, tolerance: f32) -> String {
        self.lines(tolerance).join("\n")
    }
}
