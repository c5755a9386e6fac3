//! PDF processing module.

mod document;
mod render;
mod widgets;

pub use document::PdfDocument;
pub use render::{EmbeddedImageRenderer, create_renderer};
pub use widgets::FormField;

#[cfg(feature = "native")]
pub use render::PdfiumRenderer;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Rasterizes a single page of a loaded document.
pub trait PageRenderer {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Render a 1-indexed page at `scale` times its natural 72 DPI size.
    ///
    /// Only the requested page is rendered, and the bitmap stays in memory.
    fn render(&self, document: &PdfDocument, page: u32, scale: f32) -> Result<DynamicImage>;
}

#[cfg(test)]
pub(crate) use document::tests::{empty_pdf, image_pdf, text_pdf};
#[cfg(test)]
pub(crate) use widgets::tests::widget_pdf;
