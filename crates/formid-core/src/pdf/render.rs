//! Page rasterization for the OCR path.

use image::{DynamicImage, GenericImageView};
use tracing::warn;
#[cfg(feature = "native")]
use tracing::debug;

use super::{PageRenderer, PdfDocument, Result};
use crate::error::PdfError;
use crate::models::config::{PdfConfig, RendererKind};

/// Uses the largest image drawn on the page as its raster.
///
/// Scanned forms are usually a single full-page image, so this recovers the
/// scan at its native resolution without a rendering library. The scale
/// argument is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedImageRenderer;

impl PageRenderer for EmbeddedImageRenderer {
    fn name(&self) -> &'static str {
        "embedded-image"
    }

    fn render(&self, document: &PdfDocument, page: u32, _scale: f32) -> Result<DynamicImage> {
        let images = document.page_images(page)?;

        images
            .into_iter()
            .max_by_key(|img| {
                let (w, h) = img.dimensions();
                u64::from(w) * u64::from(h)
            })
            .ok_or_else(|| PdfError::Render(format!("no decodable image on page {}", page)))
    }
}

/// Renders pages with a dynamically bound pdfium library.
#[cfg(feature = "native")]
pub struct PdfiumRenderer {
    pdfium: pdfium_render::prelude::Pdfium,
}

#[cfg(feature = "native")]
impl PdfiumRenderer {
    /// Bind to pdfium in `library_dir`, falling back to the system library.
    pub fn bind(library_dir: Option<&std::path::Path>) -> Result<Self> {
        use pdfium_render::prelude::Pdfium;

        let bindings = match library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| Pdfium::bind_to_system_library()),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| PdfError::RendererUnavailable(format!("pdfium: {}", e)))?;

        debug!("Bound pdfium renderer");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

#[cfg(feature = "native")]
impl PageRenderer for PdfiumRenderer {
    fn name(&self) -> &'static str {
        "pdfium"
    }

    fn render(&self, document: &PdfDocument, page: u32, scale: f32) -> Result<DynamicImage> {
        use pdfium_render::prelude::PdfRenderConfig;

        let pdf = self
            .pdfium
            .load_pdf_from_byte_slice(document.raw_data(), None)
            .map_err(|e| PdfError::Render(format!("pdfium failed to open document: {}", e)))?;

        let pages = pdf.pages();
        let pdf_page = pages
            .iter()
            .nth(page.saturating_sub(1) as usize)
            .ok_or(PdfError::InvalidPage(page))?;

        let bitmap = pdf_page
            .render_with_config(
                &PdfRenderConfig::new()
                    .scale_page_by_factor(scale)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|e| PdfError::Render(format!("pdfium failed to render page {}: {}", page, e)))?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at scale {:.1}: {}x{}",
            page,
            scale,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

/// Create the renderer selected by the configuration.
pub fn create_renderer(config: &PdfConfig) -> Result<Box<dyn PageRenderer>> {
    match config.renderer {
        RendererKind::EmbeddedImage => Ok(Box::new(EmbeddedImageRenderer)),
        RendererKind::Pdfium => bind_pdfium(config),
        RendererKind::Auto => match bind_pdfium(config) {
            Ok(renderer) => Ok(renderer),
            Err(e) => {
                warn!("{}, falling back to embedded page images", e);
                Ok(Box::new(EmbeddedImageRenderer))
            }
        },
    }
}

#[cfg(feature = "native")]
fn bind_pdfium(config: &PdfConfig) -> Result<Box<dyn PageRenderer>> {
    let renderer = PdfiumRenderer::bind(config.pdfium_library_dir.as_deref())?;
    Ok(Box::new(renderer))
}

#[cfg(not(feature = "native"))]
fn bind_pdfium(_config: &PdfConfig) -> Result<Box<dyn PageRenderer>> {
    Err(PdfError::RendererUnavailable(
        "built without the native feature".to_string(),
    ))
}
