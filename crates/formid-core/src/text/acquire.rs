//! Chooses between a page's embedded text layer and an OCR transcription.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AcquireError;
use crate::models::config::FormidConfig;
use crate::ocr::{ImagePreprocessor, OcrEngine};
use crate::pdf::{PageRenderer, PdfDocument};

/// Where a page's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Embedded,
    Ocr,
}

/// Raw text of one page with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    text: String,
    source: TextSource,
}

impl PageText {
    pub fn new(text: impl Into<String>, source: TextSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> TextSource {
        self.source
    }

    pub fn used_ocr(&self) -> bool {
        self.source == TextSource::Ocr
    }
}

/// Text acquisition for a single page.
pub struct TextAcquirer {
    renderer: Box<dyn PageRenderer>,
    ocr: Option<Box<dyn OcrEngine>>,
    preprocessor: ImagePreprocessor,
    min_text_length: usize,
    render_scale: f32,
    line_tolerance: f32,
}

impl TextAcquirer {
    /// Create an acquirer with default thresholds and no OCR engine.
    pub fn new(renderer: Box<dyn PageRenderer>) -> Self {
        Self::from_config(&FormidConfig::default(), renderer, None)
    }

    pub fn from_config(
        config: &FormidConfig,
        renderer: Box<dyn PageRenderer>,
        ocr: Option<Box<dyn OcrEngine>>,
    ) -> Self {
        Self {
            renderer,
            ocr,
            preprocessor: ImagePreprocessor::from_config(&config.ocr),
            min_text_length: config.pdf.min_text_length,
            render_scale: config.pdf.render_scale,
            line_tolerance: config.ocr.line_merge_tolerance,
        }
    }

    /// Set the OCR engine.
    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Set the minimum embedded text length.
    pub fn with_min_text_length(mut self, length: usize) -> Self {
        self.min_text_length = length;
        self
    }

    /// Whether text of this length is too short to use without OCR.
    pub fn needs_ocr(&self, embedded: &str) -> bool {
        embedded.trim().chars().count() < self.min_text_length
    }

    /// Return the best available text for a 1-indexed page.
    ///
    /// The embedded layer is used when it reaches the length threshold;
    /// otherwise the page is rendered, enhanced, and recognized exactly once.
    /// When OCR cannot run, a short but non-empty embedded layer is still
    /// returned. An empty transcription is a normal outcome, not an error.
    pub fn acquire(&self, document: &PdfDocument, page: u32) -> Result<PageText, AcquireError> {
        let embedded = match document.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                warn!("Embedded text extraction failed on page {}: {}", page, e);
                String::new()
            }
        };

        if !self.needs_ocr(&embedded) {
            debug!("Using embedded text layer ({} chars)", embedded.len());
            return Ok(PageText::new(embedded, TextSource::Embedded));
        }

        info!(
            "Embedded text too short ({} < {} chars), falling back to OCR",
            embedded.trim().chars().count(),
            self.min_text_length
        );

        let Some(engine) = self.ocr.as_deref() else {
            return Self::short_embedded(embedded, "no OCR engine configured".to_string());
        };

        let image = match self.renderer.render(document, page, self.render_scale) {
            Ok(image) => image,
            Err(e) => return Self::short_embedded(embedded, format!("{} renderer: {}", self.renderer.name(), e)),
        };

        let enhanced = self.preprocessor.enhance(&image);
        drop(image);

        let result = engine.process(&enhanced)?;
        let text = result.text(self.line_tolerance);

        debug!(
            "{} transcribed {} chars from {} boxes",
            engine.name(),
            text.len(),
            result.boxes.len()
        );
        Ok(PageText::new(text, TextSource::Ocr))
    }

    /// Keep a short embedded layer when OCR is unavailable; only an empty
    /// layer is reported as unavailable.
    fn short_embedded(embedded: String, reason: String) -> Result<PageText, AcquireError> {
        if embedded.trim().is_empty() {
            return Err(AcquireError::OcrUnavailable(reason));
        }
        warn!("OCR unavailable ({}), using short embedded text", reason);
        Ok(PageText::new(embedded, TextSource::Embedded))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use image::{DynamicImage, GrayImage, Luma};

    use crate::error::{OcrError, PdfError};
    use crate::ocr::{OcrResult, TextBox};
    use crate::pdf::text_pdf;

    /// Renders a blank page.
    pub(crate) struct BlankRenderer;

    impl PageRenderer for BlankRenderer {
        fn name(&self) -> &'static str {
            "blank"
        }

        fn render(&self, _document: &PdfDocument, _page: u32, _scale: f32) -> crate::pdf::Result<DynamicImage> {
            Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([255]))))
        }
    }

    pub(crate) struct FailingRenderer;

    impl PageRenderer for FailingRenderer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn render(&self, _document: &PdfDocument, page: u32, _scale: f32) -> crate::pdf::Result<DynamicImage> {
            Err(PdfError::Render(format!("cannot render page {}", page)))
        }
    }

    /// Returns fixed lines and counts invocations.
    pub(crate) struct ScriptedOcr {
        pub lines: Vec<&'static str>,
        pub calls: Rc<Cell<usize>>,
        pub fail: bool,
    }

    impl ScriptedOcr {
        pub(crate) fn new(lines: Vec<&'static str>) -> (Self, Rc<Cell<usize>>) {
            let calls = Rc::new(Cell::new(0));
            let engine = Self {
                lines,
                calls: Rc::clone(&calls),
                fail: false,
            };
            (engine, calls)
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn name(&self) -> &str {
            "scripted"
        }

        fn process(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(OcrError::Recognition("model crashed".to_string()));
            }

            let boxes = self
                .lines
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let y = i as f32 * 40.0;
                    TextBox {
                        bbox: [0.0, y, 100.0, y, 100.0, y + 20.0, 0.0, y + 20.0],
                        text: text.to_string(),
                        confidence: 0.9,
                    }
                })
                .collect();

            Ok(OcrResult {
                boxes,
                processing_time_ms: 1,
                image_size: (image.width(), image.height()),
            })
        }
    }

    const LONG_PAGE: [&str; 4] = [
        "Form I-485, Application to Register Permanent Residence or Adjust Status",
        "Department of Homeland Security",
        "U.S. Citizenship and Immigration Services",
        "A-Number: 123 456 789",
    ];

    #[test]
    fn test_long_embedded_text_skips_ocr() {
        let doc = PdfDocument::load(&text_pdf(&LONG_PAGE)).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec!["should not be used"]);
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer)).with_ocr(Box::new(ocr));

        let page = acquirer.acquire(&doc, 1).unwrap();

        assert!(!page.used_ocr());
        assert_eq!(page.source(), TextSource::Embedded);
        assert!(page.text().contains("I-485"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_short_embedded_text_runs_ocr_once() {
        let doc = PdfDocument::load(&text_pdf(&["Page 1 of 20"])).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec!["Form I-130", "A123456789"]);
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer)).with_ocr(Box::new(ocr));

        let page = acquirer.acquire(&doc, 1).unwrap();

        assert!(page.used_ocr());
        assert_eq!(page.text(), "Form I-130\nA123456789");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let doc = PdfDocument::load(&text_pdf(&["Form I-485"])).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec![]);
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer))
            .with_ocr(Box::new(ocr))
            .with_min_text_length(5);

        assert!(!acquirer.acquire(&doc, 1).unwrap().used_ocr());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_empty_transcription_is_not_an_error() {
        let doc = PdfDocument::load(&text_pdf(&[])).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec![]);
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer)).with_ocr(Box::new(ocr));

        let page = acquirer.acquire(&doc, 1).unwrap();
        assert!(page.used_ocr());
        assert!(page.text().is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_missing_engine_is_unavailable() {
        let doc = PdfDocument::load(&text_pdf(&[])).unwrap();
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer));

        let err = acquirer.acquire(&doc, 1).unwrap_err();
        assert!(matches!(err, AcquireError::OcrUnavailable(_)));
    }

    #[test]
    fn test_render_failure_is_unavailable() {
        let doc = PdfDocument::load(&text_pdf(&[])).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec!["unused"]);
        let acquirer = TextAcquirer::new(Box::new(FailingRenderer)).with_ocr(Box::new(ocr));

        let err = acquirer.acquire(&doc, 1).unwrap_err();
        assert!(matches!(err, AcquireError::OcrUnavailable(_)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_short_text_kept_without_engine() {
        let doc = PdfDocument::load(&text_pdf(&["Form I-485", "A-Number: 123 456 789"])).unwrap();
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer));

        let page = acquirer.acquire(&doc, 1).unwrap();
        assert_eq!(page.source(), TextSource::Embedded);
        assert!(page.text().contains("123 456 789"));
    }

    #[test]
    fn test_short_text_kept_when_render_fails() {
        let doc = PdfDocument::load(&text_pdf(&["Page 1 of 20"])).unwrap();
        let (ocr, calls) = ScriptedOcr::new(vec!["unused"]);
        let acquirer = TextAcquirer::new(Box::new(FailingRenderer)).with_ocr(Box::new(ocr));

        let page = acquirer.acquire(&doc, 1).unwrap();
        assert!(!page.used_ocr());
        assert!(page.text().contains("Page 1 of 20"));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_engine_error_is_ocr_failed() {
        let doc = PdfDocument::load(&text_pdf(&[])).unwrap();
        let (mut ocr, _calls) = ScriptedOcr::new(vec![]);
        ocr.fail = true;
        let acquirer = TextAcquirer::new(Box::new(BlankRenderer)).with_ocr(Box::new(ocr));

        let err = acquirer.acquire(&doc, 1).unwrap_err();
        assert!(matches!(err, AcquireError::OcrFailed(_)));
    }
}
