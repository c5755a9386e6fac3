//! End-to-end extraction of the identity fields from a form's first page.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{AcquireError, Result};
use crate::models::config::FormidConfig;
use crate::models::record::{ExtractionResult, FailureKind, Field, FieldRecord};
use crate::ocr::OcrEngine;
use crate::pdf::{PageRenderer, PdfDocument, create_renderer};
use crate::text::{TextAcquirer, normalize};

use super::rules::{
    ANumberExtractor, FieldExtractor, FormNumberExtractor, NameExtractor, widget_values,
};

/// The only page analyzed.
const FIRST_PAGE: u32 = 1;

/// Pipeline stages, traversed once in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    TextAcquired,
    Normalized,
    FieldsExtracted,
    Finalized,
}

/// Extraction pipeline for one document at a time.
///
/// The pipeline holds no per-document state, so one instance can process
/// any number of documents sequentially.
pub struct FormPipeline {
    acquirer: TextAcquirer,
    form_number: FormNumberExtractor,
    a_number: ANumberExtractor,
    names: NameExtractor,
    use_form_fields: bool,
}

impl FormPipeline {
    pub fn builder() -> FormPipelineBuilder {
        FormPipelineBuilder::new()
    }

    /// Build a pipeline from configuration with the configured renderer and
    /// no OCR engine.
    pub fn from_config(config: FormidConfig) -> Result<Self> {
        FormPipelineBuilder::new().config(config).build()
    }

    /// Process a PDF held in memory.
    pub fn process(&self, data: &[u8]) -> ExtractionResult {
        self.process_named(None, data)
    }

    /// Process a PDF and tag the result with its source identifier.
    ///
    /// Never fails: unreadable input and OCR problems become an error
    /// record with every field empty.
    pub fn process_named(&self, source: Option<&str>, data: &[u8]) -> ExtractionResult {
        let start = Instant::now();
        let source = source.map(str::to_string);
        trace_stage(Stage::Start);

        let document = match PdfDocument::load(data) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Cannot open document: {}", e);
                return ExtractionResult::failed(FailureKind::InputUnreadable, e.to_string(), false, source);
            }
        };

        let widgets = self.read_form_fields(&document);
        if widgets.missing().is_empty() {
            info!("All fields filled from form widgets");
            trace_stage(Stage::Finalized);
            return ExtractionResult::processed(widgets, false, source);
        }

        let page = match self.acquirer.acquire(&document, FIRST_PAGE) {
            Ok(page) => page,
            Err(e) if widgets.filled() > 0 => {
                warn!("{}; keeping {} widget values", e, widgets.filled());
                trace_stage(Stage::Finalized);
                return ExtractionResult::processed(widgets, false, source);
            }
            Err(e) => {
                warn!("Text acquisition failed: {}", e);
                let kind = match e {
                    AcquireError::OcrUnavailable(_) => FailureKind::OcrUnavailable,
                    AcquireError::OcrFailed(_) => FailureKind::OcrFailed,
                };
                let used_ocr = kind == FailureKind::OcrFailed;
                return ExtractionResult::failed(kind, e.to_string(), used_ocr, source);
            }
        };
        drop(document);
        trace_stage(Stage::TextAcquired);

        let lines = normalize(page.text());
        debug!("{:?}: {} lines", Stage::Normalized, lines.len());

        let mut fields = self.extract_fields(&lines.joined(), &lines);
        trace_stage(Stage::FieldsExtracted);

        for field in Field::ALL {
            let value = widgets.get(field);
            if !value.is_empty() {
                *fields.slot(field) = value.to_string();
            }
        }

        info!(
            "Extracted {}/{} fields in {}ms (ocr={})",
            fields.filled(),
            Field::ALL.len(),
            start.elapsed().as_millis(),
            page.used_ocr()
        );
        trace_stage(Stage::Finalized);
        ExtractionResult::processed(fields, page.used_ocr(), source)
    }

    /// Apply the field heuristics to already normalized text.
    pub fn extract_fields(&self, text: &str, lines: &[String]) -> FieldRecord {
        let names = self.names.resolve(lines);

        FieldRecord {
            form_number: self
                .form_number
                .extract(text, lines)
                .map(|m| m.value)
                .unwrap_or_default(),
            a_number: self
                .a_number
                .extract(text, lines)
                .map(|m| m.value)
                .unwrap_or_default(),
            last_name: names.last,
            first_name: names.first,
            middle_name: names.middle,
        }
    }

    fn read_form_fields(&self, document: &PdfDocument) -> FieldRecord {
        let mut record = FieldRecord::default();
        if !self.use_form_fields {
            return record;
        }

        let form_fields = match document.form_fields(FIRST_PAGE) {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Cannot read form widgets: {}", e);
                return record;
            }
        };

        for (field, value) in widget_values(&form_fields) {
            debug!("Widget value for {}", field.key());
            *record.slot(field) = value;
        }
        record
    }
}

fn trace_stage(stage: Stage) {
    debug!("Pipeline stage {:?}", stage);
}

/// Builder for [`FormPipeline`].
pub struct FormPipelineBuilder {
    config: FormidConfig,
    renderer: Option<Box<dyn PageRenderer>>,
    ocr: Option<Box<dyn OcrEngine>>,
}

impl FormPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: FormidConfig::default(),
            renderer: None,
            ocr: None,
        }
    }

    pub fn config(mut self, config: FormidConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific page renderer instead of the configured one.
    pub fn renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn ocr_engine(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Load the OCR engine from the configured model directory.
    ///
    /// A missing or broken model set is logged and leaves the pipeline
    /// without OCR, so scanned pages produce `ocr_unavailable` records.
    #[cfg(feature = "native")]
    pub fn load_ocr_models(mut self) -> Self {
        let models = &self.config.models;
        match crate::ocr::create_engine_from_dir(&models.model_dir, models, self.config.ocr.clone()) {
            Ok(engine) => self.ocr = Some(engine),
            Err(e) => warn!("OCR disabled: {}", e),
        }
        self
    }

    pub fn build(self) -> Result<FormPipeline> {
        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => create_renderer(&self.config.pdf)?,
        };

        let acquirer = TextAcquirer::from_config(&self.config, renderer, self.ocr);
        debug!(
            "Pipeline ready (min_text_length={}, dpi={}, precedence={:?})",
            self.config.pdf.min_text_length,
            self.config.pdf.dpi(),
            self.config.extraction.name_precedence
        );

        Ok(FormPipeline {
            acquirer,
            form_number: FormNumberExtractor::new(),
            a_number: ANumberExtractor::new(),
            names: NameExtractor::new().with_precedence(self.config.extraction.name_precedence),
            use_form_fields: self.config.extraction.use_form_fields,
        })
    }
}

impl Default for FormPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
