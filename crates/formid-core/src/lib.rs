//! Core library for immigration form identity extraction.
//!
//! This crate provides:
//! - PDF page access (embedded text, form widgets, rendering)
//! - OCR fallback for scanned first pages
//! - Text normalization into ordered lines
//! - Field heuristics for form number, A-Number, and applicant names

pub mod error;
pub mod form;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use error::{FormidError, OcrError, PdfError, Result};
pub use form::{FormPipeline, FormPipelineBuilder};
pub use models::config::FormidConfig;
pub use models::record::{ExtractionResult, FailureKind, FieldRecord, Status};
pub use ocr::{OcrEngine, OcrResult, TextBox};
pub use pdf::{PageRenderer, PdfDocument};
pub use text::{NormalizedLines, PageText, TextAcquirer, TextSource, normalize};

#[cfg(feature = "native")]
pub use ocr::create_engine_from_dir;
