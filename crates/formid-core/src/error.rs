//! Error types for the formid-core library.

use thiserror::Error;

/// Main error type for the formid library.
#[derive(Error, Debug)]
pub enum FormidError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to rasterize a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// No renderer backend could be initialized.
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors that stop page text acquisition.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// OCR was needed but no engine or renderer could run.
    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    /// The OCR engine failed on the rendered page.
    #[error("OCR failed: {0}")]
    OcrFailed(#[from] OcrError),
}

/// Result type for the formid library.
pub type Result<T> = std::result::Result<T, FormidError>;
