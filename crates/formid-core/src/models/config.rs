//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the formid pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormidConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Document store configuration.
    pub store: StoreConfig,
}

/// Which backend rasterizes pages for OCR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Try pdfium, fall back to the page's embedded image.
    #[default]
    Auto,
    /// Render with pdfium only.
    Pdfium,
    /// Use the largest image drawn on the page.
    EmbeddedImage,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Render scale relative to 72 DPI (3.0 renders at 216 DPI).
    pub render_scale: f32,

    /// Minimum trimmed character count for the embedded text layer to be used.
    pub min_text_length: usize,

    /// Rendering backend.
    pub renderer: RendererKind,

    /// Directory holding the pdfium shared library (system search if unset).
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_scale: 3.0,
            min_text_length: 100,
            renderer: RendererKind::Auto,
            pdfium_library_dir: None,
        }
    }
}

impl PdfConfig {
    /// Effective rendering resolution in dots per inch.
    pub fn dpi(&self) -> f32 {
        self.render_scale * 72.0
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language code (selects the recognition model).
    pub language: String,

    /// Binarize the page with an adaptive threshold before recognition.
    pub binarize: bool,

    /// Side length of the local window used by the adaptive threshold.
    pub threshold_block_size: u32,

    /// Offset subtracted from the local mean before thresholding.
    pub threshold_offset: i32,

    /// Boxes whose vertical centers differ by less than this fraction of
    /// their height are joined into one line.
    pub line_merge_tolerance: f32,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            binarize: true,
            threshold_block_size: 31,
            threshold_offset: 10,
            line_merge_tolerance: 0.5,
            keep_unk: false,
        }
    }
}

/// Ordering of the name heuristics when more than one applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePrecedence {
    /// Composite header, then inline labels, then per-label scan.
    #[default]
    GroupedFirst,
    /// Inline labels, then per-label scan, then composite header.
    PerLabelFirst,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Read values from fillable form widgets before text heuristics.
    pub use_form_fields: bool,

    /// Precedence of the name strategies.
    pub name_precedence: NamePrecedence,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            use_form_fields: true,
            name_precedence: NamePrecedence::GroupedFirst,
        }
    }
}

/// Model file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Recognition model file name (derived from the language if unset).
    pub recognition_model: Option<String>,

    /// Character dictionary file name (derived from the language if unset).
    pub dictionary: Option<String>,

    /// Base URL the `models download` command fetches model files from.
    pub download_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: None,
            dictionary: None,
            download_url: None,
        }
    }
}

impl ModelConfig {
    /// Recognition model and dictionary file names for a language code.
    ///
    /// English and other Latin-script languages share the `latin` model pair.
    pub fn recognition_files(&self, language: &str) -> (String, String) {
        let family = match language.to_ascii_lowercase().as_str() {
            "eng" | "en" | "latin" | "spa" | "es" | "fra" | "fr" => "latin".to_string(),
            other => other.to_string(),
        };

        let model = self
            .recognition_model
            .clone()
            .unwrap_or_else(|| format!("{}_rec.onnx", family));
        let dictionary = self
            .dictionary
            .clone()
            .unwrap_or_else(|| format!("{}_dict.txt", family));

        (model, dictionary)
    }

    /// Every file the OCR engine loads for a language, detection model first.
    pub fn required_files(&self, language: &str) -> [String; 3] {
        let (model, dictionary) = self.recognition_files(language);
        [self.detection_model.clone(), model, dictionary]
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bucket holding the uploaded forms.
    pub bucket: String,

    /// AWS region.
    pub region: String,

    /// Custom endpoint (MinIO, LocalStack).
    pub endpoint: Option<String>,

    /// Prefix for written JSON records.
    pub output_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: "s3-1812-pdf".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            output_prefix: "output/".to_string(),
        }
    }
}

impl FormidConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = FormidConfig::default();
        assert_eq!(config.pdf.min_text_length, 100);
        assert_eq!(config.pdf.dpi(), 216.0);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.extraction.name_precedence, NamePrecedence::GroupedFirst);
        assert_eq!(config.store.output_prefix, "output/");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"pdf": {"min_text_length": 40}, "extraction": {"name_precedence": "per_label_first"}}"#;
        let config: FormidConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.pdf.min_text_length, 40);
        assert_eq!(config.pdf.render_scale, 3.0);
        assert_eq!(config.extraction.name_precedence, NamePrecedence::PerLabelFirst);
        assert!(config.extraction.use_form_fields);
    }

    #[test]
    fn test_recognition_files() {
        let models = ModelConfig::default();
        assert_eq!(
            models.recognition_files("eng"),
            ("latin_rec.onnx".to_string(), "latin_dict.txt".to_string())
        );
        assert_eq!(
            models.recognition_files("korean"),
            ("korean_rec.onnx".to_string(), "korean_dict.txt".to_string())
        );

        let pinned = ModelConfig {
            recognition_model: Some("custom.onnx".to_string()),
            ..ModelConfig::default()
        };
        assert_eq!(pinned.recognition_files("eng").0, "custom.onnx");
    }

    #[test]
    fn test_required_files() {
        assert_eq!(
            ModelConfig::default().required_files("en"),
            [
                "det.onnx".to_string(),
                "latin_rec.onnx".to_string(),
                "latin_dict.txt".to_string(),
            ]
        );
    }
}
