//! Event handler: download each uploaded form, extract, write the record.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use formid_core::{ExtractionResult, FailureKind, FormPipeline};

use crate::error::Result;
use crate::event::{ObjectRef, S3Event};
use crate::store::{DocumentStore, JSON_CONTENT_TYPE};

/// Response returned to the invoking runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    /// JSON array of the written records.
    pub body: String,
}

/// What happened to one object of an event.
#[derive(Debug, Clone)]
pub enum ObjectOutcome {
    /// The record was written to `output_key`.
    Written {
        object: ObjectRef,
        output_key: String,
        result: ExtractionResult,
    },
    /// The record could not be uploaded.
    WriteFailed {
        object: ObjectRef,
        output_key: String,
        result: ExtractionResult,
        error: String,
    },
    /// The key is not a form upload (already output, or not a PDF).
    Skipped { object: ObjectRef },
}

impl ObjectOutcome {
    pub fn result(&self) -> Option<&ExtractionResult> {
        match self {
            ObjectOutcome::Written { result, .. } | ObjectOutcome::WriteFailed { result, .. } => Some(result),
            ObjectOutcome::Skipped { .. } => None,
        }
    }

    fn is_ok(&self) -> bool {
        match self {
            ObjectOutcome::Written { result, .. } => result.is_success(),
            ObjectOutcome::WriteFailed { .. } => false,
            ObjectOutcome::Skipped { .. } => true,
        }
    }
}

/// Key of the JSON record for an uploaded PDF.
///
/// `uploads/I-485.pdf` maps to `output/uploads/I-485.json`. Keys already under
/// the output prefix or not ending in `.pdf` yield `None`, so records written
/// back to the bucket never trigger another run.
pub fn output_key(input_key: &str, prefix: &str) -> Option<String> {
    if !prefix.is_empty() && input_key.starts_with(prefix) {
        return None;
    }

    let split = input_key.len().checked_sub(4)?;
    let (stem, extension) = (input_key.get(..split)?, input_key.get(split..)?);
    if !extension.eq_ignore_ascii_case(".pdf") || stem.is_empty() || stem.ends_with('/') {
        return None;
    }

    Some(format!("{}{}.json", prefix, stem))
}

/// Runs the extraction pipeline for store events.
///
/// Objects are handled one at a time and the pipeline runs inline on the
/// calling task, so renderers and OCR engines need not be `Send`. Drive the
/// handler from a current-thread runtime; the pipeline blocks that thread
/// for the duration of each document.
pub struct EventHandler {
    pipeline: FormPipeline,
    store: Box<dyn DocumentStore>,
    output_prefix: String,
}

impl EventHandler {
    pub fn new(pipeline: FormPipeline, store: Box<dyn DocumentStore>, output_prefix: impl Into<String>) -> Self {
        Self {
            pipeline,
            store,
            output_prefix: output_prefix.into(),
        }
    }

    /// Handle a raw JSON event.
    pub async fn handle_json(&self, json: &str) -> Result<HandlerResponse> {
        let event = S3Event::from_json(json)?;
        self.handle(&event).await
    }

    /// Handle an event and build the runtime response.
    ///
    /// The status is 200 when every record was processed and written,
    /// 500 otherwise.
    pub async fn handle(&self, event: &S3Event) -> Result<HandlerResponse> {
        let outcomes = self.handle_objects(event).await?;

        let status_code = if outcomes.iter().all(ObjectOutcome::is_ok) { 200 } else { 500 };
        let results: Vec<&ExtractionResult> = outcomes.iter().filter_map(ObjectOutcome::result).collect();

        Ok(HandlerResponse {
            status_code,
            body: serde_json::to_string(&results)?,
        })
    }

    /// Process every object of an event in order.
    pub async fn handle_objects(&self, event: &S3Event) -> Result<Vec<ObjectOutcome>> {
        let objects = event.objects()?;
        let mut outcomes = Vec::with_capacity(objects.len());

        for object in objects {
            outcomes.push(self.handle_object(object).await);
        }
        Ok(outcomes)
    }

    async fn handle_object(&self, object: ObjectRef) -> ObjectOutcome {
        let Some(record_key) = output_key(&object.key, &self.output_prefix) else {
            info!("Skipping {}/{}: not a form upload", object.bucket, object.key);
            return ObjectOutcome::Skipped { object };
        };

        info!("Processing {}://{}/{}", self.store.name(), object.bucket, object.key);

        let result = match self.store.get(&object.bucket, &object.key).await {
            Ok(data) => self.pipeline.process_named(Some(&object.key), &data),
            Err(e) => {
                warn!("Download failed for {}: {}", object.key, e);
                ExtractionResult::failed(FailureKind::InputUnreadable, e.to_string(), false, Some(object.key.clone()))
            }
        };

        let body = match result.to_json_pretty() {
            Ok(body) => body,
            Err(e) => {
                error!("Cannot serialize record for {}: {}", object.key, e);
                return ObjectOutcome::WriteFailed {
                    object,
                    output_key: record_key,
                    result,
                    error: e.to_string(),
                };
            }
        };

        match self
            .store
            .put(&object.bucket, &record_key, body.into_bytes(), JSON_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                info!("Wrote {} ({:?})", record_key, result.status);
                ObjectOutcome::Written {
                    object,
                    output_key: record_key,
                    result,
                }
            }
            Err(e) => {
                error!("Upload failed for {}: {}", record_key, e);
                ObjectOutcome::WriteFailed {
                    object,
                    output_key: record_key,
                    result,
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_key() {
        assert_eq!(output_key("I-485-3.pdf", "output/"), Some("output/I-485-3.json".to_string()));
        assert_eq!(
            output_key("uploads/scan 1.PDF", "output/"),
            Some("output/uploads/scan 1.json".to_string())
        );
        assert_eq!(output_key("form.pdf", ""), Some("form.json".to_string()));
    }

    #[test]
    fn test_output_key_skips_non_uploads() {
        assert_eq!(output_key("output/I-485-3.pdf", "output/"), None);
        assert_eq!(output_key("uploads/notes.txt", "output/"), None);
        assert_eq!(output_key("uploads/.pdf", "output/"), None);
        assert_eq!(output_key("pdf", "output/"), None);
        assert_eq!(output_key("", "output/"), None);
    }
}
