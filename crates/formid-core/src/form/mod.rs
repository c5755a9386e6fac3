//! Form field extraction.

mod pipeline;
pub mod rules;

pub use pipeline::{FormPipeline, FormPipelineBuilder};
pub use rules::{FieldExtractor, NameParts};
