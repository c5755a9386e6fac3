//! Store event handling for formid.
//!
//! Each uploaded PDF named by an S3 notification is downloaded, run through
//! the [`formid_core::FormPipeline`], and answered with a JSON record written
//! beside it under the output prefix.

pub mod error;
pub mod event;
pub mod handler;
pub mod store;

pub use error::{HandlerError, Result, StoreError};
pub use event::{ObjectRef, S3Event};
pub use handler::{EventHandler, HandlerResponse, ObjectOutcome, output_key};
pub use store::{DocumentStore, LocalDocumentStore, S3DocumentStore};
