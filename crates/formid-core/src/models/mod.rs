//! Data models: configuration and the output record.

pub mod config;
pub mod record;
