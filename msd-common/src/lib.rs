//! # MSD Common Library
//!
//! Shared code for the Million Song Dataset ingestion tools:
//! - Configuration loading
//! - Error taxonomy
//! - Logging setup
//! - Track/lyrics records and the static track field table
//! - Keyspace/table definitions and the cluster session seam

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod track;

pub use config::{IngestConfig, Tool};
pub use error::{Error, Result, SchemaObject};
pub use track::{FieldValue, TrackField, TrackFile, TrackRecord};
