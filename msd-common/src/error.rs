//! Common error types for the MSD ingestion tools

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Common result type for MSD ingestion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of schema object checked by the loader's schema gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaObject {
    Keyspace,
    Table,
}

impl fmt::Display for SchemaObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaObject::Keyspace => f.write_str("Keyspace"),
            SchemaObject::Table => f.write_str("Table"),
        }
    }
}

/// Error kinds shared by the schema provisioner and the bulk loader
///
/// Every variant is fatal to the run that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// Cluster unreachable or session negotiation failed
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Keyspace or table missing when the loader validates the cluster
    #[error("{kind} '{name}' does not exist. Run the schema setup (msd-schema) first")]
    SchemaAbsent { kind: SchemaObject, name: String },

    /// Source file could not be opened or a field could not be read
    #[error("Extraction error in {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// Insert statement rejected by the cluster
    #[error("Insert error for track '{track_id}': {reason}")]
    Insert { track_id: String, reason: String },

    /// Schema or catalog statement rejected by the cluster
    #[error("Statement error: {0}")]
    Statement(String),

    /// Directory walk failure
    #[error("Traversal error at {}: {reason}", path.display())]
    Traversal { path: PathBuf, reason: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn extraction(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn traversal(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::Traversal {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
