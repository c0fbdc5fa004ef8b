//! msd-loader library - Bulk loading of MSD track files
//!
//! Walks a dataset tree, reads every track file and upserts one row per file
//! into the track table. The `hdf5` feature adds the `.h5` reader used by the
//! `msd-loader` binary.

pub mod loader;
pub mod reader;
pub mod scanner;

pub use loader::{validate_schema, BulkLoader, LoadSummary};
pub use reader::{read_track, TrackReader};
pub use scanner::{DirectoryBatch, DirectoryScanner};
