//! Track file readers
//!
//! A [`TrackReader`] opens one file and returns a [`TrackFile`] handle. The
//! handle owns the open file and releases it when dropped, so a record is
//! always read inside a single scope: open, extract, close.

use msd_common::{Result, TrackFile, TrackRecord};
use std::path::Path;

#[cfg(feature = "hdf5")]
pub mod hdf5;

#[cfg(feature = "hdf5")]
pub use self::hdf5::{Hdf5TrackFile, Hdf5TrackReader};

/// Opens track files of one source format
pub trait TrackReader {
    type File: TrackFile;

    /// Open `path` for reading; any failure is an extraction error
    fn open(&self, path: &Path) -> Result<Self::File>;
}

/// Open `path`, extract every track field, and close the file again
///
/// The file is closed on both success and failure.
pub fn read_track<R: TrackReader>(reader: &R, path: &Path) -> Result<TrackRecord> {
    let file = reader.open(path)?;
    TrackRecord::extract(&file)
}
