//! Million Song Dataset `.h5` reader
//!
//! Every MSD file holds a single song: row 0 of the `/metadata/songs`,
//! `/analysis/songs` and `/musicbrainz/songs` compound tables plus the
//! `/metadata/similar_artists` string array. Tables are read lazily, once,
//! the first time one of their fields is requested.

use hdf5::types::FixedAscii;
use hdf5::H5Type;
use msd_common::track::SourceTable;
use msd_common::{Error, FieldValue, Result, TrackField, TrackFile};
use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use super::TrackReader;

/// Fixed-length string member; HDF5 converts shorter stored strings on read
type Text = FixedAscii<1024>;

/// Similar-artist ids are 18-character Echo Nest ids
type SimilarId = FixedAscii<64>;

#[derive(H5Type, Clone, Copy)]
#[repr(C)]
struct MetadataSong {
    artist_familiarity: f64,
    artist_hotttnesss: f64,
    artist_id: Text,
    artist_mbid: Text,
    artist_playmeid: i32,
    artist_7digitalid: i32,
    artist_latitude: f64,
    artist_longitude: f64,
    artist_location: Text,
    artist_name: Text,
    release: Text,
    release_7digitalid: i32,
    song_id: Text,
    song_hotttnesss: f64,
    title: Text,
    track_7digitalid: i32,
}

#[derive(H5Type, Clone, Copy)]
#[repr(C)]
struct AnalysisSong {
    analysis_sample_rate: i32,
    audio_md5: Text,
    danceability: f64,
    duration: f64,
    end_of_fade_in: f64,
    energy: f64,
    key: i32,
    key_confidence: f64,
    loudness: f64,
    mode: i32,
    mode_confidence: f64,
    start_of_fade_out: f64,
    tempo: f64,
    time_signature: i32,
    time_signature_confidence: f64,
    track_id: Text,
}

#[derive(H5Type, Clone, Copy)]
#[repr(C)]
struct MusicbrainzSong {
    year: i32,
}

/// Reader for MSD HDF5 track files
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5TrackReader;

impl TrackReader for Hdf5TrackReader {
    type File = Hdf5TrackFile;

    fn open(&self, path: &Path) -> Result<Hdf5TrackFile> {
        let file = hdf5::File::open(path).map_err(|e| Error::extraction(path, e))?;
        Ok(Hdf5TrackFile {
            path: path.to_path_buf(),
            file,
            metadata: OnceCell::new(),
            analysis: OnceCell::new(),
            musicbrainz: OnceCell::new(),
            similar_artists: OnceCell::new(),
        })
    }
}

/// One open MSD file; the HDF5 handle closes on drop
pub struct Hdf5TrackFile {
    path: PathBuf,
    file: hdf5::File,
    metadata: OnceCell<MetadataSong>,
    analysis: OnceCell<AnalysisSong>,
    musicbrainz: OnceCell<MusicbrainzSong>,
    similar_artists: OnceCell<Vec<String>>,
}

impl Hdf5TrackFile {
    fn error(&self, reason: impl std::fmt::Display) -> Error {
        Error::extraction(&self.path, reason)
    }

    fn first_row<T: H5Type>(&self, table: SourceTable) -> Result<T> {
        let dataset = self
            .file
            .dataset(table.path())
            .map_err(|e| self.error(format!("{}: {}", table.path(), e)))?;

        let rows: Vec<T> = dataset
            .read_raw()
            .map_err(|e| self.error(format!("{}: {}", table.path(), e)))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| self.error(format!("{} has no rows", table.path())))
    }

    fn cached<'a, T: H5Type>(&self, cell: &'a OnceCell<T>, table: SourceTable) -> Result<&'a T> {
        if let Some(row) = cell.get() {
            return Ok(row);
        }
        let row = self.first_row(table)?;
        Ok(cell.get_or_init(|| row))
    }

    fn similar_artists(&self) -> Result<&Vec<String>> {
        if let Some(ids) = self.similar_artists.get() {
            return Ok(ids);
        }

        let table = SourceTable::SimilarArtists;
        let ids: Vec<SimilarId> = self
            .file
            .dataset(table.path())
            .and_then(|d| d.read_raw())
            .map_err(|e| self.error(format!("{}: {}", table.path(), e)))?;

        let ids = ids
            .iter()
            .map(|id| self.decode(table.path(), id.as_bytes()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.similar_artists.get_or_init(|| ids))
    }

    /// HDF5 does not check string contents on read; invalid UTF-8 is an
    /// extraction error.
    fn decode(&self, member: &str, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| self.error(format!("{} is not valid UTF-8: {}", member, e)))
    }

    fn text(&self, field: TrackField, value: &Text) -> Result<FieldValue> {
        self.decode(field.name(), value.as_bytes()).map(FieldValue::Text)
    }
}

impl TrackFile for Hdf5TrackFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn value(&self, field: TrackField) -> Result<Option<FieldValue>> {
        use FieldValue::{Double, Int};
        use TrackField::*;

        let value = match field.source() {
            SourceTable::MetadataSongs => {
                let row = self.cached(&self.metadata, SourceTable::MetadataSongs)?;
                match field {
                    ArtistFamiliarity => Double(row.artist_familiarity),
                    ArtistHotttnesss => Double(row.artist_hotttnesss),
                    ArtistId => self.text(field, &row.artist_id)?,
                    ArtistMbid => self.text(field, &row.artist_mbid)?,
                    ArtistPlaymeid => Int(row.artist_playmeid),
                    Artist7digitalid => Int(row.artist_7digitalid),
                    ArtistLatitude => Double(row.artist_latitude),
                    ArtistLongitude => Double(row.artist_longitude),
                    ArtistLocation => self.text(field, &row.artist_location)?,
                    ArtistName => self.text(field, &row.artist_name)?,
                    Release => self.text(field, &row.release)?,
                    Release7digitalid => Int(row.release_7digitalid),
                    SongId => self.text(field, &row.song_id)?,
                    SongHotttnesss => Double(row.song_hotttnesss),
                    Title => self.text(field, &row.title)?,
                    Track7digitalid => Int(row.track_7digitalid),
                    other => return Err(self.error(format!("{} is not in /metadata/songs", other))),
                }
            }
            SourceTable::AnalysisSongs => {
                let row = self.cached(&self.analysis, SourceTable::AnalysisSongs)?;
                match field {
                    AnalysisSampleRate => Int(row.analysis_sample_rate),
                    AudioMd5 => self.text(field, &row.audio_md5)?,
                    Danceability => Double(row.danceability),
                    Duration => Double(row.duration),
                    EndOfFadeIn => Double(row.end_of_fade_in),
                    Energy => Double(row.energy),
                    Key => Int(row.key),
                    KeyConfidence => Double(row.key_confidence),
                    Loudness => Double(row.loudness),
                    Mode => Int(row.mode),
                    ModeConfidence => Double(row.mode_confidence),
                    StartOfFadeOut => Double(row.start_of_fade_out),
                    Tempo => Double(row.tempo),
                    TimeSignature => Int(row.time_signature),
                    TimeSignatureConfidence => Double(row.time_signature_confidence),
                    TrackId => self.text(field, &row.track_id)?,
                    other => return Err(self.error(format!("{} is not in /analysis/songs", other))),
                }
            }
            SourceTable::MusicbrainzSongs => {
                Int(self.cached(&self.musicbrainz, SourceTable::MusicbrainzSongs)?.year)
            }
            SourceTable::SimilarArtists => FieldValue::TextList(self.similar_artists()?.clone()),
        };

        Ok(Some(value))
    }
}
