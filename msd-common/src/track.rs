//! Track and lyrics records
//!
//! [`TrackField`] is the single list of track columns: it fixes the insert
//! order, the CQL type of each column and where the value lives in a source
//! file. [`TrackRecord`] is the typed row built from it.

use crate::db::schema::CqlType;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Table or dataset inside a track file that holds a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    /// `/metadata/songs`
    MetadataSongs,
    /// `/metadata/similar_artists`
    SimilarArtists,
    /// `/analysis/songs`
    AnalysisSongs,
    /// `/musicbrainz/songs`
    MusicbrainzSongs,
}

impl SourceTable {
    /// HDF5-style path of the table
    pub fn path(self) -> &'static str {
        match self {
            SourceTable::MetadataSongs => "/metadata/songs",
            SourceTable::SimilarArtists => "/metadata/similar_artists",
            SourceTable::AnalysisSongs => "/analysis/songs",
            SourceTable::MusicbrainzSongs => "/musicbrainz/songs",
        }
    }
}

/// One column of the track table, in insert order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackField {
    TrackId,
    ArtistFamiliarity,
    ArtistHotttnesss,
    ArtistId,
    ArtistMbid,
    ArtistPlaymeid,
    Artist7digitalid,
    ArtistLatitude,
    ArtistLongitude,
    ArtistLocation,
    ArtistName,
    Release,
    Release7digitalid,
    SongId,
    SongHotttnesss,
    Title,
    Track7digitalid,
    SimilarArtists,
    AnalysisSampleRate,
    AudioMd5,
    Danceability,
    Duration,
    EndOfFadeIn,
    Energy,
    Key,
    KeyConfidence,
    Loudness,
    Mode,
    ModeConfidence,
    StartOfFadeOut,
    Tempo,
    TimeSignature,
    TimeSignatureConfidence,
    Year,
}

impl TrackField {
    /// Every column, primary key first
    pub const ALL: [TrackField; 34] = [
        TrackField::TrackId,
        TrackField::ArtistFamiliarity,
        TrackField::ArtistHotttnesss,
        TrackField::ArtistId,
        TrackField::ArtistMbid,
        TrackField::ArtistPlaymeid,
        TrackField::Artist7digitalid,
        TrackField::ArtistLatitude,
        TrackField::ArtistLongitude,
        TrackField::ArtistLocation,
        TrackField::ArtistName,
        TrackField::Release,
        TrackField::Release7digitalid,
        TrackField::SongId,
        TrackField::SongHotttnesss,
        TrackField::Title,
        TrackField::Track7digitalid,
        TrackField::SimilarArtists,
        TrackField::AnalysisSampleRate,
        TrackField::AudioMd5,
        TrackField::Danceability,
        TrackField::Duration,
        TrackField::EndOfFadeIn,
        TrackField::Energy,
        TrackField::Key,
        TrackField::KeyConfidence,
        TrackField::Loudness,
        TrackField::Mode,
        TrackField::ModeConfidence,
        TrackField::StartOfFadeOut,
        TrackField::Tempo,
        TrackField::TimeSignature,
        TrackField::TimeSignatureConfidence,
        TrackField::Year,
    ];

    /// Column name, identical to the source member name
    pub fn name(self) -> &'static str {
        match self {
            TrackField::TrackId => "track_id",
            TrackField::ArtistFamiliarity => "artist_familiarity",
            TrackField::ArtistHotttnesss => "artist_hotttnesss",
            TrackField::ArtistId => "artist_id",
            TrackField::ArtistMbid => "artist_mbid",
            TrackField::ArtistPlaymeid => "artist_playmeid",
            TrackField::Artist7digitalid => "artist_7digitalid",
            TrackField::ArtistLatitude => "artist_latitude",
            TrackField::ArtistLongitude => "artist_longitude",
            TrackField::ArtistLocation => "artist_location",
            TrackField::ArtistName => "artist_name",
            TrackField::Release => "release",
            TrackField::Release7digitalid => "release_7digitalid",
            TrackField::SongId => "song_id",
            TrackField::SongHotttnesss => "song_hotttnesss",
            TrackField::Title => "title",
            TrackField::Track7digitalid => "track_7digitalid",
            TrackField::SimilarArtists => "similar_artists",
            TrackField::AnalysisSampleRate => "analysis_sample_rate",
            TrackField::AudioMd5 => "audio_md5",
            TrackField::Danceability => "danceability",
            TrackField::Duration => "duration",
            TrackField::EndOfFadeIn => "end_of_fade_in",
            TrackField::Energy => "energy",
            TrackField::Key => "key",
            TrackField::KeyConfidence => "key_confidence",
            TrackField::Loudness => "loudness",
            TrackField::Mode => "mode",
            TrackField::ModeConfidence => "mode_confidence",
            TrackField::StartOfFadeOut => "start_of_fade_out",
            TrackField::Tempo => "tempo",
            TrackField::TimeSignature => "time_signature",
            TrackField::TimeSignatureConfidence => "time_signature_confidence",
            TrackField::Year => "year",
        }
    }

    pub fn cql_type(self) -> CqlType {
        match self.kind() {
            ValueKind::Text => CqlType::Text,
            ValueKind::Double => CqlType::Double,
            ValueKind::Int => CqlType::Int,
            ValueKind::TextList => CqlType::List(Box::new(CqlType::Text)),
        }
    }

    /// Kind of value the source must provide for this field
    pub fn kind(self) -> ValueKind {
        use TrackField::*;
        match self {
            TrackId | ArtistId | ArtistMbid | ArtistLocation | ArtistName | Release | SongId
            | Title | AudioMd5 => ValueKind::Text,

            ArtistPlaymeid | Artist7digitalid | Release7digitalid | Track7digitalid
            | AnalysisSampleRate | Key | Mode | TimeSignature | Year => ValueKind::Int,

            SimilarArtists => ValueKind::TextList,

            ArtistFamiliarity | ArtistHotttnesss | ArtistLatitude | ArtistLongitude
            | SongHotttnesss | Danceability | Duration | EndOfFadeIn | Energy | KeyConfidence
            | Loudness | ModeConfidence | StartOfFadeOut | Tempo | TimeSignatureConfidence => {
                ValueKind::Double
            }
        }
    }

    pub fn source(self) -> SourceTable {
        use TrackField::*;
        match self {
            ArtistFamiliarity | ArtistHotttnesss | ArtistId | ArtistMbid | ArtistPlaymeid
            | Artist7digitalid | ArtistLatitude | ArtistLongitude | ArtistLocation
            | ArtistName | Release | Release7digitalid | SongId | SongHotttnesss | Title
            | Track7digitalid => SourceTable::MetadataSongs,

            SimilarArtists => SourceTable::SimilarArtists,

            AnalysisSampleRate | AudioMd5 | Danceability | Duration | EndOfFadeIn | Energy
            | Key | KeyConfidence | Loudness | Mode | ModeConfidence | StartOfFadeOut | Tempo
            | TimeSignature | TimeSignatureConfidence | TrackId => SourceTable::AnalysisSongs,

            Year => SourceTable::MusicbrainzSongs,
        }
    }
}

impl fmt::Display for TrackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a [`FieldValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Double,
    Int,
    TextList,
}

/// A single extracted (or bound) column value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Double(f64),
    Int(i32),
    TextList(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Double(_) => ValueKind::Double,
            FieldValue::Int(_) => ValueKind::Int,
            FieldValue::TextList(_) => ValueKind::TextList,
        }
    }
}

/// Per-field read access over one open track file
///
/// Implementations release the underlying file when dropped.
pub trait TrackFile {
    /// Location of the file, for error reporting
    fn path(&self) -> &Path;

    /// Read one field; `Ok(None)` when the file carries no value for it
    fn value(&self, field: TrackField) -> Result<Option<FieldValue>>;
}

/// One row of the track table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub track_id: String,
    pub artist_familiarity: Option<f64>,
    pub artist_hotttnesss: Option<f64>,
    pub artist_id: Option<String>,
    pub artist_mbid: Option<String>,
    pub artist_playmeid: Option<i32>,
    pub artist_7digitalid: Option<i32>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_name: Option<String>,
    pub release: Option<String>,
    pub release_7digitalid: Option<i32>,
    pub song_id: Option<String>,
    pub song_hotttnesss: Option<f64>,
    pub title: Option<String>,
    pub track_7digitalid: Option<i32>,
    /// Left out of the debug log line; it can run to hundreds of ids
    #[serde(skip_serializing)]
    pub similar_artists: Vec<String>,
    pub analysis_sample_rate: Option<i32>,
    pub audio_md5: Option<String>,
    pub danceability: Option<f64>,
    pub duration: Option<f64>,
    pub end_of_fade_in: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<i32>,
    pub key_confidence: Option<f64>,
    pub loudness: Option<f64>,
    pub mode: Option<i32>,
    pub mode_confidence: Option<f64>,
    pub start_of_fade_out: Option<f64>,
    pub tempo: Option<f64>,
    pub time_signature: Option<i32>,
    pub time_signature_confidence: Option<f64>,
    pub year: Option<i32>,
}

impl TrackRecord {
    /// Read every track field from an open file
    ///
    /// Fails on the first field that cannot be read, has the wrong kind, or
    /// when the track id is missing or empty.
    pub fn extract(file: &impl TrackFile) -> Result<Self> {
        use TrackField::*;

        let track_id = text(file, TrackId)?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::extraction(file.path(), "track_id is missing or empty"))?;

        Ok(Self {
            track_id,
            artist_familiarity: double(file, ArtistFamiliarity)?,
            artist_hotttnesss: double(file, ArtistHotttnesss)?,
            artist_id: text(file, ArtistId)?,
            artist_mbid: text(file, ArtistMbid)?,
            artist_playmeid: int(file, ArtistPlaymeid)?,
            artist_7digitalid: int(file, Artist7digitalid)?,
            artist_latitude: double(file, ArtistLatitude)?,
            artist_longitude: double(file, ArtistLongitude)?,
            artist_location: text(file, ArtistLocation)?,
            artist_name: text(file, ArtistName)?,
            release: text(file, Release)?,
            release_7digitalid: int(file, Release7digitalid)?,
            song_id: text(file, SongId)?,
            song_hotttnesss: double(file, SongHotttnesss)?,
            title: text(file, Title)?,
            track_7digitalid: int(file, Track7digitalid)?,
            similar_artists: text_list(file, SimilarArtists)?.unwrap_or_default(),
            analysis_sample_rate: int(file, AnalysisSampleRate)?,
            audio_md5: text(file, AudioMd5)?,
            danceability: double(file, Danceability)?,
            duration: double(file, Duration)?,
            end_of_fade_in: double(file, EndOfFadeIn)?,
            energy: double(file, Energy)?,
            key: int(file, Key)?,
            key_confidence: double(file, KeyConfidence)?,
            loudness: double(file, Loudness)?,
            mode: int(file, Mode)?,
            mode_confidence: double(file, ModeConfidence)?,
            start_of_fade_out: double(file, StartOfFadeOut)?,
            tempo: double(file, Tempo)?,
            time_signature: int(file, TimeSignature)?,
            time_signature_confidence: double(file, TimeSignatureConfidence)?,
            year: int(file, Year)?,
        })
    }

    /// Value stored in one column
    pub fn value(&self, field: TrackField) -> Option<FieldValue> {
        use TrackField::*;
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let double = |v: &Option<f64>| v.map(FieldValue::Double);
        let int = |v: &Option<i32>| v.map(FieldValue::Int);

        match field {
            TrackId => Some(FieldValue::Text(self.track_id.clone())),
            ArtistFamiliarity => double(&self.artist_familiarity),
            ArtistHotttnesss => double(&self.artist_hotttnesss),
            ArtistId => text(&self.artist_id),
            ArtistMbid => text(&self.artist_mbid),
            ArtistPlaymeid => int(&self.artist_playmeid),
            Artist7digitalid => int(&self.artist_7digitalid),
            ArtistLatitude => double(&self.artist_latitude),
            ArtistLongitude => double(&self.artist_longitude),
            ArtistLocation => text(&self.artist_location),
            ArtistName => text(&self.artist_name),
            Release => text(&self.release),
            Release7digitalid => int(&self.release_7digitalid),
            SongId => text(&self.song_id),
            SongHotttnesss => double(&self.song_hotttnesss),
            Title => text(&self.title),
            Track7digitalid => int(&self.track_7digitalid),
            SimilarArtists => Some(FieldValue::TextList(self.similar_artists.clone())),
            AnalysisSampleRate => int(&self.analysis_sample_rate),
            AudioMd5 => text(&self.audio_md5),
            Danceability => double(&self.danceability),
            Duration => double(&self.duration),
            EndOfFadeIn => double(&self.end_of_fade_in),
            Energy => double(&self.energy),
            Key => int(&self.key),
            KeyConfidence => double(&self.key_confidence),
            Loudness => double(&self.loudness),
            Mode => int(&self.mode),
            ModeConfidence => double(&self.mode_confidence),
            StartOfFadeOut => double(&self.start_of_fade_out),
            Tempo => double(&self.tempo),
            TimeSignature => int(&self.time_signature),
            TimeSignatureConfidence => double(&self.time_signature_confidence),
            Year => int(&self.year),
        }
    }

    /// Insert parameters in [`TrackField::ALL`] order
    pub fn bind_values(&self) -> Vec<Option<FieldValue>> {
        TrackField::ALL.iter().map(|&field| self.value(field)).collect()
    }
}

fn read_kind(file: &impl TrackFile, field: TrackField) -> Result<Option<FieldValue>> {
    match file.value(field)? {
        Some(value) if value.kind() != field.kind() => Err(Error::extraction(
            file.path(),
            format!(
                "field '{}' has kind {:?}, expected {:?}",
                field,
                value.kind(),
                field.kind()
            ),
        )),
        other => Ok(other),
    }
}

fn text(file: &impl TrackFile, field: TrackField) -> Result<Option<String>> {
    Ok(match read_kind(file, field)? {
        Some(FieldValue::Text(v)) => Some(v),
        _ => None,
    })
}

fn double(file: &impl TrackFile, field: TrackField) -> Result<Option<f64>> {
    Ok(match read_kind(file, field)? {
        Some(FieldValue::Double(v)) => Some(v),
        _ => None,
    })
}

fn int(file: &impl TrackFile, field: TrackField) -> Result<Option<i32>> {
    Ok(match read_kind(file, field)? {
        Some(FieldValue::Int(v)) => Some(v),
        _ => None,
    })
}

fn text_list(file: &impl TrackFile, field: TrackField) -> Result<Option<Vec<String>>> {
    Ok(match read_kind(file, field)? {
        Some(FieldValue::TextList(v)) => Some(v),
        _ => None,
    })
}

/// One row of the lyrics table (bag-of-words counts from musiXmatch)
///
/// Only the table is provisioned; no tool in this workspace fills it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LyricsRecord {
    pub track_id: String,
    pub mxm_track_id: String,
    /// Stemmed word to occurrence count
    pub counts: HashMap<String, i32>,
}
