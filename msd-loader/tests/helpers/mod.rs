//! Test helpers for msd-loader integration tests
//!
//! `JsonTrackReader` stands in for the HDF5 reader: each track file is a JSON
//! object of `field name -> value`. Fields left out read as absent.

#![allow(dead_code)]

pub mod log_capture;

use msd_common::db::{
    CqlSession, KeyspaceDefinition, LyricsTableSchema, MemorySession, TableSchema,
    TrackTableSchema,
};
use msd_common::track::ValueKind;
use msd_common::{Error, FieldValue, IngestConfig, Result, TrackField, TrackFile};
use msd_loader::TrackReader;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reader that counts how many files it opened and how many were closed
#[derive(Default, Clone)]
pub struct JsonTrackReader {
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl JsonTrackReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl TrackReader for JsonTrackReader {
    type File = JsonTrackFile;

    fn open(&self, path: &Path) -> Result<JsonTrackFile> {
        let content = fs::read_to_string(path).map_err(|e| Error::extraction(path, e))?;
        let values: Map<String, Value> =
            serde_json::from_str(&content).map_err(|e| Error::extraction(path, e))?;

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(JsonTrackFile {
            path: path.to_path_buf(),
            values,
            closed: Arc::clone(&self.closed),
        })
    }
}

pub struct JsonTrackFile {
    path: PathBuf,
    values: Map<String, Value>,
    closed: Arc<AtomicUsize>,
}

impl Drop for JsonTrackFile {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl TrackFile for JsonTrackFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn value(&self, field: TrackField) -> Result<Option<FieldValue>> {
        let Some(value) = self.values.get(field.name()) else {
            return Ok(None);
        };

        let converted = match field.kind() {
            ValueKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
            ValueKind::Double => value.as_f64().map(FieldValue::Double),
            ValueKind::Int => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(FieldValue::Int),
            ValueKind::TextList => value.as_array().and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(FieldValue::TextList)
            }),
        };

        converted
            .map(Some)
            .ok_or_else(|| Error::extraction(&self.path, format!("bad value for '{}': {}", field, value)))
    }
}

/// Write a track file holding `fields`, creating parent directories
pub fn write_track(path: &Path, fields: Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(&fields).unwrap()).unwrap();
}

/// Minimal track: id and year only
pub fn minimal_track(track_id: &str, year: i32) -> Value {
    json!({ "track_id": track_id, "year": year })
}

/// Track with every column populated
pub fn full_track(track_id: &str) -> Value {
    json!({
        "track_id": track_id,
        "artist_familiarity": 0.649821752207,
        "artist_hotttnesss": 0.394031892714,
        "artist_id": "ARYZTJS1187B98C555",
        "artist_mbid": "357ff05d-848a-44cf-b608-cb34b5701ae5",
        "artist_playmeid": 1338,
        "artist_7digitalid": 145,
        "artist_latitude": 40.71455,
        "artist_longitude": -74.00712,
        "artist_location": "New York, NY",
        "artist_name": "Faster Pussy cat",
        "release": "Monster Ballads X-Mas",
        "release_7digitalid": 633681,
        "song_id": "SOQMMHC12AB0180CB8",
        "song_hotttnesss": 0.542899,
        "title": "Silent Night",
        "track_7digitalid": 7032331,
        "similar_artists": ["ARV4KO21187FB38008", "ARWHM281187FB3D381", "ARJGOG11187B98D89F"],
        "analysis_sample_rate": 22050,
        "audio_md5": "aee9820911781c734e7694c5432990ca",
        "danceability": 0.0,
        "duration": 252.05506,
        "end_of_fade_in": 2.049,
        "energy": 0.0,
        "key": 10,
        "key_confidence": 0.777,
        "loudness": -4.829,
        "mode": 0,
        "mode_confidence": 0.688,
        "start_of_fade_out": 236.635,
        "tempo": 87.002,
        "time_signature": 4,
        "time_signature_confidence": 0.94,
        "year": 2003
    })
}

/// In-memory cluster with the keyspace and both tables in place
pub async fn provisioned_session(config: &IngestConfig) -> MemorySession {
    let session = MemorySession::new();
    provision(&session, config).await;
    session
}

pub async fn provision(session: &MemorySession, config: &IngestConfig) {
    session
        .create_keyspace(&KeyspaceDefinition::from_config(config))
        .await
        .unwrap();
    session
        .create_table(&TrackTableSchema::definition(&config.keyspace, &config.track_table))
        .await
        .unwrap();
    session
        .create_table(&LyricsTableSchema::definition(&config.keyspace, &config.lyrics_table))
        .await
        .unwrap();
}
