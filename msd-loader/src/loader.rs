//! Bulk load pipeline
//!
//! Schema gate, then one directory at a time: read every file, insert one row
//! per file. The first error of any kind ends the run.

use crate::reader::{read_track, TrackReader};
use crate::scanner::DirectoryScanner;
use chrono::{DateTime, Duration, Utc};
use msd_common::db::{CqlSession, InsertStatement};
use msd_common::{Error, IngestConfig, Result, SchemaObject};
use std::path::Path;
use tracing::{debug, enabled, info, Level};

/// Check that the keyspace and the track table exist
///
/// The loader never creates schema; a missing object is reported as
/// [`Error::SchemaAbsent`] so the operator knows to run `msd-schema` first.
pub async fn validate_schema<S: CqlSession>(session: &S, config: &IngestConfig) -> Result<()> {
    if !session.keyspace_exists(&config.keyspace).await? {
        return Err(Error::SchemaAbsent {
            kind: SchemaObject::Keyspace,
            name: config.keyspace.clone(),
        });
    }
    info!("Verified keyspace existence for '{}'.", config.keyspace);

    if !session
        .table_exists(&config.keyspace, &config.track_table)
        .await?
    {
        return Err(Error::SchemaAbsent {
            kind: SchemaObject::Table,
            name: config.track_table.clone(),
        });
    }
    info!("Verified table existence for '{}'.", config.track_table);

    Ok(())
}

/// Outcome of a completed load
#[derive(Debug, Clone)]
pub struct LoadSummary {
    /// Directories visited, empty ones included
    pub directories: usize,
    /// Rows inserted
    pub tracks: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoadSummary {
    pub fn elapsed(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

/// Loads a dataset tree into the track table
pub struct BulkLoader<'a, S, R> {
    session: &'a S,
    reader: &'a R,
    config: &'a IngestConfig,
}

impl<'a, S: CqlSession, R: TrackReader> BulkLoader<'a, S, R> {
    pub fn new(session: &'a S, reader: &'a R, config: &'a IngestConfig) -> Self {
        Self {
            session,
            reader,
            config,
        }
    }

    /// Validate the schema, then load every file below `root`
    pub async fn run(&self, root: &Path) -> Result<LoadSummary> {
        let started_at = Utc::now();

        validate_schema(self.session, self.config).await?;

        let statement = InsertStatement::track(self.config);
        debug!("Insert statement: {}", statement.cql());

        let mut directories = 0;
        let mut tracks = 0;

        for batch in DirectoryScanner.directories(root)? {
            let batch = batch?;

            for path in &batch.files {
                let record = read_track(self.reader, path)?;

                if enabled!(Level::DEBUG) {
                    match serde_json::to_string(&record) {
                        Ok(json) => debug!("Track {}: {}", path.display(), json),
                        Err(e) => debug!("Track {}: <unserializable: {}>", path.display(), e),
                    }
                }

                self.session.insert_track(&statement, &record).await?;
                tracks += 1;
            }

            directories += 1;
            info!("Pushed data from '{}'", batch.dir.display());
        }

        let summary = LoadSummary {
            directories,
            tracks,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Loaded {} tracks from {} directories in {}s",
            summary.tracks,
            summary.directories,
            summary.elapsed().num_seconds()
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msd_common::db::{
        KeyspaceDefinition, LyricsTableSchema, MemorySession, TableSchema, TrackTableSchema,
    };

    async fn with_keyspace(config: &IngestConfig) -> MemorySession {
        let session = MemorySession::new();
        session
            .create_keyspace(&KeyspaceDefinition::from_config(config))
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_validate_missing_keyspace() {
        let session = MemorySession::new();
        let err = validate_schema(&session, &IngestConfig::default())
            .await
            .unwrap_err();

        match err {
            Error::SchemaAbsent { kind, name } => {
                assert_eq!(kind, SchemaObject::Keyspace);
                assert_eq!(name, "music");
            }
            other => panic!("Expected SchemaAbsent, got {:?}", other),
        }
        // Table lookup is skipped once the keyspace is missing
        assert_eq!(session.catalog_query_count(), 1);
    }

    #[tokio::test]
    async fn test_validate_missing_table() {
        let config = IngestConfig::default();
        let session = with_keyspace(&config).await;

        let err = validate_schema(&session, &config).await.unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaAbsent {
                kind: SchemaObject::Table,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_validate_only_needs_track_table() {
        let config = IngestConfig::default();
        let session = with_keyspace(&config).await;
        session
            .create_table(&TrackTableSchema::definition(&config.keyspace, &config.track_table))
            .await
            .unwrap();

        validate_schema(&session, &config).await.unwrap();
        assert_eq!(session.catalog_query_count(), 2);
        assert!(session.table("music", "lyrics").is_none());
    }

    #[tokio::test]
    async fn test_validate_provisioned_schema() {
        let config = IngestConfig::default();
        let session = with_keyspace(&config).await;
        for table in [
            TrackTableSchema::definition(&config.keyspace, &config.track_table),
            LyricsTableSchema::definition(&config.keyspace, &config.lyrics_table),
        ] {
            session.create_table(&table).await.unwrap();
        }

        validate_schema(&session, &config).await.unwrap();
    }

    #[test]
    fn test_summary_elapsed() {
        let started_at = Utc::now();
        let summary = LoadSummary {
            directories: 3,
            tracks: 10,
            started_at,
            finished_at: started_at + Duration::seconds(90),
        };
        assert_eq!(summary.elapsed().num_seconds(), 90);
    }
}
