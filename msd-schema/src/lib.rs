//! msd-schema library - Schema provisioning for the MSD keyspace
//!
//! Creates, idempotently, the keyspace and the two tables the loader and
//! downstream consumers rely on. Nothing is ever altered or dropped.

use msd_common::db::{
    CqlSession, KeyspaceDefinition, LyricsTableSchema, TableSchema, TrackTableSchema,
};
use msd_common::{IngestConfig, Result};
use tracing::info;

/// Create keyspace, switch to it, then create the track and lyrics tables
///
/// Each step is `IF NOT EXISTS`; rerunning after a partial failure finishes
/// the job. The first failing step is returned to the caller.
pub async fn provision_schema<S: CqlSession>(session: &S, config: &IngestConfig) -> Result<()> {
    create_keyspace(session, config).await?;
    create_tables(session, config).await
}

async fn create_keyspace<S: CqlSession>(session: &S, config: &IngestConfig) -> Result<()> {
    let keyspace = KeyspaceDefinition::from_config(config);
    session.create_keyspace(&keyspace).await?;
    info!(
        "Created KEYSPACE '{}' (NetworkTopologyStrategy, {}: {})",
        keyspace.name, keyspace.datacenter, keyspace.replication_factor
    );
    Ok(())
}

async fn create_tables<S: CqlSession>(session: &S, config: &IngestConfig) -> Result<()> {
    session.use_keyspace(&config.keyspace).await?;

    let track_table = TrackTableSchema::definition(&config.keyspace, &config.track_table);
    session.create_table(&track_table).await?;
    info!("Created TABLE: {}", track_table.qualified_name());

    let lyrics_table = LyricsTableSchema::definition(&config.keyspace, &config.lyrics_table);
    session.create_table(&lyrics_table).await?;
    info!("Created TABLE: {}", lyrics_table.qualified_name());

    Ok(())
}
