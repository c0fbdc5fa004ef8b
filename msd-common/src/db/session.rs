//! Cluster session seam
//!
//! The provisioner and loader only talk to the cluster through [`CqlSession`].
//! [`ScyllaSession`] is the real driver-backed implementation; tests use the
//! in-memory session from `db::memory`.

use crate::db::schema::{InsertStatement, KeyspaceDefinition, TableDefinition};
use crate::track::{FieldValue, TrackRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::CqlValue;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Operations both tools need from a cluster session
///
/// Calls are awaited one at a time; nothing here is shared across tasks.
#[async_trait]
pub trait CqlSession: Send + Sync {
    /// `CREATE KEYSPACE IF NOT EXISTS`
    async fn create_keyspace(&self, keyspace: &KeyspaceDefinition) -> Result<()>;

    /// Make `keyspace` the session default
    async fn use_keyspace(&self, keyspace: &str) -> Result<()>;

    /// `CREATE TABLE IF NOT EXISTS`
    async fn create_table(&self, table: &TableDefinition) -> Result<()>;

    /// Look the keyspace up in the system catalog
    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool>;

    /// Look the table up in the system catalog
    async fn table_exists(&self, keyspace: &str, table: &str) -> Result<bool>;

    /// Upsert one track row
    async fn insert_track(&self, statement: &InsertStatement, record: &TrackRecord) -> Result<()>;
}

/// Session backed by the `scylla` driver (works against Cassandra too)
pub struct ScyllaSession {
    session: Session,
    prepared: Mutex<HashMap<String, PreparedStatement>>,
}

impl ScyllaSession {
    /// Connect to the cluster through any of the given contact points
    pub async fn connect(nodes: &[String], connect_timeout: Option<Duration>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::Connectivity(
                "No contact points given (at least one node address is required)".to_string(),
            ));
        }

        let mut builder = SessionBuilder::new().known_nodes(nodes);
        if let Some(timeout) = connect_timeout {
            builder = builder.connection_timeout(timeout);
        }

        let session = builder
            .build()
            .await
            .map_err(|e| Error::Connectivity(format!("[{}]: {}", nodes.join(", "), e)))?;

        info!("Connected to Cassandra cluster [{}]", nodes.join(", "));

        Ok(Self {
            session,
            prepared: Mutex::new(HashMap::new()),
        })
    }

    async fn execute_ddl(&self, cql: String) -> Result<()> {
        debug!("Executing: {}", cql);
        self.session
            .query_unpaged(cql.as_str(), ())
            .await
            .map_err(|e| Error::Statement(format!("{}: {}", cql, e)))?;
        Ok(())
    }

    async fn catalog_has_rows(&self, cql: &str, values: Vec<&str>) -> Result<bool> {
        let result = self
            .session
            .query_unpaged(cql, values)
            .await
            .map_err(|e| Error::Statement(format!("{}: {}", cql, e)))?;

        let rows = result
            .into_rows_result()
            .map_err(|e| Error::Statement(format!("{}: {}", cql, e)))?;

        Ok(rows.rows_num() > 0)
    }

    /// Prepare once per statement text; later calls reuse the cached handle
    async fn prepared(&self, cql: &str) -> Result<PreparedStatement> {
        let cached = self
            .prepared
            .lock()
            .map_err(|_| Error::Statement("prepared statement cache poisoned".to_string()))?
            .get(cql)
            .cloned();

        if let Some(statement) = cached {
            return Ok(statement);
        }

        let statement = self
            .session
            .prepare(cql)
            .await
            .map_err(|e| Error::Statement(format!("{}: {}", cql, e)))?;

        self.prepared
            .lock()
            .map_err(|_| Error::Statement("prepared statement cache poisoned".to_string()))?
            .insert(cql.to_string(), statement.clone());

        Ok(statement)
    }
}

#[async_trait]
impl CqlSession for ScyllaSession {
    async fn create_keyspace(&self, keyspace: &KeyspaceDefinition) -> Result<()> {
        self.execute_ddl(keyspace.create_cql()).await
    }

    async fn use_keyspace(&self, keyspace: &str) -> Result<()> {
        self.session
            .use_keyspace(keyspace, false)
            .await
            .map_err(|e| Error::Statement(format!("USE {}: {}", keyspace, e)))
    }

    async fn create_table(&self, table: &TableDefinition) -> Result<()> {
        self.execute_ddl(table.create_cql()).await
    }

    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool> {
        self.catalog_has_rows(
            "SELECT keyspace_name FROM system_schema.keyspaces WHERE keyspace_name = ?",
            vec![keyspace],
        )
        .await
    }

    async fn table_exists(&self, keyspace: &str, table: &str) -> Result<bool> {
        self.catalog_has_rows(
            "SELECT table_name FROM system_schema.tables WHERE keyspace_name = ? AND table_name = ?",
            vec![keyspace, table],
        )
        .await
    }

    async fn insert_track(&self, statement: &InsertStatement, record: &TrackRecord) -> Result<()> {
        let prepared = self.prepared(&statement.cql()).await?;
        let values: Vec<Option<CqlValue>> = record
            .bind_values()
            .into_iter()
            .map(|value| value.map(to_cql_value))
            .collect();

        self.session
            .execute_unpaged(&prepared, values)
            .await
            .map_err(|e| Error::Insert {
                track_id: record.track_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn to_cql_value(value: FieldValue) -> CqlValue {
    match value {
        FieldValue::Text(v) => CqlValue::Text(v),
        FieldValue::Double(v) => CqlValue::Double(v),
        FieldValue::Int(v) => CqlValue::Int(v),
        FieldValue::TextList(items) => {
            CqlValue::List(items.into_iter().map(CqlValue::Text).collect())
        }
    }
}
