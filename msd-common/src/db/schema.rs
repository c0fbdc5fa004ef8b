//! Keyspace and table definitions
//!
//! Declarative schema: column lists live in code and are rendered to CQL.
//! Both statements use `IF NOT EXISTS`, so provisioning can be rerun freely.
//!
//! # Usage
//!
//! ```rust,ignore
//! let table = TrackTableSchema::definition(&config.keyspace, &config.track_table);
//! session.create_table(&table).await?;
//! ```

use crate::config::IngestConfig;
use crate::track::TrackField;
use std::fmt;

/// CQL column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CqlType {
    Text,
    Double,
    Int,
    List(Box<CqlType>),
    Map(Box<CqlType>, Box<CqlType>),
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlType::Text => f.write_str("text"),
            CqlType::Double => f.write_str("double"),
            CqlType::Int => f.write_str("int"),
            CqlType::List(inner) => write!(f, "list<{}>", inner),
            CqlType::Map(key, value) => write!(f, "map<{}, {}>", key, value),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    pub cql_type: CqlType,
    /// Single-column PRIMARY KEY
    pub primary_key: bool,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, cql_type: CqlType) -> Self {
        Self {
            name: name.into(),
            cql_type,
            primary_key: false,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    fn to_cql(&self) -> String {
        if self.primary_key {
            format!("{} {} PRIMARY KEY", self.name, self.cql_type)
        } else {
            format!("{} {}", self.name, self.cql_type)
        }
    }
}

/// Defines the expected columns of a table; the name comes from configuration
pub trait TableSchema {
    /// Column definitions in creation order
    fn columns() -> Vec<ColumnDefinition>;

    /// Bind the columns to a concrete keyspace and table name
    fn definition(keyspace: &str, table: &str) -> TableDefinition {
        TableDefinition {
            keyspace: keyspace.to_string(),
            name: table.to_string(),
            columns: Self::columns(),
        }
    }
}

/// Track table: one row per song, keyed by `track_id`
pub struct TrackTableSchema;

impl TableSchema for TrackTableSchema {
    fn columns() -> Vec<ColumnDefinition> {
        TrackField::ALL
            .iter()
            .map(|&field| {
                let column = ColumnDefinition::new(field.name(), field.cql_type());
                if field == TrackField::TrackId {
                    column.primary_key()
                } else {
                    column
                }
            })
            .collect()
    }
}

/// Lyrics table: musiXmatch word counts per track
pub struct LyricsTableSchema;

impl TableSchema for LyricsTableSchema {
    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("track_id", CqlType::Text).primary_key(),
            ColumnDefinition::new("mxm_track_id", CqlType::Text),
            ColumnDefinition::new(
                "counts",
                CqlType::Map(Box::new(CqlType::Text), Box::new(CqlType::Int)),
            ),
        ]
    }
}

/// A table bound to its keyspace
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub keyspace: String,
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// `keyspace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn create_cql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::to_cql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.qualified_name(),
            columns.join(", ")
        )
    }
}

/// Keyspace with `NetworkTopologyStrategy` replication in one datacenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceDefinition {
    pub name: String,
    pub datacenter: String,
    pub replication_factor: u32,
}

impl KeyspaceDefinition {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            name: config.keyspace.clone(),
            datacenter: config.replication.datacenter.clone(),
            replication_factor: config.replication.factor,
        }
    }

    pub fn create_cql(&self) -> String {
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{ 'class': 'NetworkTopologyStrategy', '{}': {} }}",
            self.name, self.datacenter, self.replication_factor
        )
    }
}

/// Unconditional insert of every track column
///
/// No `IF NOT EXISTS`: inserting an existing key overwrites the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub keyspace: String,
    pub table: String,
    pub columns: Vec<&'static str>,
}

impl InsertStatement {
    pub fn track(config: &IngestConfig) -> Self {
        Self {
            keyspace: config.keyspace.clone(),
            table: config.track_table.clone(),
            columns: TrackField::ALL.iter().map(|f| f.name()).collect(),
        }
    }

    pub fn cql(&self) -> String {
        let markers = vec!["?"; self.columns.len()];
        format!(
            "INSERT INTO {}.{} ({}) VALUES ({})",
            self.keyspace,
            self.table,
            self.columns.join(", "),
            markers.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_cql() {
        let keyspace = KeyspaceDefinition::from_config(&IngestConfig::default());
        assert_eq!(
            keyspace.create_cql(),
            "CREATE KEYSPACE IF NOT EXISTS music WITH replication = { 'class': 'NetworkTopologyStrategy', 'DC1': 3 }"
        );
    }

    #[test]
    fn test_lyrics_table_cql() {
        let table = LyricsTableSchema::definition("music", "lyrics");
        assert_eq!(
            table.create_cql(),
            "CREATE TABLE IF NOT EXISTS music.lyrics (track_id text PRIMARY KEY, mxm_track_id text, counts map<text, int>)"
        );
    }

    #[test]
    fn test_track_table_definition() {
        let table = TrackTableSchema::definition("music", "msd");

        assert_eq!(table.columns.len(), 34);
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("track_id"));
        assert_eq!(table.columns.iter().filter(|c| c.primary_key).count(), 1);

        let cql = table.create_cql();
        assert!(cql.starts_with("CREATE TABLE IF NOT EXISTS music.msd (track_id text PRIMARY KEY, "));
        assert!(cql.contains("similar_artists list<text>, "));
        assert!(cql.contains("artist_7digitalid int, "));
        assert!(cql.ends_with("time_signature_confidence double, year int)"));
    }

    #[test]
    fn test_insert_statement_matches_table_columns() {
        let insert = InsertStatement::track(&IngestConfig::default());
        let table = TrackTableSchema::definition("music", "msd");

        let table_columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(insert.columns, table_columns);

        let cql = insert.cql();
        assert!(cql.starts_with("INSERT INTO music.msd (track_id, artist_familiarity, "));
        assert_eq!(cql.matches('?').count(), 34);
        assert!(!cql.contains("IF NOT EXISTS"));
    }
}
