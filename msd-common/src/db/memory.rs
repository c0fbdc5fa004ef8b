//! In-memory [`CqlSession`] for tests
//!
//! Models just enough of the cluster: keyspaces, tables, rows keyed by the
//! primary key (inserts overwrite), plus counters and failure injection.

use crate::db::schema::{InsertStatement, KeyspaceDefinition, TableDefinition};
use crate::db::session::CqlSession;
use crate::track::{FieldValue, TrackRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Stored row: bound values in insert column order
pub type Row = Vec<Option<FieldValue>>;

#[derive(Debug, Default)]
struct State {
    keyspaces: BTreeMap<String, KeyspaceDefinition>,
    tables: BTreeMap<String, TableDefinition>,
    rows: BTreeMap<String, BTreeMap<String, Row>>,
    current_keyspace: Option<String>,
    statements: usize,
    inserts: usize,
    catalog_queries: usize,
    fail_insert_at: Option<usize>,
    fail_table: Option<String>,
}

/// Cluster stand-in shared by the provisioner and loader tests
#[derive(Debug, Default)]
pub struct MemorySession {
    state: Mutex<State>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `n`th insert (1-based) fail with an insert error
    pub fn fail_insert_at(self, n: usize) -> Self {
        self.state().fail_insert_at = Some(n);
        self
    }

    /// Make creation of the named table fail
    pub fn fail_table(self, name: &str) -> Self {
        self.state().fail_table = Some(name.to_string());
        self
    }

    /// Drop injected failures, e.g. to model a rerun after an outage
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_insert_at = None;
        state.fail_table = None;
    }

    pub fn keyspace(&self, name: &str) -> Option<KeyspaceDefinition> {
        self.state().keyspaces.get(name).cloned()
    }

    pub fn keyspace_count(&self) -> usize {
        self.state().keyspaces.len()
    }

    pub fn table(&self, keyspace: &str, name: &str) -> Option<TableDefinition> {
        self.state()
            .tables
            .get(&format!("{}.{}", keyspace, name))
            .cloned()
    }

    pub fn table_count(&self) -> usize {
        self.state().tables.len()
    }

    pub fn current_keyspace(&self) -> Option<String> {
        self.state().current_keyspace.clone()
    }

    /// Rows of a table keyed by primary key
    pub fn rows(&self, keyspace: &str, table: &str) -> BTreeMap<String, Row> {
        self.state()
            .rows
            .get(&format!("{}.{}", keyspace, table))
            .cloned()
            .unwrap_or_default()
    }

    /// Insert attempts, failed ones included
    pub fn insert_count(&self) -> usize {
        self.state().inserts
    }

    /// Schema statements executed (keyspace, use, table)
    pub fn statement_count(&self) -> usize {
        self.state().statements
    }

    pub fn catalog_query_count(&self) -> usize {
        self.state().catalog_queries
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CqlSession for MemorySession {
    async fn create_keyspace(&self, keyspace: &KeyspaceDefinition) -> Result<()> {
        let mut state = self.state();
        state.statements += 1;
        state
            .keyspaces
            .entry(keyspace.name.clone())
            .or_insert_with(|| keyspace.clone());
        Ok(())
    }

    async fn use_keyspace(&self, keyspace: &str) -> Result<()> {
        let mut state = self.state();
        state.statements += 1;
        if !state.keyspaces.contains_key(keyspace) {
            return Err(Error::Statement(format!("Keyspace '{}' does not exist", keyspace)));
        }
        state.current_keyspace = Some(keyspace.to_string());
        Ok(())
    }

    async fn create_table(&self, table: &TableDefinition) -> Result<()> {
        let mut state = self.state();
        state.statements += 1;

        if state.fail_table.as_deref() == Some(table.name.as_str()) {
            return Err(Error::Statement(format!(
                "{}: injected failure",
                table.create_cql()
            )));
        }
        if !state.keyspaces.contains_key(&table.keyspace) {
            return Err(Error::Statement(format!(
                "Cannot add table '{}' to non existing keyspace '{}'",
                table.name, table.keyspace
            )));
        }

        state
            .tables
            .entry(table.qualified_name())
            .or_insert_with(|| table.clone());
        Ok(())
    }

    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool> {
        let mut state = self.state();
        state.catalog_queries += 1;
        Ok(state.keyspaces.contains_key(keyspace))
    }

    async fn table_exists(&self, keyspace: &str, table: &str) -> Result<bool> {
        let mut state = self.state();
        state.catalog_queries += 1;
        Ok(state.tables.contains_key(&format!("{}.{}", keyspace, table)))
    }

    async fn insert_track(&self, statement: &InsertStatement, record: &TrackRecord) -> Result<()> {
        let mut state = self.state();
        state.inserts += 1;

        let insert_error = |reason: String| Error::Insert {
            track_id: record.track_id.clone(),
            reason,
        };

        if state.fail_insert_at == Some(state.inserts) {
            return Err(insert_error("injected failure".to_string()));
        }

        let qualified = format!("{}.{}", statement.keyspace, statement.table);
        let table = state
            .tables
            .get(&qualified)
            .ok_or_else(|| insert_error(format!("unconfigured table {}", qualified)))?;

        let values = record.bind_values();
        if values.len() != statement.columns.len() || table.columns.len() != values.len() {
            return Err(insert_error(format!(
                "expected {} values, got {}",
                table.columns.len(),
                values.len()
            )));
        }

        state
            .rows
            .entry(qualified)
            .or_default()
            .insert(record.track_id.clone(), values);
        Ok(())
    }
}
