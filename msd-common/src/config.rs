//! Configuration loading and resolution
//!
//! Both tools share one immutable [`IngestConfig`], built once at startup and
//! passed by reference to every component.
//!
//! Resolution order (first match wins):
//! 1. Command-line arguments (`--config`, plus per-value overrides)
//! 2. Environment variable `MSD_INGEST_CONFIG` naming a TOML file
//! 3. TOML config file in the user config directory
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "MSD_INGEST_CONFIG";

/// Longest identifier Cassandra accepts for keyspace and table names
const MAX_IDENTIFIER_LEN: usize = 48;

/// Which command-line tool is running; selects logging defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Schema provisioner (`msd-schema`)
    SchemaSetup,
    /// Bulk loader (`msd-loader`)
    DataPush,
}

impl Tool {
    pub fn default_log_file(self) -> PathBuf {
        match self {
            Tool::SchemaSetup => PathBuf::from("schema_setup_log.txt"),
            Tool::DataPush => PathBuf::from("msd_push_log.txt"),
        }
    }

    pub fn default_log_level(self) -> &'static str {
        match self {
            Tool::SchemaSetup => "debug",
            Tool::DataPush => "info",
        }
    }
}

/// Shared configuration for keyspace layout, connection and logging
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Keyspace holding both tables
    pub keyspace: String,

    /// Wide per-track table
    pub track_table: String,

    /// Word-count lyrics table
    pub lyrics_table: String,

    pub replication: ReplicationConfig,

    pub connection: ConnectionConfig,

    pub logging: LoggingConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            keyspace: "music".to_string(),
            track_table: "msd".to_string(),
            lyrics_table: "lyrics".to_string(),
            replication: ReplicationConfig::default(),
            connection: ConnectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `NetworkTopologyStrategy` replication settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplicationConfig {
    /// Datacenter name the factor applies to
    pub datacenter: String,

    /// Copies of each row kept in that datacenter
    pub factor: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            datacenter: "DC1".to_string(),
            factor: 3,
        }
    }
}

/// Cluster connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in seconds; driver default when unset
    pub connect_timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// Logging configuration
///
/// Unset values fall back to the running tool's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log file path, truncated on every run
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn level_for(&self, tool: Tool) -> &str {
        self.level.as_deref().unwrap_or_else(|| tool.default_log_level())
    }

    pub fn file_for(&self, tool: Tool) -> PathBuf {
        self.file.clone().unwrap_or_else(|| tool.default_log_file())
    }
}

/// Values given on the command line, applied over the loaded file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub keyspace: Option<String>,
    pub replication_factor: Option<u32>,
    pub log_file: Option<PathBuf>,
}

impl IngestConfig {
    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve configuration following the documented priority order,
    /// apply command-line overrides, then validate.
    pub fn load(explicit: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let config = Self::load_base(explicit)?.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn load_base(explicit: Option<&Path>) -> Result<Self> {
        // Priority 1: Command-line argument
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }

        // Priority 3: User config file, only if present
        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }

        // Priority 4: Compiled defaults
        Ok(Self::default())
    }

    fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(keyspace) = &overrides.keyspace {
            self.keyspace = keyspace.clone();
        }
        if let Some(factor) = overrides.replication_factor {
            self.replication.factor = factor;
        }
        if let Some(file) = &overrides.log_file {
            self.logging.file = Some(file.clone());
        }
        self
    }

    /// Reject names the cluster would refuse before any connection is made
    pub fn validate(&self) -> Result<()> {
        validate_identifier("keyspace", &self.keyspace)?;
        validate_identifier("track_table", &self.track_table)?;
        validate_identifier("lyrics_table", &self.lyrics_table)?;

        let datacenter = &self.replication.datacenter;
        if datacenter.is_empty() || datacenter.contains('\'') {
            return Err(Error::Config(format!(
                "replication.datacenter '{}' is not a valid datacenter name",
                datacenter
            )));
        }

        if self.track_table == self.lyrics_table {
            return Err(Error::Config(format!(
                "track_table and lyrics_table must differ (both '{}')",
                self.track_table
            )));
        }

        if self.replication.factor == 0 {
            return Err(Error::Config(
                "replication.factor must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// `<config dir>/msd-ingest/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("msd-ingest").join("config.toml"))
}

/// Unquoted CQL identifiers are folded to lower case on creation but matched
/// verbatim in `system_schema`, so only lower-case names are accepted.
fn validate_identifier(key: &str, value: &str) -> Result<()> {
    let mut chars = value.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_valid = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_with_letter || !rest_valid || value.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::Config(format!(
            "{} '{}' is not a valid identifier (lower-case letter first, then lower-case letters, digits or '_', at most {} chars)",
            key, value, MAX_IDENTIFIER_LEN
        )));
    }

    Ok(())
}
