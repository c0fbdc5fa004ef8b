//! Tracing subscriber setup shared by both tools
//!
//! Every event goes to standard output and to a local log file. The file is
//! truncated at startup so it only ever holds the latest run.

use crate::config::{IngestConfig, Tool};
use crate::{Error, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose events are logged at the configured level; everything else
/// (driver internals included) stays at `warn`.
const OWN_TARGETS: [&str; 3] = ["msd_common", "msd_schema", "msd_loader"];

/// Build the default filter directive for a level, e.g.
/// `warn,msd_common=info,msd_schema=info,msd_loader=info`
pub fn default_directive(level: &str) -> String {
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{}={}", target, level));
    }
    directive
}

/// Install the global subscriber. `RUST_LOG` replaces the configured level.
///
/// Returns the path of the log file that was opened.
pub fn init_logging(config: &IngestConfig, tool: Tool) -> Result<PathBuf> {
    let log_path = config.logging.file_for(tool);
    let log_file = File::create(&log_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(config.logging.level_for(tool))))
        .map_err(|e| Error::Config(format!("Invalid log level: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .try_init()
        .map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))?;

    Ok(log_path)
}
