//! msd-schema - Schema Provisioner
//!
//! Connects to the cluster and creates, if absent, the keyspace plus the
//! track and lyrics tables. Safe to run any number of times.

use anyhow::{Context, Result};
use clap::Parser;
use msd_common::config::ConfigOverrides;
use msd_common::db::ScyllaSession;
use msd_common::logging::init_logging;
use msd_common::{IngestConfig, Tool};
use msd_schema::provision_schema;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments for msd-schema
#[derive(Parser, Debug)]
#[command(name = "msd-schema")]
#[command(about = "Create the MSD keyspace and tables in a Cassandra cluster")]
#[command(version)]
struct Args {
    /// Cluster node addresses, space separated (at least one required)
    nodes: Vec<String>,

    /// TOML config file (overrides MSD_INGEST_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file path [default: schema_setup_log.txt]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Keyspace to create [default: music]
    #[arg(long)]
    keyspace: Option<String>,

    /// Replication factor for the configured datacenter [default: 3]
    #[arg(long)]
    replication_factor: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Missing addresses are reported but not fatal here; the connection
    // attempt below fails and is logged like any other connectivity error.
    if args.nodes.is_empty() {
        println!(
            "ERROR: No IP address specified. Provide space separated IP addresses (at least one required)."
        );
    }

    let overrides = ConfigOverrides {
        keyspace: args.keyspace.clone(),
        replication_factor: args.replication_factor,
        log_file: args.log_file.clone(),
    };
    let config = match IngestConfig::load(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_path = match init_logging(&config, Tool::SchemaSetup) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Log build identification immediately after tracing init
    info!(
        "Starting msd-schema v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Logging to {}", log_path.display());

    match run(&args.nodes, &config).await {
        Ok(()) => {
            info!("Schema setup terminated successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:?}", e);
            error!("Schema setup terminated unsuccessfully.");
            ExitCode::FAILURE
        }
    }
}

async fn run(nodes: &[String], config: &IngestConfig) -> Result<()> {
    let session = ScyllaSession::connect(nodes, config.connection.connect_timeout())
        .await
        .context("Failed to connect to Cassandra cluster")?;

    provision_schema(&session, config)
        .await
        .context("Failed to provision schema")?;

    Ok(())
}
