//! msd-loader - Bulk Loader
//!
//! Verifies that the schema exists, then pushes every track file under the
//! given directory into the track table.

use anyhow::{Context, Result};
use clap::Parser;
use msd_common::config::ConfigOverrides;
use msd_common::db::ScyllaSession;
use msd_common::logging::init_logging;
use msd_common::{IngestConfig, Tool};
use msd_loader::reader::Hdf5TrackReader;
use msd_loader::BulkLoader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments for msd-loader
#[derive(Parser, Debug)]
#[command(name = "msd-loader")]
#[command(about = "Load Million Song Dataset .h5 files into Cassandra")]
#[command(version)]
struct Args {
    /// Root directory of the dataset
    #[arg(short = 'd', long)]
    directory: PathBuf,

    /// Cluster node addresses
    #[arg(short = 'c', long, num_args = 1.., required = true)]
    cluster: Vec<String>,

    /// TOML config file (overrides MSD_INGEST_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file path [default: msd_push_log.txt]
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        log_file: args.log_file.clone(),
        ..ConfigOverrides::default()
    };
    let config = match IngestConfig::load(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_path = match init_logging(&config, Tool::DataPush) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Starting msd-loader v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Logging to {}", log_path.display());

    match run(&args.directory, &args.cluster, &config).await {
        Ok(()) => {
            info!("Data push terminated successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:?}", e);
            error!("Data push terminated unsuccessfully.");
            ExitCode::FAILURE
        }
    }
}

async fn run(directory: &Path, nodes: &[String], config: &IngestConfig) -> Result<()> {
    let session = ScyllaSession::connect(nodes, config.connection.connect_timeout())
        .await
        .context("Failed to connect to Cassandra cluster")?;

    BulkLoader::new(&session, &Hdf5TrackReader, config)
        .run(directory)
        .await
        .with_context(|| format!("Failed to load tracks from {}", directory.display()))?;

    Ok(())
}
