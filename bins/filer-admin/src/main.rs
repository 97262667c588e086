use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use filer_config::ConfigManager;
use filer_logging::init_logging;
use filer_store::{OpContext, StoreRegistry};

mod commands;
mod config;

use commands::Command;
use config::AdminConfig;

/// Filer metadata store administration tool
///
/// Opens the configured store backend and runs one metadata or KV command
/// against it.
#[derive(Parser, Debug)]
#[command(name = "filer-admin", version, about)]
struct Cli {
    /// TOML config file with [log] and [store] sections.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override store.backend from the config.
    #[arg(long)]
    backend: Option<String>,

    /// Override store.cluster_file from the config.
    #[arg(long)]
    cluster_file: Option<String>,

    /// Give up on the command after this many milliseconds.
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigManager::<AdminConfig>::load(path)?.snapshot(),
        None => AdminConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.store.backend = backend;
    }
    if let Some(cluster_file) = cli.cluster_file {
        config.store.cluster_file = cluster_file;
    }
    if cli.verbose {
        config.log.level = "debug".into();
    }
    let _log_guard = init_logging(&config.log)?;

    let registry = StoreRegistry::with_builtin();
    let store = registry.open(&config.store)?;

    let (ctx, cancel) =
        OpContext::with_timeout(Duration::from_millis(cli.timeout_ms)).cancellable();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            cancel.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let result = cli.command.run(&registry, &*store, &ctx, &mut stdout).await;
    store.shutdown().await;
    drop(store);
    #[cfg(feature = "fdb")]
    filer_store::stop_fdb_network();
    result
}
