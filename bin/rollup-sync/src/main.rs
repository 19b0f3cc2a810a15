//! The rollup synchronizer binary.

use clap::Parser;
use rollup_sync::RollupSyncArgs;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = rollup_sync::run(RollupSyncArgs::parse()).await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
