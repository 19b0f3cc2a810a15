use crate::constants::{
    DEFAULT_DATABASE_URL, PROVIDER_COMPUTE_UNITS_PER_SECOND, PROVIDER_INITIAL_BACKOFF,
    PROVIDER_MAX_RETRIES,
};

use alloy_primitives::{Address, B256};
use rollup_sync_primitives::RollupParameters;
use rollup_sync_reconciler::DEFAULT_MAX_REORG_DEPTH;
use rollup_sync_watcher::{DEFAULT_SYNC_CHUNK_SIZE, DEFAULT_SYNC_INTERVAL};
use std::time::Duration;

/// The arguments of the rollup synchronizer.
#[derive(Debug, clap::Parser)]
#[command(name = "rollup-sync", about = "Reconciles the rollup ledger against the L1")]
pub struct RollupSyncArgs {
    /// The database url.
    #[arg(
        long = "db.url",
        id = "db_url",
        env = "ROLLUP_SYNC_DB_URL",
        default_value = DEFAULT_DATABASE_URL,
    )]
    pub database_url: String,
    /// The L1 provider arguments.
    #[command(flatten)]
    pub l1_provider_args: L1ProviderArgs,
    /// The L1 watcher arguments.
    #[command(flatten)]
    pub watcher_args: WatcherArgs,
    /// The genesis of the ledger.
    #[command(flatten)]
    pub genesis_args: GenesisArgs,
    /// The deepest reorg that is rolled back. Deeper reorgs stop the synchronizer.
    #[arg(
        long = "reorg.max-depth",
        id = "max_reorg_depth",
        default_value_t = DEFAULT_MAX_REORG_DEPTH,
    )]
    pub max_reorg_depth: u64,
}

/// The arguments of the L1 provider.
#[derive(Debug, Clone, clap::Args)]
pub struct L1ProviderArgs {
    /// The URL of the L1 RPC endpoint.
    #[arg(long = "l1.url", id = "l1_url", env = "ROLLUP_SYNC_L1_URL")]
    pub url: reqwest::Url,
    /// The compute units per second for the provider.
    #[arg(
        long = "l1.cups",
        id = "l1_compute_units_per_second",
        default_value_t = PROVIDER_COMPUTE_UNITS_PER_SECOND,
    )]
    pub compute_units_per_second: u64,
    /// The max amount of retries for the provider.
    #[arg(long = "l1.max-retries", id = "l1_max_retries", default_value_t = PROVIDER_MAX_RETRIES)]
    pub max_retries: u32,
    /// The initial backoff for the provider, in milliseconds.
    #[arg(
        long = "l1.initial-backoff",
        id = "l1_initial_backoff",
        default_value_t = PROVIDER_INITIAL_BACKOFF,
    )]
    pub initial_backoff: u64,
}

/// The arguments of the L1 watcher.
#[derive(Debug, Clone, clap::Args)]
pub struct WatcherArgs {
    /// The address of the rollup contract.
    #[arg(long = "contract.address", id = "contract_address", env = "ROLLUP_SYNC_CONTRACT")]
    pub contract_address: Address,
    /// The number of blocks requested per log query.
    #[arg(
        long = "sync.chunk-size",
        id = "sync_chunk_size",
        default_value_t = DEFAULT_SYNC_CHUNK_SIZE,
    )]
    pub chunk_size: u64,
    /// The interval at which the L1 head is polled once synced, in milliseconds.
    #[arg(
        long = "sync.interval",
        id = "sync_interval_ms",
        default_value_t = DEFAULT_SYNC_INTERVAL.as_millis() as u64,
    )]
    pub interval_ms: u64,
}

/// The arguments describing the state of the contract at the genesis block.
#[derive(Debug, Clone, clap::Args)]
pub struct GenesisArgs {
    /// The L1 block at which the contract was initialized.
    #[arg(long = "genesis.block", id = "genesis_block")]
    pub block: u64,
    /// The state root of batch 0.
    #[arg(long = "genesis.state-root", id = "genesis_state_root")]
    pub state_root: B256,
    /// The trusted sequencer at initialization.
    #[arg(long = "genesis.trusted-sequencer", id = "genesis_trusted_sequencer")]
    pub trusted_sequencer: Address,
    /// The trusted aggregator at initialization.
    #[arg(long = "genesis.trusted-aggregator", id = "genesis_trusted_aggregator")]
    pub trusted_aggregator: Address,
    /// The admin at initialization.
    #[arg(long = "genesis.admin", id = "genesis_admin", default_value_t = Address::ZERO)]
    pub admin: Address,
    /// The pending state timeout in seconds.
    #[arg(
        long = "genesis.pending-state-timeout",
        id = "genesis_pending_state_timeout",
        default_value_t = 0,
    )]
    pub pending_state_timeout: u64,
    /// The trusted aggregator timeout in seconds.
    #[arg(
        long = "genesis.trusted-aggregator-timeout",
        id = "genesis_trusted_aggregator_timeout",
        default_value_t = 0,
    )]
    pub trusted_aggregator_timeout: u64,
    /// The fork id at initialization.
    #[arg(long = "genesis.fork-id", id = "genesis_fork_id", default_value_t = 0)]
    pub fork_id: u64,
}

impl GenesisArgs {
    /// Returns the rollup parameters at the genesis block.
    pub fn parameters(&self) -> RollupParameters {
        RollupParameters {
            trusted_sequencer: self.trusted_sequencer,
            trusted_aggregator: self.trusted_aggregator,
            admin: self.admin,
            pending_state_timeout: self.pending_state_timeout,
            trusted_aggregator_timeout: self.trusted_aggregator_timeout,
            fork_id: self.fork_id,
            ..Default::default()
        }
    }
}

impl WatcherArgs {
    /// Returns the interval at which the L1 head is polled once synced.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const REQUIRED: &[&str] = &[
        "rollup-sync",
        "--l1.url",
        "http://localhost:8545",
        "--contract.address",
        "0x5132A183E9F3CB7C848b0AAC5Ae0c4f0491B7aB2",
        "--genesis.block",
        "16896718",
        "--genesis.state-root",
        "0x3f86b09b43e3e49a41fc20a07579b79eba044253367817d5c241d23c0e2bc5c9",
        "--genesis.trusted-sequencer",
        "0x148Ee7dAF16574cD020aFa34CC658f8F3fbd2800",
        "--genesis.trusted-aggregator",
        "0x20A53dCb196cD2bd8Ea3A8c5Ea1D68dCd7dE7bF0",
    ];

    #[test]
    fn test_parse_defaults() {
        let args = RollupSyncArgs::try_parse_from(REQUIRED).unwrap();

        assert_eq!(args.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(args.max_reorg_depth, DEFAULT_MAX_REORG_DEPTH);
        assert_eq!(args.watcher_args.chunk_size, DEFAULT_SYNC_CHUNK_SIZE);
        assert_eq!(args.watcher_args.interval(), DEFAULT_SYNC_INTERVAL);
        assert_eq!(args.l1_provider_args.max_retries, PROVIDER_MAX_RETRIES);

        let parameters = args.genesis_args.parameters();
        assert_eq!(args.genesis_args.block, 16_896_718);
        assert_eq!(parameters.pending_state_timeout, 0);
        assert!(parameters.is_forced_batch_disallowed);
    }

    #[test]
    fn test_parse_overrides() {
        let mut argv = REQUIRED.to_vec();
        argv.extend([
            "--sync.interval",
            "250",
            "--reorg.max-depth",
            "12",
            "--genesis.pending-state-timeout",
            "1800",
        ]);

        let args = RollupSyncArgs::try_parse_from(argv).unwrap();

        assert_eq!(args.watcher_args.interval(), Duration::from_millis(250));
        assert_eq!(args.max_reorg_depth, 12);
        assert_eq!(args.genesis_args.parameters().pending_state_timeout, 1_800);
    }

    #[test]
    fn test_missing_genesis_is_rejected() {
        let position = REQUIRED.iter().position(|arg| *arg == "--genesis.block").unwrap();
        let mut argv = REQUIRED.to_vec();
        argv.drain(position..position + 2);
        assert!(RollupSyncArgs::try_parse_from(argv).is_err());
    }
}
