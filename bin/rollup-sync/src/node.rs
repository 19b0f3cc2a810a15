use crate::RollupSyncArgs;

use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_transport::layers::RetryBackoffLayer;
use migration::MigratorTrait;
use rollup_sync_db::{Database, DatabaseConnectionProvider};
use rollup_sync_primitives::L1BlockHeader;
use rollup_sync_reconciler::{GenesisConfig, Reconciler, ReconcilerConfig};
use rollup_sync_watcher::{L1Chain, L1Watcher, Retry, WatcherConfig};
use std::sync::Arc;

/// Opens the ledger, connects to the L1 and reconciles the ledger until the process is
/// interrupted or a fatal error occurs.
pub async fn run(args: RollupSyncArgs) -> eyre::Result<()> {
    // Instantiate the database and run the migrations
    let db = Database::new(&args.database_url).await?;
    migration::Migrator::up(db.get_connection(), None).await?;
    let database = Arc::new(db);

    // Build the L1 provider
    let l1 = &args.l1_provider_args;
    let retry_layer =
        RetryBackoffLayer::new(l1.max_retries, l1.initial_backoff, l1.compute_units_per_second);
    let client = RpcClient::builder().layer(retry_layer).http(l1.url.clone());
    let provider = ProviderBuilder::new().connect_client(client);
    let retry = Retry::new(Some(l1.max_retries as usize), l1.initial_backoff, true);

    let genesis = GenesisConfig {
        block: genesis_header(&provider, &retry, args.genesis_args.block).await?,
        state_root: args.genesis_args.state_root,
        parameters: args.genesis_args.parameters(),
    };
    tracing::info!(
        target: "sync::node",
        genesis = %genesis.block.block_info(),
        "starting rollup synchronizer"
    );

    let config = ReconcilerConfig::new(genesis).with_max_reorg_depth(args.max_reorg_depth);
    let mut reconciler =
        Reconciler::new(database, config, L1Chain::new(provider.clone(), retry));
    let watermark = reconciler.initialize().await?;

    let watcher_config = WatcherConfig {
        contract_address: args.watcher_args.contract_address,
        sync_chunk_size: args.watcher_args.chunk_size,
        sync_interval: args.watcher_args.interval(),
        retry,
    };
    let watcher = L1Watcher::new(provider, watcher_config, watermark.last_block.number + 1);

    tokio::select! {
        result = reconciler.run(watcher) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "sync::node", "received shutdown signal");
        }
    }

    Ok(())
}

/// Fetches the header of the genesis block.
async fn genesis_header<P: Provider>(
    provider: &P,
    retry: &Retry,
    number: u64,
) -> eyre::Result<L1BlockHeader> {
    let block = retry
        .retry("get_block_by_number", || async {
            provider.get_block_by_number(number.into()).await
        })
        .await?
        .ok_or_else(|| eyre::eyre!("genesis block {number} not found on the L1"))?;

    Ok(L1BlockHeader {
        number: block.header.number,
        hash: block.header.hash,
        parent_hash: block.header.parent_hash,
        timestamp: block.header.timestamp,
    })
}
