//! L1 watcher for the rollup synchronizer.
//!
//! The watcher turns the logs of the rollup contract into a stream of [`L1BlockEvents`], one per
//! L1 block and in block order, blocks without rollup events included.

pub use error::{EthRequestError, FilterLogError, L1WatcherError};
use error::L1WatcherResult;
mod error;

pub use metrics::WatcherMetrics;
mod metrics;

pub use retry::Retry;
mod retry;

/// Test utils.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use alloy_consensus::Transaction as _;
use alloy_eips::BlockNumberOrTag;
use alloy_network::{Ethereum, Network, TransactionResponse};
use alloy_primitives::{Address, B256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log};
use rollup_sync_l1::{L1Transaction, RollupLog};
use rollup_sync_primitives::{L1BlockEvents, L1BlockHeader, L1EventLog};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    time::{Duration, Instant},
};

/// The default number of blocks requested per log query.
pub const DEFAULT_SYNC_CHUNK_SIZE: u64 = 100;

/// The default interval at which the head of the L1 is polled once synced.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// The block type of the L1 provider.
pub type Block = <Ethereum as Network>::BlockResponse;

/// A source of L1 blocks and their rollup events.
#[async_trait::async_trait]
pub trait EventSource: Send {
    /// The error returned by the source.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the next L1 block. Blocks are delivered in increasing number order without gaps
    /// until the source is rewound. Returns `None` if the source is exhausted.
    async fn next_block(&mut self) -> Result<Option<L1BlockEvents>, Self::Error>;

    /// Rewinds the source so that the next delivered block is `next_block`.
    async fn rewind(&mut self, next_block: u64) -> Result<(), Self::Error>;
}

/// A view of the canonical L1 chain, used to locate the common ancestor on a reorg.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait CanonicalChain: Send + Sync {
    /// The error returned by the chain.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the hash of the canonical block at the provided number, if any.
    async fn canonical_hash(&self, number: u64) -> Result<Option<B256>, Self::Error>;
}

/// The configuration of the [`L1Watcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    /// The address of the rollup contract.
    pub contract_address: Address,
    /// The number of blocks requested per log query.
    pub sync_chunk_size: u64,
    /// The interval at which the head of the L1 is polled once synced.
    pub sync_interval: Duration,
    /// The retry strategy for the RPC requests.
    pub retry: Retry,
}

impl WatcherConfig {
    /// Returns a new [`WatcherConfig`] for the contract, with default sync settings.
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            sync_chunk_size: DEFAULT_SYNC_CHUNK_SIZE,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            retry: Retry::default(),
        }
    }
}

/// The L1 watcher indexes the rollup contract logs over ranges of blocks and delivers them block
/// by block.
#[derive(Debug)]
pub struct L1Watcher<P> {
    /// The L1 execution provider.
    provider: P,
    /// The watcher configuration.
    config: WatcherConfig,
    /// The next block to fetch from the L1.
    next_block: u64,
    /// The fetched blocks which have not been delivered yet.
    buffered: VecDeque<L1BlockEvents>,
    /// The watcher metrics.
    metrics: WatcherMetrics,
}

impl<P: Provider> L1Watcher<P> {
    /// Returns a new [`L1Watcher`] which starts delivering blocks from `next_block`.
    pub fn new(provider: P, config: WatcherConfig, next_block: u64) -> Self {
        tracing::trace!(target: "sync::watcher", ?config, next_block, "new L1 watcher");
        Self {
            provider,
            config,
            next_block,
            buffered: VecDeque::new(),
            metrics: WatcherMetrics::default(),
        }
    }

    /// Fetches the next range of blocks into the buffer. Returns false if no block was buffered,
    /// either because the watcher reached the head of the L1 or because the chain changed while
    /// the range was being fetched.
    #[tracing::instrument(target = "sync::watcher", skip_all, fields(next_block = self.next_block))]
    async fn fetch_next_range(&mut self) -> L1WatcherResult<bool> {
        let latest = self.latest_block_number().await?;
        self.metrics.l1_head.set(latest as f64);
        if self.next_block > latest {
            tracing::trace!(target: "sync::watcher", latest, "synced to the L1 head");
            return Ok(false);
        }

        let start = Instant::now();
        let from = self.next_block;
        let to = from.saturating_add(self.config.sync_chunk_size.max(1) - 1).min(latest);

        let logs = group_logs(self.logs(from, to).await?, from, to)?;
        let mut headers = Vec::with_capacity((to - from + 1) as usize);
        for number in from..=to {
            headers.push(self.header(number).await?);
        }

        if !is_consistent(&headers, &logs) {
            tracing::debug!(
                target: "sync::watcher",
                from,
                to,
                "chain changed during fetch, refetching range"
            );
            self.metrics.refetched_ranges.increment(1);
            return Ok(false);
        }

        let mut transactions = HashMap::new();
        for header in headers {
            let mut events = Vec::new();
            for log in logs.get(&header.number).into_iter().flatten() {
                if let Some(event) = self.decode(log, &mut transactions).await? {
                    events.push(event);
                }
            }

            self.metrics.rollup_events.increment(events.len() as u64);
            if !events.is_empty() {
                tracing::trace!(
                    target: "sync::watcher",
                    number = header.number,
                    events = events.len(),
                    "rollup events"
                );
            }
            self.buffered.push_back(L1BlockEvents { header, events });
        }

        self.next_block = to + 1;
        self.metrics.range_fetch_duration.record(start.elapsed().as_secs_f64());

        Ok(true)
    }

    /// Decodes the log into an [`L1EventLog`], fetching the emitting transaction when needed.
    async fn decode(
        &self,
        log: &Log,
        transactions: &mut HashMap<B256, L1Transaction>,
    ) -> L1WatcherResult<Option<L1EventLog>> {
        let Some(rollup_log) = RollupLog::try_decode(&log.inner.data)? else {
            tracing::trace!(target: "sync::watcher", ?log, "skipping unknown log");
            return Ok(None);
        };

        let log_index = log.log_index.ok_or(FilterLogError::MissingLogIndex)?;
        let transaction_hash = log.transaction_hash.ok_or(FilterLogError::MissingTransactionHash)?;

        let transaction = if rollup_log.requires_transaction() {
            if !transactions.contains_key(&transaction_hash) {
                let tx = self.transaction(transaction_hash).await?;
                transactions.insert(transaction_hash, tx);
            }
            transactions.get(&transaction_hash)
        } else {
            None
        };

        let event = rollup_log.into_event(transaction)?;
        Ok(Some(L1EventLog { log_index, transaction_hash, event }))
    }

    /// Returns the number of the latest L1 block.
    async fn latest_block_number(&self) -> L1WatcherResult<u64> {
        Ok(self
            .config
            .retry
            .retry("get_block_number", || async { self.provider.get_block_number().await })
            .await?)
    }

    /// Returns the rollup contract logs in the range `[from, to]`.
    async fn logs(&self, from: u64, to: u64) -> L1WatcherResult<Vec<Log>> {
        let filter = Filter::new()
            .address(self.config.contract_address)
            .event_signature(RollupLog::signatures())
            .from_block(from)
            .to_block(to);
        tracing::trace!(target: "sync::watcher", ?filter, "fetching logs");

        Ok(self
            .config
            .retry
            .retry("get_logs", || async { self.provider.get_logs(&filter).await })
            .await?)
    }

    /// Returns the header of the block at the provided number.
    async fn header(&self, number: u64) -> L1WatcherResult<L1BlockHeader> {
        let block = fetch_block(&self.provider, &self.config.retry, number)
            .await?
            .ok_or(EthRequestError::MissingBlock(number))?;
        Ok(L1BlockHeader {
            number: block.header.number,
            hash: block.header.hash,
            parent_hash: block.header.parent_hash,
            timestamp: block.header.timestamp,
        })
    }

    /// Returns the sender and calldata of the transaction.
    async fn transaction(&self, hash: B256) -> L1WatcherResult<L1Transaction> {
        let tx = self
            .config
            .retry
            .retry("get_transaction_by_hash", || async {
                self.provider.get_transaction_by_hash(hash).await
            })
            .await?
            .ok_or(EthRequestError::MissingTransactionHash(hash))?;
        Ok(L1Transaction { from: TransactionResponse::from(&tx), input: tx.input().clone() })
    }
}

#[async_trait::async_trait]
impl<P: Provider> EventSource for L1Watcher<P> {
    type Error = L1WatcherError;

    async fn next_block(&mut self) -> Result<Option<L1BlockEvents>, Self::Error> {
        loop {
            if let Some(block) = self.buffered.pop_front() {
                self.metrics.blocks.increment(1);
                return Ok(Some(block));
            }

            if !self.fetch_next_range().await? {
                tokio::time::sleep(self.config.sync_interval).await;
            }
        }
    }

    async fn rewind(&mut self, next_block: u64) -> Result<(), Self::Error> {
        tracing::debug!(
            target: "sync::watcher",
            from = self.next_block,
            to = next_block,
            "rewinding watcher"
        );
        self.metrics.rewinds.increment(1);
        self.buffered.clear();
        self.next_block = next_block;
        Ok(())
    }
}

/// The canonical L1 chain as seen by the execution provider.
#[derive(Debug, Clone)]
pub struct L1Chain<P> {
    provider: P,
    retry: Retry,
}

impl<P> L1Chain<P> {
    /// Returns a new [`L1Chain`] over the provider.
    pub const fn new(provider: P, retry: Retry) -> Self {
        Self { provider, retry }
    }
}

#[async_trait::async_trait]
impl<P: Provider> CanonicalChain for L1Chain<P> {
    type Error = L1WatcherError;

    async fn canonical_hash(&self, number: u64) -> Result<Option<B256>, Self::Error> {
        Ok(fetch_block(&self.provider, &self.retry, number).await?.map(|block| block.header.hash))
    }
}

/// Fetches the block at the provided number.
async fn fetch_block<P: Provider>(
    provider: &P,
    retry: &Retry,
    number: u64,
) -> L1WatcherResult<Option<Block>> {
    Ok(retry
        .retry("get_block", || async {
            provider.get_block(BlockNumberOrTag::Number(number).into()).await
        })
        .await?)
}

/// Groups the logs by block number, ordered by log index. Removed logs are dropped.
fn group_logs(logs: Vec<Log>, from: u64, to: u64) -> L1WatcherResult<BTreeMap<u64, Vec<Log>>> {
    let mut grouped: BTreeMap<u64, Vec<Log>> = BTreeMap::new();
    for log in logs.into_iter().filter(|log| !log.removed) {
        let number = log.block_number.ok_or(FilterLogError::MissingBlockNumber)?;
        if !(from..=to).contains(&number) {
            return Err(FilterLogError::OutOfRange { number, from, to }.into());
        }
        if log.block_hash.is_none() {
            return Err(FilterLogError::MissingBlockHash.into());
        }
        grouped.entry(number).or_default().push(log);
    }

    for logs in grouped.values_mut() {
        logs.sort_by_key(|log| log.log_index);
    }

    Ok(grouped)
}

/// Returns true if the headers form a chain and every log belongs to the header fetched for its
/// block number.
fn is_consistent(headers: &[L1BlockHeader], logs: &BTreeMap<u64, Vec<Log>>) -> bool {
    let linked = headers.windows(2).all(|pair| pair[1].parent_hash == pair[0].hash);
    let hashes: HashMap<u64, B256> = headers.iter().map(|h| (h.number, h.hash)).collect();
    linked &&
        logs.iter().all(|(number, logs)| {
            let hash = hashes.get(number).copied();
            hash.is_some() && logs.iter().all(|log| log.block_hash == hash)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(number: u64, hash: B256, log_index: u64) -> Log {
        Log {
            block_number: Some(number),
            block_hash: Some(hash),
            log_index: Some(log_index),
            transaction_hash: Some(B256::repeat_byte(0xff)),
            ..Default::default()
        }
    }

    fn header(number: u64, parent_hash: B256) -> L1BlockHeader {
        L1BlockHeader {
            number,
            hash: B256::with_last_byte(number as u8),
            parent_hash,
            timestamp: number * 12,
        }
    }

    #[test]
    fn test_group_logs_orders_by_block_and_index() -> eyre::Result<()> {
        // Given
        let hash = B256::repeat_byte(1);
        let mut removed = log(11, hash, 0);
        removed.removed = true;
        let logs = vec![log(12, hash, 3), log(11, hash, 2), log(11, hash, 1), removed];

        // When
        let grouped = group_logs(logs, 10, 12)?;

        // Then
        assert_eq!(grouped.len(), 2);
        let indexes: Vec<_> = grouped[&11].iter().map(|log| log.log_index).collect();
        assert_eq!(indexes, vec![Some(1), Some(2)]);
        assert_eq!(grouped[&12].len(), 1);

        Ok(())
    }

    #[test]
    fn test_group_logs_rejects_out_of_range_log() {
        // Given
        let logs = vec![log(15, B256::ZERO, 0)];

        // When
        let result = group_logs(logs, 10, 12);

        // Then
        assert!(matches!(
            result,
            Err(L1WatcherError::Logs(FilterLogError::OutOfRange { number: 15, from: 10, to: 12 }))
        ));
    }

    #[test]
    fn test_consistency_of_fetched_range() -> eyre::Result<()> {
        // Given
        let first = header(1, B256::ZERO);
        let second = header(2, first.hash);
        let logs = group_logs(vec![log(2, second.hash, 0)], 1, 2)?;

        // Then
        assert!(is_consistent(&[first, second], &logs));

        // When the log belongs to a block which has since been reorged out
        let stale = group_logs(vec![log(2, B256::repeat_byte(9), 0)], 1, 2)?;

        // Then
        assert!(!is_consistent(&[first, second], &stale));

        // When the headers are not linked
        let unlinked = header(2, B256::repeat_byte(7));

        // Then
        assert!(!is_consistent(&[first, unlinked], &BTreeMap::new()));

        Ok(())
    }
}
