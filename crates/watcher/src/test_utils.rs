use crate::{CanonicalChain, EventSource};

use alloy_primitives::{keccak256, B256};
use parking_lot::Mutex;
use rollup_sync_primitives::{BlockInfo, L1BlockEvents, L1BlockHeader, L1EventLog, RollupEvent};
use std::{collections::BTreeMap, convert::Infallible, sync::Arc};

/// The seconds between two mock L1 blocks.
pub const BLOCK_TIME: u64 = 12;

/// An in-memory L1 chain which can be extended and reorged. It acts as the [`CanonicalChain`]
/// and hands out [`MockEventSource`]s reading from it.
#[derive(Debug, Clone)]
pub struct MockL1 {
    inner: Arc<Mutex<MockL1Inner>>,
}

#[derive(Debug)]
struct MockL1Inner {
    blocks: BTreeMap<u64, L1BlockEvents>,
    fork: u64,
}

impl MockL1 {
    /// Returns a new chain containing only the genesis block.
    pub fn new(genesis: L1BlockHeader) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(genesis.number, L1BlockEvents::empty(genesis));
        Self { inner: Arc::new(Mutex::new(MockL1Inner { blocks, fork: 0 })) }
    }

    /// Returns the genesis header used by the tests, at block 100.
    pub fn genesis_header() -> L1BlockHeader {
        L1BlockHeader {
            number: 100,
            hash: keccak256(b"genesis"),
            parent_hash: B256::ZERO,
            timestamp: 1_700_000_000,
        }
    }

    /// Appends a block containing the events on top of the chain and returns it.
    pub fn push(&self, events: Vec<RollupEvent>) -> L1BlockEvents {
        self.push_after(events, BLOCK_TIME)
    }

    /// Appends a block containing the events, `delay` seconds after the tip.
    pub fn push_after(&self, events: Vec<RollupEvent>, delay: u64) -> L1BlockEvents {
        let mut inner = self.inner.lock();
        let tip = inner.blocks.values().next_back().expect("mock chain contains genesis").header;

        let number = tip.number + 1;
        let hash = keccak256([number.to_be_bytes(), inner.fork.to_be_bytes()].concat());
        let header =
            L1BlockHeader { number, hash, parent_hash: tip.hash, timestamp: tip.timestamp + delay };
        let events = events
            .into_iter()
            .enumerate()
            .map(|(index, event)| L1EventLog {
                log_index: index as u64,
                transaction_hash: keccak256([hash.as_slice(), &index.to_be_bytes()[..]].concat()),
                event,
            })
            .collect();

        let block = L1BlockEvents { header, events };
        inner.blocks.insert(number, block.clone());
        block
    }

    /// Drops all the blocks after `ancestor`. Blocks pushed afterwards get new hashes.
    pub fn reorg(&self, ancestor: u64) {
        let mut inner = self.inner.lock();
        inner.blocks.retain(|number, _| *number <= ancestor);
        inner.fork += 1;
    }

    /// Returns the block at the provided number.
    pub fn block(&self, number: u64) -> Option<L1BlockEvents> {
        self.inner.lock().blocks.get(&number).cloned()
    }

    /// Returns the tip of the chain.
    pub fn tip(&self) -> BlockInfo {
        self.inner
            .lock()
            .blocks
            .values()
            .next_back()
            .map(L1BlockEvents::block_info)
            .unwrap_or_default()
    }

    /// Returns a source delivering the blocks of this chain, starting at `next_block`.
    pub fn source(&self, next_block: u64) -> MockEventSource {
        MockEventSource { chain: self.clone(), next_block }
    }
}

#[async_trait::async_trait]
impl CanonicalChain for MockL1 {
    type Error = Infallible;

    async fn canonical_hash(&self, number: u64) -> Result<Option<B256>, Self::Error> {
        Ok(self.inner.lock().blocks.get(&number).map(|block| block.header.hash))
    }
}

/// An [`EventSource`] reading from a [`MockL1`]. The source is exhausted once it reaches the tip
/// of the chain.
#[derive(Debug, Clone)]
pub struct MockEventSource {
    chain: MockL1,
    next_block: u64,
}

#[async_trait::async_trait]
impl EventSource for MockEventSource {
    type Error = Infallible;

    async fn next_block(&mut self) -> Result<Option<L1BlockEvents>, Self::Error> {
        let block = self.chain.block(self.next_block);
        if block.is_some() {
            self.next_block += 1;
        }
        Ok(block)
    }

    async fn rewind(&mut self, next_block: u64) -> Result<(), Self::Error> {
        self.next_block = next_block;
        Ok(())
    }
}
