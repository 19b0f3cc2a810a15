//! The reconciliation engine of the rollup L1 synchronizer.
//!
//! The [`Reconciler`] applies the rollup contract events of each L1 block to the local ledger in
//! one storage transaction, keeping the batches, forced batches, pending states, parameters and
//! emergency state in lockstep with the contract. Reorgs are detected through the parent hash of
//! each block and rolled back block by block to the common ancestor.

pub use config::{FeeConfig, GenesisConfig, ReconcilerConfig, DEFAULT_MAX_REORG_DEPTH};
mod config;

mod emergency;

pub use error::{
    BoxedError, PendingStateError, QueryError, ReconcileError, Rejection, SequencingError,
    VerificationError,
};
mod error;

pub use fee::{adjust_batch_fee, VerificationTiming};
mod fee;

mod metrics;

mod pending;

pub use query::LedgerReader;
mod query;

mod reorg;

mod sequencing;

mod verification;

use crate::{
    emergency::HaltMonitor,
    error::{EventError, EventResult},
    metrics::MetricsHandler,
    pending::PendingStateLedger,
    sequencing::BatchLedger,
    verification::Verifier,
};

use alloy_primitives::B256;
use rollup_sync_db::{
    Database, DatabaseError, DatabaseOperations, DatabaseTransaction, SyncWatermark,
};
use rollup_sync_primitives::{
    BlockInfo, EmergencyState, L1BlockEvents, L1BlockHeader, RollupEvent, SequencedBatch,
};
use rollup_sync_watcher::{CanonicalChain, EventSource};
use std::{sync::Arc, time::Instant};

/// The outcome of [`Reconciler::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The block was applied.
    Block(BlockOutcome),
    /// The block was already applied with the same hash. Nothing changed.
    AlreadyApplied(BlockInfo),
    /// The block is not part of the canonical chain, which still contains the last applied
    /// block. Nothing changed.
    Orphaned(BlockInfo),
    /// The ledger was rolled back to the common ancestor of the block, which itself could not be
    /// applied. The source must resume from the block after the ancestor.
    Rewound(ReorgInfo),
}

/// The effects of an applied block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    /// The applied block.
    pub block: BlockInfo,
    /// The number of events applied.
    pub applied: usize,
    /// The events rejected.
    pub rejected: Vec<RejectedEvent>,
    /// The reorg handled before applying the block, if any.
    pub reorg: Option<ReorgInfo>,
}

/// An event that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEvent {
    /// The index of the log in the block.
    pub log_index: u64,
    /// The hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// The name of the event.
    pub event: &'static str,
    /// The reason of the rejection.
    pub rejection: Rejection,
}

/// A reorg of the L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorgInfo {
    /// The last block shared by the ledger and the canonical chain.
    pub common_ancestor: BlockInfo,
    /// The number of blocks rolled back.
    pub depth: u64,
}

/// The L1 block an event is applied in. Every timeout is evaluated against its timestamp.
#[derive(Debug, Clone)]
pub(crate) struct BlockContext {
    header: L1BlockHeader,
}

impl BlockContext {
    pub(crate) const fn new(header: L1BlockHeader) -> Self {
        Self { header }
    }

    /// The timestamp of the block.
    pub(crate) const fn now(&self) -> u64 {
        self.header.timestamp
    }

    /// The number of the block.
    pub(crate) const fn number(&self) -> u64 {
        self.header.number
    }
}

/// The reconciler applies L1 blocks to the ledger.
#[derive(Debug)]
pub struct Reconciler<C> {
    /// The ledger database.
    database: Arc<Database>,
    /// The reconciler configuration.
    config: ReconcilerConfig,
    /// The canonical L1 chain, queried on reorgs.
    chain: C,
    /// The reconciler metrics.
    metrics: MetricsHandler,
}

impl<C: CanonicalChain> Reconciler<C> {
    /// Returns a new [`Reconciler`]. [`Reconciler::initialize`] must be called before applying
    /// blocks.
    pub fn new(database: Arc<Database>, config: ReconcilerConfig, chain: C) -> Self {
        Self { database, config, chain, metrics: MetricsHandler::default() }
    }

    /// Returns a [`LedgerReader`] over the committed ledger.
    pub fn reader(&self) -> LedgerReader {
        LedgerReader::new(self.database.clone())
    }

    /// Initializes the ledger with its genesis, or resumes from the persisted watermark. An
    /// interrupted rollback is completed first. Returns the watermark to sync from.
    pub async fn initialize(&mut self) -> Result<SyncWatermark, ReconcileError> {
        if let Some(watermark) = self.database.get_sync_watermark().await? {
            let configured = self.config.genesis.block;
            if watermark.genesis_block_number != configured.number {
                return Err(ReconcileError::GenesisMismatch {
                    stored: watermark.genesis_block_number,
                    configured: configured.number,
                });
            }
            let stored = self
                .database
                .get_l1_block(configured.number)
                .await?
                .ok_or(ReconcileError::MissingL1Block(configured.number))?;
            if stored.hash != configured.hash {
                return Err(ReconcileError::GenesisHashMismatch {
                    number: configured.number,
                    stored: stored.hash,
                    configured: configured.hash,
                });
            }

            let watermark = self.finish_rollback(watermark).await?;
            tracing::info!(
                target: "sync::reconciler",
                last_block = %watermark.last_block,
                "resuming from watermark"
            );
            return Ok(watermark);
        }

        let genesis = &self.config.genesis;
        let number = genesis.block.number;
        let watermark = SyncWatermark {
            last_block: genesis.block.block_info(),
            genesis_block_number: number,
            rollback_target: None,
        };

        let tx = self.database.tx().await?;
        tx.insert_batch(SequencedBatch {
            batch_number: 0,
            acc_input_hash: B256::ZERO,
            transactions_hash: B256::ZERO,
            global_exit_root: B256::ZERO,
            timestamp: 0,
            sequenced_timestamp: 0,
            previous_last_batch_sequenced: 0,
            coinbase: Default::default(),
            forced_batch_number: None,
            block_number: number,
            state_root: None,
        })
        .await?;
        tx.set_batch_state_root(0, genesis.state_root, number).await?;
        tx.upsert_rollup_parameters(number, &genesis.parameters).await?;
        tx.upsert_emergency_state(number, EmergencyState::default()).await?;
        tx.insert_l1_block(genesis.block).await?;
        tx.upsert_sync_watermark(watermark).await?;
        tx.commit().await?;

        tracing::info!(
            target: "sync::reconciler",
            genesis = %watermark.last_block,
            state_root = ?genesis.state_root,
            "initialized ledger"
        );
        Ok(watermark)
    }

    /// Applies an L1 block to the ledger.
    ///
    /// Blocks must be delivered in order. A block whose parent is not the last applied block
    /// triggers a rollback to the common ancestor with the canonical chain.
    pub async fn apply(&mut self, block: L1BlockEvents) -> Result<Applied, ReconcileError> {
        let watermark =
            self.database.get_sync_watermark().await?.ok_or(ReconcileError::NotInitialized)?;
        let watermark = self.finish_rollback(watermark).await?;
        let last = watermark.last_block;
        let number = block.number();

        if number > last.number + 1 {
            return Err(ReconcileError::BlockGap { expected: last.number + 1, got: number });
        }
        let stale = number <= last.number;
        if stale {
            let stored = self.database.get_l1_block(number).await?;
            if stored.is_some_and(|header| header.hash == block.header.hash) {
                tracing::debug!(
                    target: "sync::reconciler",
                    block = %block.block_info(),
                    "block already applied"
                );
                return Ok(Applied::AlreadyApplied(block.block_info()));
            }
        } else if block.header.parent_hash == last.hash {
            return Ok(Applied::Block(self.apply_block(block, None).await?));
        }

        let common_ancestor = self.find_common_ancestor(&block, last).await?;
        if common_ancestor == last {
            tracing::debug!(
                target: "sync::reconciler",
                block = %block.block_info(),
                last_block = %last,
                "ignoring block off the canonical chain"
            );
            return Ok(Applied::Orphaned(block.block_info()));
        }

        let reorg = ReorgInfo { common_ancestor, depth: last.number - common_ancestor.number };
        tracing::info!(
            target: "sync::reconciler",
            block = %block.block_info(),
            common_ancestor = %common_ancestor,
            depth = reorg.depth,
            "L1 reorg detected"
        );
        self.rollback(watermark, common_ancestor.number).await?;
        self.metrics.record_reorg(reorg.depth);

        let extends_ancestor = common_ancestor.number + 1 == number &&
            common_ancestor.hash == block.header.parent_hash;
        let canonical =
            !stale || self.canonical_block_hash(number).await? == Some(block.header.hash);
        if extends_ancestor && canonical {
            Ok(Applied::Block(self.apply_block(block, Some(reorg)).await?))
        } else {
            Ok(Applied::Rewound(reorg))
        }
    }

    /// Drives the reconciliation from the source until it is exhausted or a fatal error occurs.
    pub async fn run<S: EventSource>(&mut self, mut source: S) -> Result<(), ReconcileError> {
        while let Some(block) =
            source.next_block().await.map_err(|err| ReconcileError::EventSource(Box::new(err)))?
        {
            match self.apply(block).await? {
                Applied::Block(outcome) => {
                    tracing::info!(
                        target: "sync::reconciler",
                        block = %outcome.block,
                        applied = outcome.applied,
                        rejected = outcome.rejected.len(),
                        "applied L1 block"
                    );
                }
                Applied::AlreadyApplied(_) | Applied::Orphaned(_) => {}
                Applied::Rewound(reorg) => {
                    source
                        .rewind(reorg.common_ancestor.number + 1)
                        .await
                        .map_err(|err| ReconcileError::EventSource(Box::new(err)))?;
                }
            }
        }

        tracing::info!(target: "sync::reconciler", "event source exhausted");
        Ok(())
    }

    /// Applies the events of the block in one transaction. Every event runs in its own savepoint
    /// so a rejected event leaves no trace. Event metrics are recorded once the block is
    /// committed.
    async fn apply_block(
        &mut self,
        mut block: L1BlockEvents,
        reorg: Option<ReorgInfo>,
    ) -> Result<BlockOutcome, ReconcileError> {
        let start = Instant::now();
        let ctx = BlockContext::new(block.header);
        let mut outcome =
            BlockOutcome { block: block.block_info(), applied: 0, rejected: vec![], reorg };
        block.events.sort_by_key(|log| log.log_index);

        let mut applied = Vec::with_capacity(block.events.len());
        let tx = self.database.tx().await?;
        for log in block.events {
            let name = log.event.name();
            let savepoint = tx.savepoint().await?;
            match self.apply_event(&savepoint, &log.event, &ctx).await {
                Ok(()) => {
                    savepoint.commit().await?;
                    applied.push(name);
                }
                Err(EventError::Rejected(rejection)) => {
                    savepoint.rollback().await?;
                    tracing::warn!(
                        target: "sync::reconciler",
                        block_number = ctx.number(),
                        log_index = log.log_index,
                        event = name,
                        %rejection,
                        "rejected event"
                    );
                    outcome.rejected.push(RejectedEvent {
                        log_index: log.log_index,
                        transaction_hash: log.transaction_hash,
                        event: name,
                        rejection,
                    });
                }
                Err(EventError::Fatal(error)) => {
                    tracing::error!(
                        target: "sync::reconciler",
                        block_number = ctx.number(),
                        log_index = log.log_index,
                        event = name,
                        %error,
                        "failed to apply event"
                    );
                    savepoint.rollback().await?;
                    tx.rollback().await?;
                    return Err(error);
                }
            }
        }

        tx.insert_l1_block(block.header).await?;
        tx.upsert_sync_watermark(SyncWatermark {
            last_block: outcome.block,
            genesis_block_number: self.config.genesis.block.number,
            rollback_target: None,
        })
        .await?;
        tx.commit().await?;

        outcome.applied = applied.len();
        for event in applied {
            self.metrics.record_applied(event);
        }
        for rejected in &outcome.rejected {
            self.metrics.record_rejected(rejected.event);
        }
        self.metrics.record_block(outcome.block.number, start.elapsed());
        Ok(outcome)
    }

    /// Applies a single event to the ledger.
    async fn apply_event(
        &self,
        tx: &DatabaseTransaction,
        event: &RollupEvent,
        ctx: &BlockContext,
    ) -> EventResult<()> {
        let halt_monitor = HaltMonitor::new(tx);
        if event.is_gated_by_emergency() && halt_monitor.is_halted().await? {
            return Err(Rejection::EmergencyState { event: event.name() }.into());
        }

        let current = tx.get_rollup_parameters().await?.ok_or(DatabaseError::ParametersNotFound)?;
        let mut parameters = current.clone();
        let batches = BatchLedger::new(tx, &self.config);
        let verifier = Verifier::new(tx, &self.config);

        tracing::debug!(
            target: "sync::reconciler",
            block_number = ctx.number(),
            event = event.name(),
            "applying event"
        );
        match event {
            RollupEvent::SequenceBatches(sequence) => {
                batches.append_sequenced(sequence, ctx, &mut parameters).await?;
            }
            RollupEvent::SequenceForceBatches(sequence) => {
                batches.append_forced(sequence, ctx, &mut parameters).await?;
            }
            RollupEvent::ForceBatch(event) => batches.record_forced(event, ctx, &parameters).await?,
            RollupEvent::VerifyBatches(event) => {
                verifier.verify_batches(event, ctx, &mut parameters).await?
            }
            RollupEvent::VerifyBatchesTrustedAggregator(event) => {
                verifier.verify_batches_trusted(event, ctx).await?
            }
            RollupEvent::ConsolidatePendingState(event) => {
                PendingStateLedger::new(tx).consolidate(event, ctx, &parameters).await?;
            }
            RollupEvent::OverridePendingState(proof) => {
                verifier.override_pending_state(proof, ctx, &mut parameters).await?
            }
            RollupEvent::ProveNonDeterministicPendingState(proof) => {
                verifier.prove_non_deterministic(proof, ctx).await?
            }
            RollupEvent::EmergencyStateActivated { sequenced_batch_number } => {
                let at_batch = match sequenced_batch_number {
                    Some(batch_number) => *batch_number,
                    None => tx.get_last_batch().await?.map(|b| b.batch_number).unwrap_or_default(),
                };
                halt_monitor.set_halted(true, at_batch, ctx).await?;
            }
            RollupEvent::EmergencyStateDeactivated => halt_monitor.set_halted(false, 0, ctx).await?,
            RollupEvent::SetTrustedSequencer(address) => parameters.trusted_sequencer = *address,
            RollupEvent::SetTrustedSequencerUrl(url) => {
                parameters.trusted_sequencer_url.clone_from(url)
            }
            RollupEvent::SetTrustedAggregator(address) => parameters.trusted_aggregator = *address,
            RollupEvent::SetTrustedAggregatorTimeout(timeout) => {
                parameters.trusted_aggregator_timeout = *timeout
            }
            RollupEvent::SetPendingStateTimeout(timeout) => {
                parameters.pending_state_timeout = *timeout
            }
            RollupEvent::SetMultiplierBatchFee(multiplier) => {
                parameters.multiplier_batch_fee = *multiplier
            }
            RollupEvent::SetVerifyBatchTimeTarget(target) => {
                parameters.verify_batch_time_target = *target
            }
            RollupEvent::SetForceBatchTimeout(timeout) => parameters.force_batch_timeout = *timeout,
            RollupEvent::ActivateForceBatches => parameters.is_forced_batch_disallowed = false,
            RollupEvent::TransferAdminRole(address) => parameters.pending_admin = *address,
            RollupEvent::AcceptAdminRole(address) => parameters.admin = *address,
            RollupEvent::OwnershipTransferred { new_owner, .. } => parameters.owner = *new_owner,
            RollupEvent::UpdateVersion { batch_number, fork_id, version } => {
                tracing::info!(
                    target: "sync::reconciler",
                    batch_number,
                    fork_id,
                    version,
                    "rollup version updated"
                );
                parameters.fork_id = *fork_id;
                parameters.version.clone_from(version);
            }
            RollupEvent::Initialized(version) => {
                tracing::info!(target: "sync::reconciler", version, "rollup contract initialized");
            }
        }

        if parameters != current {
            tx.upsert_rollup_parameters(ctx.number(), &parameters).await?;
        }
        Ok(())
    }
}
