//! End to end tests of the reconciler against a mock L1.

use alloy_primitives::{keccak256, Address, Bytes, B256};
use arbitrary::{Arbitrary, Unstructured};
use rand::Rng;
use rollup_sync_db::{test_utils::setup_test_db, Database, DatabaseOperations};
use rollup_sync_primitives::{
    BatchData, ConsolidatePendingState, EmergencyState, ForceBatch, ForcedBatch, ForcedBatchData,
    L1BlockEvents, PendingState, PendingStateProof, RollupEvent, RollupParameters,
    SequenceBatches, SequenceForceBatches, SequencedBatch, VerifyBatches, HALT_AGGREGATION_TIMEOUT,
    INITIAL_BATCH_FEE, MAX_BATCH_FEE, MIN_BATCH_FEE,
};
use rollup_sync_reconciler::{
    Applied, BlockOutcome, GenesisConfig, LedgerReader, QueryError, ReconcileError, Reconciler,
    ReconcilerConfig, Rejection, SequencingError, VerificationError,
};
use rollup_sync_watcher::test_utils::MockL1;
use std::sync::Arc;

const GENESIS_ROOT: B256 = B256::repeat_byte(0x01);
const SEQUENCER: Address = Address::repeat_byte(0x5e);
const TRUSTED_AGGREGATOR: Address = Address::repeat_byte(0xa1);
const AGGREGATOR: Address = Address::repeat_byte(0xa2);

/// Generates a random value of the provided type.
macro_rules! random {
    ($typ:ty) => {{
        let mut bytes = [0u8; 1024];
        rand::rng().fill(bytes.as_mut_slice());
        let mut u = Unstructured::new(&bytes);
        <$typ>::arbitrary(&mut u).unwrap()
    }};
}

struct Harness {
    l1: MockL1,
    config: ReconcilerConfig,
    database: Arc<Database>,
    reconciler: Reconciler<MockL1>,
    reader: LedgerReader,
}

impl Harness {
    async fn new(parameters: RollupParameters) -> eyre::Result<Self> {
        Self::with_config(config(parameters)).await
    }

    async fn with_config(config: ReconcilerConfig) -> eyre::Result<Self> {
        let l1 = MockL1::new(config.genesis.block);
        let database = Arc::new(setup_test_db().await);
        let mut reconciler = Reconciler::new(database.clone(), config.clone(), l1.clone());
        reconciler.initialize().await?;
        let reader = reconciler.reader();

        Ok(Self { l1, config, database, reconciler, reader })
    }

    /// Pushes a block with the events on the mock L1 and applies it.
    async fn push(&mut self, events: Vec<RollupEvent>) -> eyre::Result<BlockOutcome> {
        let block = self.l1.push(events);
        self.apply_block(block).await
    }

    /// Pushes a block with the events `delay` seconds after the tip and applies it.
    async fn push_after(
        &mut self,
        events: Vec<RollupEvent>,
        delay: u64,
    ) -> eyre::Result<BlockOutcome> {
        let block = self.l1.push_after(events, delay);
        self.apply_block(block).await
    }

    async fn apply_block(&mut self, block: L1BlockEvents) -> eyre::Result<BlockOutcome> {
        match self.reconciler.apply(block).await? {
            Applied::Block(outcome) => Ok(outcome),
            other => eyre::bail!("expected an applied block, got {other:?}"),
        }
    }

    /// Pushes a block updating the sequencer URL before the events, which must fail. Checks that
    /// nothing of the block was kept, then drops the block from the mock L1.
    async fn push_failing(&mut self, events: Vec<RollupEvent>) -> eyre::Result<ReconcileError> {
        let snapshot = self.snapshot().await?;
        let watermark = self.database.get_sync_watermark().await?;

        let mut block_events = vec![RollupEvent::SetTrustedSequencerUrl("http://updated".into())];
        block_events.extend(events);
        let block = self.l1.push(block_events);
        let Err(error) = self.reconciler.apply(block).await else {
            eyre::bail!("expected the block to fail")
        };

        eyre::ensure!(self.snapshot().await? == snapshot, "failed block changed the ledger");
        eyre::ensure!(
            self.database.get_sync_watermark().await? == watermark,
            "failed block moved the watermark"
        );
        self.l1.reorg(self.l1.tip().number - 1);

        Ok(error)
    }

    fn now(&self) -> u64 {
        self.l1.block(self.l1.tip().number).map(|block| block.header.timestamp).unwrap_or_default()
    }

    async fn snapshot(&self) -> eyre::Result<Snapshot> {
        Snapshot::load(&self.database).await
    }
}

/// The content of the ledger, without the L1 block hashes.
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    batches: Vec<SequencedBatch>,
    forced_batches: Vec<ForcedBatch>,
    pending_states: Vec<PendingState>,
    parameters: Option<RollupParameters>,
    emergency: EmergencyState,
}

impl Snapshot {
    async fn load(database: &Database) -> eyre::Result<Self> {
        let last_batch = database.get_last_batch().await?.map(|b| b.batch_number).unwrap_or(0);
        let mut batches = vec![];
        for batch_number in 0..=last_batch {
            batches.extend(database.get_batch(batch_number).await?);
        }
        let mut forced_batches = vec![];
        for number in 1..=database.get_last_forced_batch_number().await? {
            forced_batches.extend(database.get_forced_batch(number).await?);
        }

        Ok(Self {
            batches,
            forced_batches,
            pending_states: database.get_active_pending_states(0).await?,
            parameters: database.get_rollup_parameters().await?,
            emergency: database.get_emergency_state().await?,
        })
    }
}

fn config(parameters: RollupParameters) -> ReconcilerConfig {
    ReconcilerConfig::new(GenesisConfig {
        block: MockL1::genesis_header(),
        state_root: GENESIS_ROOT,
        parameters,
    })
}

fn parameters() -> RollupParameters {
    RollupParameters {
        trusted_sequencer: SEQUENCER,
        trusted_aggregator: TRUSTED_AGGREGATOR,
        ..Default::default()
    }
}

/// A `SequenceBatches` event for the batches `first..=last`, with transactions derived from
/// `seed`.
fn sequence(first: u64, last: u64, seed: u8) -> RollupEvent {
    let timestamp = MockL1::genesis_header().timestamp;
    RollupEvent::SequenceBatches(SequenceBatches {
        last_batch_number: last,
        batches: (first..=last)
            .map(|batch_number| BatchData {
                transactions_hash: keccak256([&batch_number.to_be_bytes()[..], &[seed]].concat()),
                global_exit_root: B256::repeat_byte(0xee),
                timestamp,
                min_forced_timestamp: 0,
                transactions_len: Some(1_000),
            })
            .collect(),
        l2_coinbase: SEQUENCER,
    })
}

fn verify(init_pending_state: u64, init_batch: u64, final_batch: u64, root: B256) -> RollupEvent {
    RollupEvent::VerifyBatches(VerifyBatches {
        init_pending_state_number: init_pending_state,
        init_batch_number: init_batch,
        final_batch_number: final_batch,
        new_local_exit_root: B256::repeat_byte(0xe0),
        new_state_root: root,
        aggregator: AGGREGATOR,
    })
}

fn verify_trusted(init_batch: u64, final_batch: u64, root: B256) -> RollupEvent {
    RollupEvent::VerifyBatchesTrustedAggregator(VerifyBatches {
        init_pending_state_number: 0,
        init_batch_number: init_batch,
        final_batch_number: final_batch,
        new_local_exit_root: B256::repeat_byte(0xe0),
        new_state_root: root,
        aggregator: TRUSTED_AGGREGATOR,
    })
}

fn consolidate(pending_state: u64, batch: u64, root: B256, sender: Address) -> RollupEvent {
    RollupEvent::ConsolidatePendingState(ConsolidatePendingState {
        batch_number: batch,
        state_root: root,
        pending_state_number: pending_state,
        sender,
    })
}

#[tokio::test]
async fn test_sequenced_batches_are_unverified_until_verification() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;

    // When
    let outcome = harness.push(vec![sequence(1, 5, 0)]).await?;

    // Then
    assert_eq!(outcome.applied, 1);
    assert_eq!(harness.reader.last_verified_batch().await?, 0);
    assert_eq!(harness.reader.state_root(0).await?, Some(GENESIS_ROOT));
    assert_eq!(harness.reader.state_root(5).await?, None);
    assert_eq!(harness.reader.state_root(6).await?, None);
    harness.reader.check_hash_chain().await?;

    // When
    let root = B256::repeat_byte(0x05);
    harness.push(vec![verify_trusted(0, 5, root)]).await?;

    // Then
    assert_eq!(harness.reader.last_verified_batch().await?, 5);
    assert_eq!(harness.reader.state_root(5).await?, Some(root));

    Ok(())
}

#[tokio::test]
async fn test_pending_state_consolidation_after_timeout() -> eyre::Result<()> {
    // Given
    let mut harness =
        Harness::new(RollupParameters { pending_state_timeout: 1_000, ..parameters() }).await?;
    let root = B256::repeat_byte(0x05);
    harness.push(vec![sequence(1, 5, 0)]).await?;
    harness.push(vec![verify(0, 0, 5, root)]).await?;
    assert_eq!(harness.reader.last_verified_batch().await?, 0);
    assert_eq!(harness.reader.last_verified_batch_including_pending().await?, 5);

    // When consolidating before the timeout.
    let early = harness.push(vec![consolidate(1, 5, root, AGGREGATOR)]).await?;

    // Then
    assert_eq!(early.applied, 0);
    assert_eq!(early.rejected.len(), 1);
    assert!(matches!(
        early.rejected[0].rejection,
        Rejection::PendingStateNotConsolidable { pending_state_number: 1, .. }
    ));
    assert_eq!(harness.reader.state_root(5).await?, None);
    assert!(!harness.reader.is_consolidable(1, harness.now()).await?);
    assert!(harness.reader.is_consolidable(1, harness.now() + 1_000).await?);

    // When consolidating after the timeout.
    let late = harness.push_after(vec![consolidate(1, 5, root, AGGREGATOR)], 1_000).await?;

    // Then
    assert_eq!(late.applied, 1);
    assert_eq!(harness.reader.state_root(5).await?, Some(root));
    assert_eq!(harness.reader.last_verified_batch().await?, 5);
    assert!(!harness.reader.is_consolidable(1, harness.now()).await?);

    Ok(())
}

#[tokio::test]
async fn test_forced_batch_sequenced_after_timeout() -> eyre::Result<()> {
    // Given
    let mut harness =
        Harness::new(RollupParameters { force_batch_timeout: 100, ..parameters() }).await?;
    let transactions: Bytes = random!(Vec<u8>).into();
    let global_exit_root = B256::repeat_byte(0xee);
    let force = RollupEvent::ForceBatch(ForceBatch {
        force_batch_number: 1,
        last_global_exit_root: global_exit_root,
        sequencer: AGGREGATOR,
        transactions: transactions.clone(),
    });
    harness.push(vec![RollupEvent::ActivateForceBatches, force]).await?;
    let min_forced_timestamp = harness.now();

    // When
    let sequence = RollupEvent::SequenceForceBatches(SequenceForceBatches {
        last_batch_number: 1,
        batches: vec![ForcedBatchData {
            transactions_hash: keccak256(&transactions),
            global_exit_root,
            min_forced_timestamp,
        }],
        sequencer: AGGREGATOR,
    });
    let outcome = harness.push_after(vec![sequence], 100).await?;

    // Then
    assert_eq!(outcome.applied, 1);
    let batch = harness.database.get_batch(1).await?.expect("batch sequenced");
    assert!(batch.is_forced());
    assert!(batch.timestamp >= min_forced_timestamp);
    assert_eq!(harness.database.get_last_consumed_forced_batch_number().await?, 1);
    harness.reader.check_hash_chain().await?;

    Ok(())
}

#[tokio::test]
async fn test_override_pending_state() -> eyre::Result<()> {
    // Given three pending states verifying batches 2, 4 and 6.
    let mut harness =
        Harness::new(RollupParameters { pending_state_timeout: 1_000, ..parameters() }).await?;
    harness.push(vec![sequence(1, 6, 0)]).await?;
    harness
        .push(vec![
            verify(0, 0, 2, B256::repeat_byte(0x02)),
            verify(1, 2, 4, B256::repeat_byte(0x04)),
            verify(2, 4, 6, B256::repeat_byte(0x06)),
        ])
        .await?;
    assert_eq!(harness.reader.pending_states(0).await?.len(), 3);

    // When the trusted aggregator overrides pending state 2.
    let root = B256::repeat_byte(0x44);
    let outcome = harness
        .push(vec![RollupEvent::OverridePendingState(PendingStateProof {
            init_pending_state_number: 1,
            final_pending_state_number: 2,
            init_batch_number: 2,
            final_batch_number: 4,
            new_local_exit_root: B256::repeat_byte(0xe0),
            new_state_root: root,
            aggregator: TRUSTED_AGGREGATOR,
        })])
        .await?;

    // Then
    assert_eq!(outcome.applied, 1);
    assert!(harness.reader.pending_states(0).await?.is_empty());
    assert_eq!(harness.reader.state_root(4).await?, Some(root));
    assert_eq!(harness.reader.last_verified_batch().await?, 4);
    assert_eq!(
        harness.reader.rollup_parameters().await?.trusted_aggregator_timeout,
        HALT_AGGREGATION_TIMEOUT
    );

    // Consolidating an overridden pending state is an integrity error.
    let stale = consolidate(3, 6, B256::repeat_byte(0x06), TRUSTED_AGGREGATOR);
    let block = harness.l1.push(vec![stale]);
    assert!(matches!(
        harness.reconciler.apply(block).await,
        Err(ReconcileError::PendingState(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_override_with_same_root_fails() -> eyre::Result<()> {
    let mut harness =
        Harness::new(RollupParameters { pending_state_timeout: 1_000, ..parameters() }).await?;
    harness.push(vec![sequence(1, 2, 0)]).await?;
    harness.push(vec![verify(0, 0, 2, B256::repeat_byte(0x02))]).await?;
    let snapshot = harness.snapshot().await?;

    let block = harness.l1.push(vec![RollupEvent::ProveNonDeterministicPendingState(
        PendingStateProof {
            init_pending_state_number: 0,
            final_pending_state_number: 1,
            init_batch_number: 0,
            final_batch_number: 2,
            new_local_exit_root: B256::ZERO,
            new_state_root: B256::repeat_byte(0x02),
            aggregator: AGGREGATOR,
        },
    )]);
    assert!(matches!(
        harness.reconciler.apply(block).await,
        Err(ReconcileError::Verification(_))
    ));
    assert_eq!(harness.snapshot().await?, snapshot);

    Ok(())
}

#[tokio::test]
async fn test_reorg_rolls_back_to_common_ancestor() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    harness.push(vec![sequence(1, 2, 0)]).await?;
    let ancestor = harness.l1.tip();
    harness.push(vec![sequence(3, 4, 0)]).await?;
    harness.push(vec![verify_trusted(0, 4, B256::repeat_byte(0x04))]).await?;

    // When
    harness.l1.reorg(ancestor.number);
    let outcome = harness.push(vec![sequence(3, 3, 1)]).await?;

    // Then
    let reorg = outcome.reorg.expect("reorg handled");
    assert_eq!(reorg.common_ancestor, ancestor);
    assert_eq!(reorg.depth, 2);
    assert_eq!(harness.reader.last_verified_batch().await?, 0);
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(3));
    assert_eq!(harness.database.get_sync_watermark().await?.unwrap().last_block, outcome.block);
    harness.reader.check_hash_chain().await?;

    Ok(())
}

#[tokio::test]
async fn test_reorg_leaves_no_residue() -> eyre::Result<()> {
    let root = random!(B256);
    let common = vec![
        vec![sequence(1, 3, 0), RollupEvent::SetPendingStateTimeout(100)],
        vec![verify(0, 0, 2, root)],
    ];
    let discarded = vec![
        vec![RollupEvent::ActivateForceBatches, sequence(4, 6, 0)],
        vec![consolidate(1, 2, root, TRUSTED_AGGREGATOR), verify(1, 2, 6, random!(B256))],
        vec![RollupEvent::EmergencyStateActivated { sequenced_batch_number: None }],
        vec![RollupEvent::SetMultiplierBatchFee(1020)],
    ];
    let replacement = vec![
        vec![sequence(4, 4, 1)],
        vec![verify(1, 2, 4, random!(B256)), RollupEvent::SetTrustedAggregatorTimeout(60)],
    ];

    // Given a ledger which applied the discarded branch then reorged onto the replacement.
    let mut reorged = Harness::new(parameters()).await?;
    for events in common.iter().chain(&discarded) {
        reorged.push(events.clone()).await?;
    }
    reorged.l1.reorg(reorged.l1.tip().number - discarded.len() as u64);
    for events in &replacement {
        reorged.push(events.clone()).await?;
    }

    // And a ledger which only applied the replacement.
    let mut direct = Harness::new(parameters()).await?;
    for events in common.iter().chain(&replacement) {
        direct.push(events.clone()).await?;
    }

    // Then
    assert_eq!(reorged.snapshot().await?, direct.snapshot().await?);
    assert_eq!(
        reorged.reader.current_batch_fee().await?,
        direct.reader.current_batch_fee().await?
    );

    Ok(())
}

#[tokio::test]
async fn test_emergency_state_gates_mutations() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    harness.push(vec![sequence(1, 2, 0)]).await?;
    harness
        .push(vec![RollupEvent::EmergencyStateActivated { sequenced_batch_number: None }])
        .await?;
    assert!(harness.reader.is_emergency_state().await?);
    let snapshot = harness.snapshot().await?;
    assert_eq!(snapshot.emergency, EmergencyState::activated(2));

    // When
    let outcome = harness
        .push(vec![
            sequence(3, 3, 0),
            verify_trusted(0, 2, B256::repeat_byte(0x02)),
            RollupEvent::ActivateForceBatches,
        ])
        .await?;

    // Then only the parameter update is applied.
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.rejected.len(), 2);
    assert!(outcome
        .rejected
        .iter()
        .all(|rejected| matches!(rejected.rejection, Rejection::EmergencyState { .. })));
    let mut expected = snapshot;
    expected.parameters.as_mut().unwrap().is_forced_batch_disallowed = false;
    assert_eq!(harness.snapshot().await?, expected);

    // When
    let outcome = harness
        .push(vec![RollupEvent::EmergencyStateDeactivated, sequence(3, 3, 0)])
        .await?;

    // Then
    assert_eq!(outcome.applied, 2);
    assert!(!harness.reader.is_emergency_state().await?);
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(3));

    Ok(())
}

#[tokio::test]
async fn test_consolidation_is_idempotent() -> eyre::Result<()> {
    // Given
    let mut harness =
        Harness::new(RollupParameters { pending_state_timeout: 10, ..parameters() }).await?;
    let root = B256::repeat_byte(0x03);
    harness.push(vec![sequence(1, 3, 0)]).await?;
    harness.push(vec![verify(0, 0, 3, root)]).await?;
    harness.push(vec![consolidate(1, 3, root, AGGREGATOR)]).await?;
    let snapshot = harness.snapshot().await?;

    // When
    let outcome = harness.push(vec![consolidate(1, 3, root, AGGREGATOR)]).await?;

    // Then
    assert_eq!(outcome.applied, 1);
    assert!(outcome.rejected.is_empty());
    assert_eq!(harness.snapshot().await?, snapshot);

    Ok(())
}

#[tokio::test]
async fn test_batch_fee_stays_within_bounds() -> eyre::Result<()> {
    // Given
    let mut harness =
        Harness::new(RollupParameters { multiplier_batch_fee: 1_023, ..parameters() }).await?;

    // When batches are verified right after being sequenced.
    for batch_number in 1..=40 {
        harness
            .push(vec![
                sequence(batch_number, batch_number, 0),
                verify(0, batch_number - 1, batch_number, random!(B256)),
            ])
            .await?;

        // Then
        let fee = harness.reader.current_batch_fee().await?;
        assert!(fee >= MIN_BATCH_FEE && fee <= MAX_BATCH_FEE);
    }
    assert!(harness.reader.current_batch_fee().await? < INITIAL_BATCH_FEE);
    assert_eq!(harness.reader.last_verified_batch().await?, 40);

    // When verifications come after the time target.
    harness.push(vec![sequence(41, 50, 0)]).await?;
    let fee = harness.reader.current_batch_fee().await?;
    harness.push_after(vec![verify(0, 40, 50, random!(B256))], 3_600).await?;

    // Then
    assert!(harness.reader.current_batch_fee().await? > fee);

    Ok(())
}

#[tokio::test]
async fn test_block_delivery_rules() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    let first = harness.l1.push(vec![sequence(1, 1, 0)]);
    harness.apply_block(first.clone()).await?;

    // When a block is delivered twice.
    let applied = harness.reconciler.apply(first.clone()).await?;

    // Then
    assert_eq!(applied, Applied::AlreadyApplied(first.block_info()));
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(1));

    // When a block is skipped.
    harness.l1.push(vec![]);
    let third = harness.l1.push(vec![]);
    let result = harness.reconciler.apply(third).await;

    // Then
    assert!(matches!(result, Err(ReconcileError::BlockGap { expected: 102, got: 103 })));

    Ok(())
}

#[tokio::test]
async fn test_rewind_to_common_ancestor() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    for batch_number in 1..=5 {
        harness.push(vec![sequence(batch_number, batch_number, 0)]).await?;
    }
    let ancestor = harness.l1.block(102).unwrap().block_info();
    harness.l1.reorg(102);
    harness.l1.push(vec![sequence(3, 3, 1)]);
    let fourth = harness.l1.push(vec![sequence(4, 4, 1)]);

    // When the first delivered block of the new branch is not the child of the ancestor.
    let applied = harness.reconciler.apply(fourth.clone()).await?;

    // Then
    let Applied::Rewound(reorg) = applied else { eyre::bail!("expected rewind, got {applied:?}") };
    assert_eq!(reorg.common_ancestor, ancestor);
    assert_eq!(reorg.depth, 3);
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(2));

    // When the driver resumes from the block after the ancestor.
    harness.reconciler.run(harness.l1.source(reorg.common_ancestor.number + 1)).await?;

    // Then
    let watermark = harness.database.get_sync_watermark().await?.unwrap();
    assert_eq!(watermark.last_block, fourth.block_info());
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(4));
    harness.reader.check_hash_chain().await?;

    Ok(())
}

#[tokio::test]
async fn test_run_rewinds_source() -> eyre::Result<()> {
    // Given a ledger on a branch which the L1 abandoned.
    let mut harness = Harness::new(parameters()).await?;
    for batch_number in 1..=4 {
        harness.push(vec![sequence(batch_number, batch_number, 0)]).await?;
    }
    harness.l1.reorg(101);
    for batch_number in 2..=5 {
        harness.l1.push(vec![sequence(batch_number, batch_number, 1)]);
    }

    // When the source resumes past the ancestor.
    harness.reconciler.run(harness.l1.source(104)).await?;

    // Then
    let watermark = harness.database.get_sync_watermark().await?.unwrap();
    assert_eq!(watermark.last_block, harness.l1.tip());
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(5));
    harness.reader.check_hash_chain().await?;

    Ok(())
}

#[tokio::test]
async fn test_run_applies_source_and_resumes() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    for batch_number in 1..=3 {
        harness.l1.push(vec![sequence(batch_number, batch_number, 0)]);
    }

    // When
    harness.reconciler.run(harness.l1.source(101)).await?;

    // Then
    let watermark = harness.database.get_sync_watermark().await?.unwrap();
    assert_eq!(watermark.last_block, harness.l1.tip());

    // When restarting on the same database.
    let config = config(parameters());
    let mut restarted =
        Reconciler::new(harness.database.clone(), config.clone(), harness.l1.clone());
    let watermark = restarted.initialize().await?;

    // Then
    assert_eq!(watermark.last_block, harness.l1.tip());

    // A different genesis is refused.
    let mut other_genesis = config.genesis.clone();
    other_genesis.block.number += 1;
    let mut mismatched = Reconciler::new(
        harness.database.clone(),
        ReconcilerConfig::new(other_genesis),
        harness.l1.clone(),
    );
    assert!(matches!(
        mismatched.initialize().await,
        Err(ReconcileError::GenesisMismatch { stored: 100, configured: 101 })
    ));

    Ok(())
}

#[tokio::test]
async fn test_restart_on_other_genesis_hash_fails() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    harness.push(vec![sequence(1, 1, 0)]).await?;

    // When restarting with a genesis block of the same number on another chain.
    let mut other = harness.config.clone();
    other.genesis.block.hash = B256::repeat_byte(0x99);
    let mut restarted = Reconciler::new(harness.database.clone(), other, harness.l1.clone());
    let result = restarted.initialize().await;

    // Then
    let genesis = MockL1::genesis_header();
    assert!(matches!(
        result,
        Err(ReconcileError::GenesisHashMismatch { number: 100, stored, configured })
            if stored == genesis.hash && configured == B256::repeat_byte(0x99)
    ));
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_apply_requires_initialization() -> eyre::Result<()> {
    let l1 = MockL1::new(MockL1::genesis_header());
    let config = config(parameters());
    let mut reconciler = Reconciler::new(Arc::new(setup_test_db().await), config, l1.clone());

    assert!(matches!(
        reconciler.apply(l1.push(vec![])).await,
        Err(ReconcileError::NotInitialized)
    ));

    Ok(())
}

#[tokio::test]
async fn test_invalid_batch_number_query() -> eyre::Result<()> {
    let harness = Harness::new(parameters()).await?;

    assert!(matches!(
        harness.reader.state_root(u64::MAX).await,
        Err(rollup_sync_reconciler::QueryError::InvalidBatchNumber(u64::MAX))
    ));

    Ok(())
}

#[tokio::test]
async fn test_stale_block_off_the_canonical_chain_is_ignored() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    for batch_number in 1..=4 {
        harness.push(vec![sequence(batch_number, batch_number, 0)]).await?;
    }
    let snapshot = harness.snapshot().await?;
    let watermark = harness.database.get_sync_watermark().await?;

    // When a block of an abandoned branch forking after block 102 is delivered late.
    let mut orphan = harness.l1.block(103).unwrap();
    orphan.header.hash = B256::repeat_byte(0x03);
    let applied = harness.reconciler.apply(orphan.clone()).await?;

    // Then
    assert_eq!(applied, Applied::Orphaned(orphan.block_info()));
    assert_eq!(harness.database.get_sync_watermark().await?, watermark);
    assert_eq!(harness.snapshot().await?, snapshot);
    assert_eq!(harness.database.get_l1_block(104).await?, harness.l1.block(104).map(|b| b.header));

    Ok(())
}

#[tokio::test]
async fn test_failed_verification_discards_the_block() -> eyre::Result<()> {
    // Given batches 1 to 6 sequenced and batch 2 verified.
    let mut harness =
        Harness::with_config(ReconcilerConfig { max_verify_batches: 3, ..config(parameters()) })
            .await?;
    harness.push(vec![sequence(1, 3, 0), sequence(4, 6, 0)]).await?;
    harness.push(vec![verify_trusted(0, 2, B256::repeat_byte(0x02))]).await?;
    let root = B256::repeat_byte(0x05);

    // When verifying more batches than allowed.
    let error = harness.push_failing(vec![verify(0, 2, 6, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::ExceedMaxVerifyBatches {
            count: 4,
            max: 3
        })
    ));

    // When sequencing more batches than allowed.
    let error = harness.push_failing(vec![sequence(7, 10, 0)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ExceedMaxBatches { count: 4, max: 3 })
    ));

    // When verifying before the trusted aggregator timeout.
    let error = harness
        .push_failing(vec![RollupEvent::SetTrustedAggregatorTimeout(1_000), verify(0, 2, 4, root)])
        .await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::TrustedAggregatorTimeoutNotExpired(4))
    ));

    // When verifying from a batch that is not the one of the pending state.
    let error = harness
        .push_failing(vec![
            RollupEvent::SetPendingStateTimeout(1_000),
            verify(0, 2, 4, root),
            verify(1, 3, 5, root),
        ])
        .await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::InitBatchDoesNotMatchPendingState {
            init_batch: 3,
            pending_batch: 4
        })
    ));

    // When verifying from a pending state that does not exist.
    let error = harness.push_failing(vec![verify(7, 2, 4, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::PendingStateDoesNotExist(7))
    ));

    // When verifying up to a batch that was not sequenced.
    let error = harness.push_failing(vec![verify(0, 2, 9, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::FinalBatchNotSequenced {
            final_batch: 9,
            last_sequenced: 6
        })
    ));

    // When verifying from a batch above the last verified one.
    let error = harness.push_failing(vec![verify(0, 3, 5, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::InitBatchAboveLastVerified {
            init_batch: 3,
            last_verified: 2
        })
    ));

    // When verifying from a batch without a state root.
    let error = harness.push_failing(vec![verify(0, 1, 3, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::OldStateRootDoesNotExist(1))
    ));

    // When verifying up to a batch already verified.
    let error = harness.push_failing(vec![verify(0, 2, 2, root)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Verification(VerificationError::FinalBatchBelowLastVerified {
            final_batch: 2,
            last_verified: 2
        })
    ));

    // When a valid verification follows.
    harness.push(vec![verify(0, 2, 5, root)]).await?;

    // Then
    assert_eq!(harness.reader.last_verified_batch().await?, 5);
    assert_eq!(harness.reader.state_root(5).await?, Some(root));

    Ok(())
}

#[tokio::test]
async fn test_failed_sequencing_discards_the_block() -> eyre::Result<()> {
    // Given forced batch 1 recorded.
    let mut harness =
        Harness::new(RollupParameters { force_batch_timeout: 100, ..parameters() }).await?;
    let global_exit_root = B256::repeat_byte(0xee);
    let force = |force_batch_number: u64, transactions: Bytes| {
        RollupEvent::ForceBatch(ForceBatch {
            force_batch_number,
            last_global_exit_root: global_exit_root,
            sequencer: AGGREGATOR,
            transactions,
        })
    };
    let transactions = Bytes::from(vec![0xab; 32]);
    harness.push(vec![RollupEvent::ActivateForceBatches, force(1, transactions.clone())]).await?;
    let min_forced_timestamp = harness.now();
    let forced = SequenceForceBatches {
        last_batch_number: 1,
        batches: vec![ForcedBatchData {
            transactions_hash: keccak256(&transactions),
            global_exit_root,
            min_forced_timestamp,
        }],
        sequencer: AGGREGATOR,
    };

    // When forcing a batch out of order.
    let error = harness.push_failing(vec![force(3, transactions.clone())]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForceBatchNumberMismatch {
            expected: 2,
            emitted: 3
        })
    ));

    // When forcing a batch above the maximum length.
    let max = harness.config.max_force_batch_byte_length;
    let error = harness.push_failing(vec![force(2, vec![0u8; max as usize + 1].into())]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForceBatchTooLarge { length, max: limit })
            if length == max + 1 && limit == max
    ));

    // When sequencing the forced batch before the force batch timeout.
    let error =
        harness.push_failing(vec![RollupEvent::SequenceForceBatches(forced.clone())]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForceBatchTimeoutNotExpired(1))
    ));

    // When the forced batch is sequenced after the timeout.
    harness.push_after(vec![RollupEvent::SequenceForceBatches(forced.clone())], 100).await?;
    assert_eq!(harness.database.get_last_consumed_forced_batch_number().await?, 1);

    // And sequenced again.
    let error = harness
        .push_failing(vec![RollupEvent::SequenceForceBatches(SequenceForceBatches {
            last_batch_number: 2,
            ..forced.clone()
        })])
        .await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForceBatchesOverflow {
            requested: 2,
            last_forced: 1
        })
    ));

    // When the trusted sequencer includes the consumed forced batch again.
    let forced_data = BatchData {
        transactions_hash: keccak256(&transactions),
        global_exit_root,
        timestamp: harness.now(),
        min_forced_timestamp,
        transactions_len: None,
    };
    let resequence = |batches: Vec<BatchData>, last_batch_number: u64| {
        RollupEvent::SequenceBatches(SequenceBatches {
            last_batch_number,
            batches,
            l2_coinbase: SEQUENCER,
        })
    };
    let error = harness.push_failing(vec![resequence(vec![forced_data], 2)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForceBatchesOverflow {
            requested: 2,
            last_forced: 1
        })
    ));

    // When the next forced batch is sequenced with the data of the consumed one.
    harness.push(vec![force(2, Bytes::from(vec![0xcd; 32]))]).await?;
    let error = harness.push_failing(vec![resequence(vec![forced_data], 2)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::ForcedDataDoesNotMatch(2))
    ));

    // When a batch exceeds the maximum transactions length.
    let batch = BatchData {
        transactions_hash: B256::repeat_byte(0x0b),
        global_exit_root,
        timestamp: harness.now(),
        min_forced_timestamp: 0,
        transactions_len: Some(harness.config.max_transactions_byte_length + 1),
    };
    let error = harness.push_failing(vec![resequence(vec![batch], 2)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::TransactionsLengthAboveMax {
            batch_number: 2,
            ..
        })
    ));

    // When a batch is timestamped after the L1 block.
    let future = BatchData { timestamp: harness.now() + 1_000, transactions_len: None, ..batch };
    let error = harness.push_failing(vec![resequence(vec![future], 2)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::TimestampInvalid { batch_number: 2, .. })
    ));

    // When the emitted last batch number does not follow the ledger.
    let valid = BatchData { timestamp: harness.now(), ..future };
    let error = harness.push_failing(vec![resequence(vec![valid], 5)]).await?;
    // Then
    assert!(matches!(
        error,
        ReconcileError::Sequencing(SequencingError::BatchNumberMismatch {
            expected: 2,
            emitted: 5
        })
    ));

    // When the sequence is valid.
    harness.push(vec![resequence(vec![valid], 2)]).await?;

    // Then
    assert_eq!(harness.database.get_last_batch().await?.map(|b| b.batch_number), Some(2));
    harness.reader.check_hash_chain().await?;

    Ok(())
}

#[tokio::test]
async fn test_check_hash_chain_detects_tampering() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    harness.push(vec![sequence(1, 2, 0)]).await?;
    harness.reader.check_hash_chain().await?;

    // When a batch is stored with a wrong accumulated input hash.
    let last = harness.database.get_batch(2).await?.unwrap();
    let tampered = B256::repeat_byte(0xba);
    harness
        .database
        .insert_batch(SequencedBatch { batch_number: 3, acc_input_hash: tampered, ..last })
        .await?;

    // Then
    assert!(matches!(
        harness.reader.check_hash_chain().await,
        Err(QueryError::Integrity(SequencingError::AccInputHashMismatch {
            batch_number: 3,
            stored,
            ..
        })) if stored == tampered
    ));

    Ok(())
}

#[tokio::test]
async fn test_parameter_updates_are_rolled_back_on_reorg() -> eyre::Result<()> {
    // Given
    let mut harness = Harness::new(parameters()).await?;
    let initial = harness.reader.rollup_parameters().await?;
    let ancestor = harness.l1.tip();

    // When every parameter is updated in one block.
    let outcome = harness
        .push(vec![
            RollupEvent::SetTrustedSequencer(Address::repeat_byte(0x01)),
            RollupEvent::SetTrustedSequencerUrl("http://sequencer".into()),
            RollupEvent::SetTrustedAggregator(Address::repeat_byte(0x02)),
            RollupEvent::SetTrustedAggregatorTimeout(600),
            RollupEvent::SetPendingStateTimeout(300),
            RollupEvent::SetMultiplierBatchFee(1_010),
            RollupEvent::SetVerifyBatchTimeTarget(120),
            RollupEvent::SetForceBatchTimeout(900),
            RollupEvent::ActivateForceBatches,
            RollupEvent::TransferAdminRole(Address::repeat_byte(0x03)),
            RollupEvent::AcceptAdminRole(Address::repeat_byte(0x04)),
            RollupEvent::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: Address::repeat_byte(0x05),
            },
            RollupEvent::UpdateVersion { batch_number: 0, fork_id: 5, version: "v2.0.0".into() },
            RollupEvent::Initialized(2),
        ])
        .await?;

    // Then
    assert_eq!(outcome.applied, 14);
    let expected = RollupParameters {
        trusted_sequencer: Address::repeat_byte(0x01),
        trusted_sequencer_url: "http://sequencer".into(),
        trusted_aggregator: Address::repeat_byte(0x02),
        trusted_aggregator_timeout: 600,
        pending_state_timeout: 300,
        multiplier_batch_fee: 1_010,
        verify_batch_time_target: 120,
        force_batch_timeout: 900,
        is_forced_batch_disallowed: false,
        pending_admin: Address::repeat_byte(0x03),
        admin: Address::repeat_byte(0x04),
        owner: Address::repeat_byte(0x05),
        fork_id: 5,
        version: "v2.0.0".into(),
        ..initial.clone()
    };
    assert_eq!(harness.reader.rollup_parameters().await?, expected);

    // When the block is reorged out.
    harness.l1.reorg(ancestor.number);
    let outcome = harness.push(vec![]).await?;

    // Then
    assert_eq!(outcome.reorg.map(|reorg| reorg.common_ancestor), Some(ancestor));
    assert_eq!(harness.reader.rollup_parameters().await?, initial);

    Ok(())
}
