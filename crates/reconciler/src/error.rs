use alloy_primitives::B256;
use rollup_sync_db::DatabaseError;
use rollup_sync_primitives::BlockInfo;

/// A boxed error returned by an external collaborator of the reconciler.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A fatal error of the reconciler. The ledger no longer tracks L1 and the reconciliation must
/// stop.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// An error occurred while interacting with the database.
    #[error("reconciliation failed due to database error: {0}")]
    Database(#[from] DatabaseError),
    /// A sequencing event is inconsistent with the batch ledger.
    #[error(transparent)]
    Sequencing(#[from] SequencingError),
    /// A pending state event is inconsistent with the pending state ledger.
    #[error(transparent)]
    PendingState(#[from] PendingStateError),
    /// A verification event is inconsistent with the ledger.
    #[error(transparent)]
    Verification(#[from] VerificationError),
    /// The ledger has not been initialized with its genesis.
    #[error("ledger not initialized")]
    NotInitialized,
    /// The ledger was initialized at a different genesis block than configured.
    #[error("ledger initialized at genesis block {stored}, configured {configured}")]
    GenesisMismatch {
        /// The stored genesis block number.
        stored: u64,
        /// The configured genesis block number.
        configured: u64,
    },
    /// The stored genesis block has a different hash than configured.
    #[error("genesis block {number} stored with hash {stored}, configured {configured}")]
    GenesisHashMismatch {
        /// The genesis block number.
        number: u64,
        /// The stored genesis block hash.
        stored: B256,
        /// The configured genesis block hash.
        configured: B256,
    },
    /// A block was delivered past the next expected block.
    #[error("block gap: expected block {expected}, got {got}")]
    BlockGap {
        /// The next block number expected.
        expected: u64,
        /// The block number delivered.
        got: u64,
    },
    /// No common ancestor was found within the configured reorg depth.
    #[error("no common ancestor found for block {block} searching down to block {searched_to}")]
    ReorgTooDeep {
        /// The block that triggered the reorg.
        block: BlockInfo,
        /// The lowest block number compared.
        searched_to: u64,
    },
    /// An applied L1 block is missing from the database.
    #[error("applied L1 block {0} missing from database")]
    MissingL1Block(u64),
    /// The canonical chain could not be queried.
    #[error("canonical chain error: {0}")]
    CanonicalChain(BoxedError),
    /// The event source failed.
    #[error("event source error: {0}")]
    EventSource(BoxedError),
}

/// An error in the sequencing of batches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencingError {
    /// A sequence contained no batches.
    #[error("sequence contains no batches")]
    ZeroBatches,
    /// A sequence contained more batches than allowed.
    #[error("sequence of {count} batches exceeds the maximum of {max}")]
    ExceedMaxBatches {
        /// The number of batches.
        count: u64,
        /// The maximum allowed.
        max: u64,
    },
    /// The emitted last batch number does not match the ledger.
    #[error("sequence ends at batch {emitted}, expected {expected}")]
    BatchNumberMismatch {
        /// The last batch number computed from the ledger.
        expected: u64,
        /// The last batch number emitted.
        emitted: u64,
    },
    /// The transactions of a batch exceed the maximum length.
    #[error("transactions of batch {batch_number} are {length} bytes long, above {max}")]
    TransactionsLengthAboveMax {
        /// The batch number.
        batch_number: u64,
        /// The transactions length.
        length: u64,
        /// The maximum length.
        max: u64,
    },
    /// A batch timestamp is below the last timestamp or above the L1 block timestamp.
    #[error("batch {batch_number} timestamp {timestamp} outside [{last_timestamp}, {now}]")]
    TimestampInvalid {
        /// The batch number.
        batch_number: u64,
        /// The batch timestamp.
        timestamp: u64,
        /// The timestamp of the previous batch.
        last_timestamp: u64,
        /// The L1 block timestamp.
        now: u64,
    },
    /// A forced batch was sequenced with a timestamp below its forced timestamp.
    #[error(
        "batch {batch_number} timestamp {timestamp} below forced timestamp {min_forced_timestamp}"
    )]
    TimestampBelowForcedTimestamp {
        /// The batch number.
        batch_number: u64,
        /// The batch timestamp.
        timestamp: u64,
        /// The minimum forced timestamp.
        min_forced_timestamp: u64,
    },
    /// A forced batch is missing from the ledger.
    #[error("forced batch {0} not found")]
    ForcedBatchNotFound(u64),
    /// A forced batch was already consumed by a batch.
    #[error("forced batch {force_batch_number} already consumed by batch {batch_number}")]
    ForcedBatchAlreadyConsumed {
        /// The forced batch number.
        force_batch_number: u64,
        /// The consuming batch.
        batch_number: u64,
    },
    /// The sequenced data does not match the forced batch commitment.
    #[error("sequenced data does not match forced batch {0}")]
    ForcedDataDoesNotMatch(u64),
    /// More forced batches were sequenced than were forced.
    #[error("sequencing forced batch {requested} past the last forced batch {last_forced}")]
    ForceBatchesOverflow {
        /// The highest forced batch number requested.
        requested: u64,
        /// The last forced batch number.
        last_forced: u64,
    },
    /// Forced batches were sequenced before the force batch timeout.
    #[error("force batch timeout of forced batch {0} not expired")]
    ForceBatchTimeoutNotExpired(u64),
    /// Forced batches are not allowed yet.
    #[error("forced batches are not allowed")]
    ForceBatchNotAllowed,
    /// The forced transactions exceed the maximum length.
    #[error("forced transactions are {length} bytes long, above {max}")]
    ForceBatchTooLarge {
        /// The transactions length.
        length: u64,
        /// The maximum length.
        max: u64,
    },
    /// The emitted forced batch number does not match the ledger.
    #[error("forced batch number {emitted}, expected {expected}")]
    ForceBatchNumberMismatch {
        /// The forced batch number computed from the ledger.
        expected: u64,
        /// The forced batch number emitted.
        emitted: u64,
    },
    /// A batch is missing from the ledger.
    #[error("batch {0} not found")]
    BatchNotFound(u64),
    /// A stored accumulated input hash does not match its recomputation.
    #[error(
        "accumulated input hash mismatch at batch {batch_number}: \
         stored {stored}, computed {computed}"
    )]
    AccInputHashMismatch {
        /// The batch number.
        batch_number: u64,
        /// The stored hash.
        stored: B256,
        /// The recomputed hash.
        computed: B256,
    },
}

/// An error in the pending state ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PendingStateError {
    /// The pending state does not exist.
    #[error("pending state {0} not found")]
    NotFound(u64),
    /// The emitted batch number does not match the pending state.
    #[error("pending state {pending_state_number} verified batch {stored}, event names {emitted}")]
    BatchMismatch {
        /// The pending state number.
        pending_state_number: u64,
        /// The stored last verified batch.
        stored: u64,
        /// The emitted batch number.
        emitted: u64,
    },
    /// The emitted state root does not match the pending state.
    #[error("pending state {pending_state_number} root {stored}, event names {emitted}")]
    StateRootMismatch {
        /// The pending state number.
        pending_state_number: u64,
        /// The stored state root.
        stored: B256,
        /// The emitted state root.
        emitted: B256,
    },
}

/// An error in the verification of batches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// The initial pending state does not exist.
    #[error("pending state {0} does not exist")]
    PendingStateDoesNotExist(u64),
    /// The initial batch does not match the initial pending state.
    #[error("init batch {init_batch} does not match pending state batch {pending_batch}")]
    InitBatchDoesNotMatchPendingState {
        /// The initial batch of the proof.
        init_batch: u64,
        /// The last verified batch of the pending state.
        pending_batch: u64,
    },
    /// The initial batch has no confirmed state root.
    #[error("old state root of batch {0} does not exist")]
    OldStateRootDoesNotExist(u64),
    /// The initial batch is above the last verified batch.
    #[error("init batch {init_batch} above last verified batch {last_verified}")]
    InitBatchAboveLastVerified {
        /// The initial batch of the proof.
        init_batch: u64,
        /// The last verified batch.
        last_verified: u64,
    },
    /// The final batch is not above the last verified batch.
    #[error("final batch {final_batch} not above last verified batch {last_verified}")]
    FinalBatchBelowLastVerified {
        /// The final batch of the proof.
        final_batch: u64,
        /// The last verified batch.
        last_verified: u64,
    },
    /// The final batch has not been sequenced.
    #[error("final batch {final_batch} not sequenced, last sequenced {last_sequenced}")]
    FinalBatchNotSequenced {
        /// The final batch of the proof.
        final_batch: u64,
        /// The last sequenced batch.
        last_sequenced: u64,
    },
    /// The proof spans more batches than allowed.
    #[error("verification of {count} batches exceeds the maximum of {max}")]
    ExceedMaxVerifyBatches {
        /// The number of batches.
        count: u64,
        /// The maximum allowed.
        max: u64,
    },
    /// The final batch is still reserved for the trusted aggregator.
    #[error("trusted aggregator timeout of batch {0} not expired")]
    TrustedAggregatorTimeoutNotExpired(u64),
    /// The final pending state of the proof is out of range.
    #[error(
        "final pending state {final_pending_state} invalid: init {init_pending_state}, \
         last {last_pending_state}, consolidated {last_consolidated}"
    )]
    FinalPendingStateInvalid {
        /// The initial pending state of the proof.
        init_pending_state: u64,
        /// The final pending state of the proof.
        final_pending_state: u64,
        /// The last pending state.
        last_pending_state: u64,
        /// The last consolidated pending state.
        last_consolidated: u64,
    },
    /// The final batch does not match the final pending state.
    #[error("final batch {final_batch} does not match pending state batch {pending_batch}")]
    FinalBatchDoesNotMatchPendingState {
        /// The final batch of the proof.
        final_batch: u64,
        /// The last verified batch of the pending state.
        pending_batch: u64,
    },
    /// The proven root equals the stored pending state root.
    #[error("stored root of pending state {0} must differ from the proven root")]
    StoredRootMustBeDifferent(u64),
}

/// An expected rejection of an event. The event is skipped and the block still applies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The event mutates the ledger while the emergency state is active.
    #[error("{event} rejected in emergency state")]
    EmergencyState {
        /// The name of the rejected event.
        event: &'static str,
    },
    /// The pending state cannot be consolidated yet.
    #[error("pending state {pending_state_number} not consolidable before {consolidable_at}")]
    PendingStateNotConsolidable {
        /// The pending state number.
        pending_state_number: u64,
        /// The timestamp from which the pending state is consolidable.
        consolidable_at: u64,
    },
}

/// An error returned by the [`crate::LedgerReader`].
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The batch number cannot be represented in the ledger.
    #[error("invalid batch number {0}")]
    InvalidBatchNumber(u64),
    /// The stored batches are inconsistent.
    #[error("ledger integrity check failed: {0}")]
    Integrity(#[from] SequencingError),
    /// An error occurred while interacting with the database.
    #[error("query failed due to database error: {0}")]
    Database(#[from] DatabaseError),
}

/// The outcome of an event handler that failed, either expectedly or fatally.
#[derive(Debug)]
pub(crate) enum EventError {
    /// The event was rejected and must be skipped.
    Rejected(Rejection),
    /// The event could not be applied, the reconciliation must stop.
    Fatal(ReconcileError),
}

impl From<Rejection> for EventError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

macro_rules! impl_fatal_from {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for EventError {
                fn from(error: $error) -> Self {
                    Self::Fatal(error.into())
                }
            }
        )*
    };
}

impl_fatal_from!(
    ReconcileError,
    DatabaseError,
    SequencingError,
    PendingStateError,
    VerificationError,
    crate::sequencing::SequencingOrDatabaseError,
);

/// A [`Result`] of an event handler.
pub(crate) type EventResult<T> = Result<T, EventError>;
