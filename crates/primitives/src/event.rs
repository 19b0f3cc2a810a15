use crate::{BatchData, ForcedBatchData};

use alloy_primitives::{Address, Bytes, B256};

/// A rollup contract event together with its position in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct L1EventLog {
    /// The index of the log in the block.
    pub log_index: u64,
    /// The hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// The decoded event.
    pub event: RollupEvent,
}

/// The events emitted by the rollup contract, with the fields required to mirror its state.
///
/// Fields that are not part of the log itself (e.g. the batches of a `SequenceBatches` event) are
/// recovered from the calldata of the emitting transaction by the event source.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum RollupEvent {
    /// Batches were sequenced by the trusted sequencer.
    SequenceBatches(SequenceBatches),
    /// Forced batches were sequenced.
    SequenceForceBatches(SequenceForceBatches),
    /// A batch was forced.
    ForceBatch(ForceBatch),
    /// Batches were verified by a permissionless aggregator.
    VerifyBatches(VerifyBatches),
    /// Batches were verified by the trusted aggregator.
    VerifyBatchesTrustedAggregator(VerifyBatches),
    /// A pending state was consolidated.
    ConsolidatePendingState(ConsolidatePendingState),
    /// A pending state was overridden by the trusted aggregator.
    OverridePendingState(PendingStateProof),
    /// A pending state was proven to be non-deterministic.
    ProveNonDeterministicPendingState(PendingStateProof),
    /// The emergency state was activated.
    EmergencyStateActivated {
        /// The sequenced batch whose verification timed out, when the activation named one.
        sequenced_batch_number: Option<u64>,
    },
    /// The emergency state was deactivated.
    EmergencyStateDeactivated,
    /// The trusted sequencer was updated.
    SetTrustedSequencer(Address),
    /// The trusted sequencer URL was updated.
    SetTrustedSequencerUrl(String),
    /// The trusted aggregator was updated.
    SetTrustedAggregator(Address),
    /// The trusted aggregator timeout was updated.
    SetTrustedAggregatorTimeout(u64),
    /// The pending state timeout was updated.
    SetPendingStateTimeout(u64),
    /// The batch fee multiplier was updated.
    SetMultiplierBatchFee(u16),
    /// The verify batch time target was updated.
    SetVerifyBatchTimeTarget(u64),
    /// The force batch timeout was updated.
    SetForceBatchTimeout(u64),
    /// Forced batches were allowed.
    ActivateForceBatches,
    /// A new admin was proposed.
    TransferAdminRole(Address),
    /// The pending admin accepted the role.
    AcceptAdminRole(Address),
    /// The contract ownership was transferred.
    OwnershipTransferred {
        /// The previous owner.
        previous_owner: Address,
        /// The new owner.
        new_owner: Address,
    },
    /// The rollup fork was upgraded.
    UpdateVersion {
        /// The last sequenced batch at the time of the upgrade.
        batch_number: u64,
        /// The new fork id.
        fork_id: u64,
        /// The new version string.
        version: String,
    },
    /// The contract was initialized.
    Initialized(u8),
}

impl RollupEvent {
    /// Returns the name of the event.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Returns true if the event mutates the batch or pending state ledgers. Those events are
    /// rejected while the emergency state is active.
    pub const fn is_gated_by_emergency(&self) -> bool {
        matches!(
            self,
            Self::SequenceBatches(_) |
                Self::SequenceForceBatches(_) |
                Self::ForceBatch(_) |
                Self::VerifyBatches(_) |
                Self::VerifyBatchesTrustedAggregator(_) |
                Self::ConsolidatePendingState(_) |
                Self::OverridePendingState(_) |
                Self::ProveNonDeterministicPendingState(_)
        )
    }
}

/// The `SequenceBatches` event with the batches from the calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SequenceBatches {
    /// The last batch number of the sequence, as emitted.
    pub last_batch_number: u64,
    /// The sequenced batches.
    pub batches: Vec<BatchData>,
    /// The coinbase of the sequence.
    pub l2_coinbase: Address,
}

/// The `SequenceForceBatches` event with the batches from the calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SequenceForceBatches {
    /// The last batch number of the sequence, as emitted.
    pub last_batch_number: u64,
    /// The sequenced forced batches.
    pub batches: Vec<ForcedBatchData>,
    /// The sender of the transaction.
    pub sequencer: Address,
}

/// The `ForceBatch` event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ForceBatch {
    /// The forced batch number.
    pub force_batch_number: u64,
    /// The global exit root at the time the batch was forced.
    pub last_global_exit_root: B256,
    /// The address that forced the batch.
    pub sequencer: Address,
    /// The forced transactions.
    pub transactions: Bytes,
}

/// The `VerifyBatches` and `VerifyBatchesTrustedAggregator` events with the proof inputs from the
/// calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct VerifyBatches {
    /// The pending state the verification starts from, zero for the consolidated state.
    pub init_pending_state_number: u64,
    /// The batch the verification starts from.
    pub init_batch_number: u64,
    /// The last verified batch.
    pub final_batch_number: u64,
    /// The new local exit root.
    pub new_local_exit_root: B256,
    /// The new state root.
    pub new_state_root: B256,
    /// The aggregator that submitted the proof.
    pub aggregator: Address,
}

/// The `ConsolidatePendingState` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ConsolidatePendingState {
    /// The last verified batch of the consolidated pending state.
    pub batch_number: u64,
    /// The state root of the consolidated pending state.
    pub state_root: B256,
    /// The consolidated pending state number.
    pub pending_state_number: u64,
    /// The sender of the transaction.
    pub sender: Address,
}

/// The `OverridePendingState` and `ProveNonDeterministicPendingState` events with the proof
/// inputs from the calldata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PendingStateProof {
    /// The pending state the proof starts from, zero for the consolidated state.
    pub init_pending_state_number: u64,
    /// The pending state the proof contradicts.
    pub final_pending_state_number: u64,
    /// The batch the proof starts from.
    pub init_batch_number: u64,
    /// The last batch of the proof.
    pub final_batch_number: u64,
    /// The new local exit root.
    pub new_local_exit_root: B256,
    /// The proven state root.
    pub new_state_root: B256,
    /// The sender of the transaction.
    pub aggregator: Address,
}
