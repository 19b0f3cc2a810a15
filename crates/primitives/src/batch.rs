use alloy_primitives::{keccak256, Address, B256};

/// A batch as submitted by the trusted sequencer in a `sequenceBatches` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct BatchData {
    /// The keccak hash of the batch transactions.
    pub transactions_hash: B256,
    /// The global exit root the batch was built against.
    pub global_exit_root: B256,
    /// The L2 timestamp of the batch.
    pub timestamp: u64,
    /// The minimum forced timestamp. A non-zero value marks the batch as forced.
    pub min_forced_timestamp: u64,
    /// The byte length of the batch transactions, if the transactions were posted on L1.
    pub transactions_len: Option<u64>,
}

impl BatchData {
    /// Returns true if the batch consumes a forced batch.
    pub const fn is_forced(&self) -> bool {
        self.min_forced_timestamp > 0
    }

    /// Returns the commitment of the batch data as stored for a forced batch.
    pub fn forced_hash(&self) -> B256 {
        forced_batch_hash(self.transactions_hash, self.global_exit_root, self.min_forced_timestamp)
    }
}

/// A forced batch as submitted in a `sequenceForceBatches` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ForcedBatchData {
    /// The keccak hash of the batch transactions.
    pub transactions_hash: B256,
    /// The global exit root recorded when the batch was forced.
    pub global_exit_root: B256,
    /// The L1 timestamp at which the batch was forced.
    pub min_forced_timestamp: u64,
}

impl ForcedBatchData {
    /// Returns the commitment of the forced batch data.
    pub fn hash(&self) -> B256 {
        forced_batch_hash(self.transactions_hash, self.global_exit_root, self.min_forced_timestamp)
    }
}

/// A batch that has been sequenced on L1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SequencedBatch {
    /// The batch number.
    pub batch_number: u64,
    /// The accumulated input hash chaining this batch to its predecessor.
    pub acc_input_hash: B256,
    /// The keccak hash of the batch transactions.
    pub transactions_hash: B256,
    /// The global exit root of the batch.
    pub global_exit_root: B256,
    /// The L2 timestamp of the batch.
    pub timestamp: u64,
    /// The L1 timestamp of the block in which the batch was sequenced.
    pub sequenced_timestamp: u64,
    /// The last batch number of the previous sequence.
    pub previous_last_batch_sequenced: u64,
    /// The coinbase that receives the L2 fees of the batch.
    pub coinbase: Address,
    /// The forced batch consumed by this batch, if any.
    pub forced_batch_number: Option<u64>,
    /// The L1 block in which the batch was sequenced.
    pub block_number: u64,
    /// The confirmed state root of the batch, once verified.
    pub state_root: Option<B256>,
}

impl SequencedBatch {
    /// Returns true if the batch consumed a forced batch.
    pub const fn is_forced(&self) -> bool {
        self.forced_batch_number.is_some()
    }
}

/// A forced batch recorded on L1, waiting to be sequenced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ForcedBatch {
    /// The forced batch number.
    pub force_batch_number: u64,
    /// The keccak hash of the forced transactions.
    pub transactions_hash: B256,
    /// The global exit root at the time the batch was forced.
    pub global_exit_root: B256,
    /// The L1 timestamp at which the batch was forced.
    pub min_forced_timestamp: u64,
    /// The address that forced the batch.
    pub sequencer: Address,
    /// The L1 block in which the batch was forced.
    pub block_number: u64,
    /// The batch that consumed the forced batch, if any.
    pub consumed_by: Option<u64>,
}

impl ForcedBatch {
    /// Returns the stored commitment of the forced batch.
    pub fn hash(&self) -> B256 {
        forced_batch_hash(self.transactions_hash, self.global_exit_root, self.min_forced_timestamp)
    }

    /// Returns true if the forced batch was sequenced.
    pub const fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }
}

/// Computes the accumulated input hash of a batch.
///
/// `keccak256(prev_acc ‖ transactions_hash ‖ global_exit_root ‖ u64 timestamp ‖ coinbase)`, with
/// the packed encoding of the rollup contract.
pub fn accumulate_input_hash(
    previous: B256,
    transactions_hash: B256,
    global_exit_root: B256,
    timestamp: u64,
    coinbase: Address,
) -> B256 {
    let mut buf = [0u8; 32 * 3 + 8 + 20];
    buf[..32].copy_from_slice(previous.as_slice());
    buf[32..64].copy_from_slice(transactions_hash.as_slice());
    buf[64..96].copy_from_slice(global_exit_root.as_slice());
    buf[96..104].copy_from_slice(&timestamp.to_be_bytes());
    buf[104..].copy_from_slice(coinbase.as_slice());
    keccak256(buf)
}

/// Computes the commitment stored for a forced batch.
///
/// `keccak256(transactions_hash ‖ global_exit_root ‖ u64 min_forced_timestamp)`.
pub fn forced_batch_hash(
    transactions_hash: B256,
    global_exit_root: B256,
    min_forced_timestamp: u64,
) -> B256 {
    let mut buf = [0u8; 32 * 2 + 8];
    buf[..32].copy_from_slice(transactions_hash.as_slice());
    buf[32..64].copy_from_slice(global_exit_root.as_slice());
    buf[64..].copy_from_slice(&min_forced_timestamp.to_be_bytes());
    keccak256(buf)
}
