//! Primitive types for the rollup L1 synchronizer.

pub use block::{BlockInfo, L1BlockEvents, L1BlockHeader};
mod block;

pub use batch::{
    accumulate_input_hash, forced_batch_hash, BatchData, ForcedBatch, ForcedBatchData,
    SequencedBatch,
};
mod batch;

pub use constants::*;
mod constants;

pub use event::{
    ConsolidatePendingState, ForceBatch, L1EventLog, PendingStateProof, RollupEvent,
    SequenceBatches, SequenceForceBatches, VerifyBatches,
};
mod event;

pub use parameters::{EmergencyState, RollupParameters};
mod parameters;

pub use pending::PendingState;
mod pending;
