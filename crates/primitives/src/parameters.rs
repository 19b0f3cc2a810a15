use crate::{
    INITIAL_BATCH_FEE, INITIAL_FORCE_BATCH_TIMEOUT, INITIAL_MULTIPLIER_BATCH_FEE,
    INITIAL_VERIFY_BATCH_TIME_TARGET,
};

use alloy_primitives::{Address, U256};

/// The mutable parameters of the rollup contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct RollupParameters {
    /// The fee paid per sequenced batch.
    pub batch_fee: U256,
    /// The batch fee multiplier, with three decimals of precision.
    pub multiplier_batch_fee: u16,
    /// The target time (seconds) between the sequencing and the verification of a batch.
    pub verify_batch_time_target: u64,
    /// The time (seconds) a pending state waits before it can be consolidated.
    pub pending_state_timeout: u64,
    /// The time (seconds) a sequenced batch is reserved for the trusted aggregator.
    pub trusted_aggregator_timeout: u64,
    /// The time (seconds) after which anyone can sequence forced batches.
    pub force_batch_timeout: u64,
    /// The timestamp of the last sequenced batch.
    pub last_timestamp: u64,
    /// The trusted sequencer.
    pub trusted_sequencer: Address,
    /// The URL of the trusted sequencer.
    pub trusted_sequencer_url: String,
    /// The trusted aggregator.
    pub trusted_aggregator: Address,
    /// The admin.
    pub admin: Address,
    /// The admin proposed by the current admin.
    pub pending_admin: Address,
    /// The owner.
    pub owner: Address,
    /// Whether forcing batches is disallowed.
    pub is_forced_batch_disallowed: bool,
    /// The current fork id.
    pub fork_id: u64,
    /// The current version string.
    pub version: String,
}

impl Default for RollupParameters {
    fn default() -> Self {
        Self {
            batch_fee: INITIAL_BATCH_FEE,
            multiplier_batch_fee: INITIAL_MULTIPLIER_BATCH_FEE,
            verify_batch_time_target: INITIAL_VERIFY_BATCH_TIME_TARGET,
            pending_state_timeout: 0,
            trusted_aggregator_timeout: 0,
            force_batch_timeout: INITIAL_FORCE_BATCH_TIMEOUT,
            last_timestamp: 0,
            trusted_sequencer: Address::ZERO,
            trusted_sequencer_url: String::new(),
            trusted_aggregator: Address::ZERO,
            admin: Address::ZERO,
            pending_admin: Address::ZERO,
            owner: Address::ZERO,
            is_forced_batch_disallowed: true,
            fork_id: 0,
            version: String::new(),
        }
    }
}

/// The emergency state of the rollup.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct EmergencyState {
    /// Whether the emergency state is active.
    pub is_active: bool,
    /// The batch number at which the emergency state was activated.
    pub activated_at_batch: Option<u64>,
}

impl EmergencyState {
    /// Returns an active [`EmergencyState`] raised at the provided batch.
    pub const fn activated(batch_number: u64) -> Self {
        Self { is_active: true, activated_at_batch: Some(batch_number) }
    }
}
