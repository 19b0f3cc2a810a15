use alloy_primitives::{B256, U256};
use rollup_sync_primitives::{
    L1BlockHeader, RollupParameters, BATCH_FEE_DENOMINATOR, HALT_AGGREGATION_TIMEOUT,
    MAX_BATCH_FEE, MAX_BATCH_MULTIPLIER, MAX_FORCE_BATCH_BYTE_LENGTH,
    MAX_TRANSACTIONS_BYTE_LENGTH, MAX_VERIFY_BATCHES, MIN_BATCH_FEE,
};

/// The default maximum depth of an L1 reorg, in blocks.
pub const DEFAULT_MAX_REORG_DEPTH: u64 = 96;

/// The configuration of the [`crate::Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// The state of the rollup at deployment.
    pub genesis: GenesisConfig,
    /// The maximum number of blocks searched back for a common ancestor on a reorg.
    pub max_reorg_depth: u64,
    /// The batch fee adjustment settings.
    pub fee: FeeConfig,
    /// The maximum byte length of the transactions of a sequenced batch.
    pub max_transactions_byte_length: u64,
    /// The maximum byte length of the transactions of a forced batch.
    pub max_force_batch_byte_length: u64,
    /// The maximum number of batches sequenced or verified at once.
    pub max_verify_batches: u64,
    /// The trusted aggregator timeout set when a pending state is overridden.
    pub halt_aggregation_timeout: u64,
}

impl ReconcilerConfig {
    /// Returns a new [`ReconcilerConfig`] for the genesis with the protocol defaults.
    pub fn new(genesis: GenesisConfig) -> Self {
        Self {
            genesis,
            max_reorg_depth: DEFAULT_MAX_REORG_DEPTH,
            fee: FeeConfig::default(),
            max_transactions_byte_length: MAX_TRANSACTIONS_BYTE_LENGTH,
            max_force_batch_byte_length: MAX_FORCE_BATCH_BYTE_LENGTH,
            max_verify_batches: MAX_VERIFY_BATCHES,
            halt_aggregation_timeout: HALT_AGGREGATION_TIMEOUT,
        }
    }

    /// Sets the maximum reorg depth.
    pub const fn with_max_reorg_depth(mut self, max_reorg_depth: u64) -> Self {
        self.max_reorg_depth = max_reorg_depth;
        self
    }
}

/// The state of the rollup when the contract was deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisConfig {
    /// The L1 block the ledger starts from. Nothing at or below it is ever rolled back.
    pub block: L1BlockHeader,
    /// The state root of batch 0.
    pub state_root: B256,
    /// The parameters the contract was initialized with.
    pub parameters: RollupParameters,
}

/// The bounds and precision of the batch fee adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeConfig {
    /// The lower bound of the batch fee.
    pub min_batch_fee: U256,
    /// The upper bound of the batch fee.
    pub max_batch_fee: U256,
    /// The denominator of the fee multiplier.
    pub fee_denominator: u64,
    /// The maximum exponent of the fee multiplier.
    pub max_batch_multiplier: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            min_batch_fee: MIN_BATCH_FEE,
            max_batch_fee: MAX_BATCH_FEE,
            fee_denominator: BATCH_FEE_DENOMINATOR,
            max_batch_multiplier: MAX_BATCH_MULTIPLIER,
        }
    }
}
