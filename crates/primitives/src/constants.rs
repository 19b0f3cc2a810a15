use alloy_primitives::{uint, U256};

/// The maximum byte length of the transactions of a sequenced batch.
pub const MAX_TRANSACTIONS_BYTE_LENGTH: u64 = 120_000;

/// The maximum byte length of the transactions of a forced batch.
pub const MAX_FORCE_BATCH_BYTE_LENGTH: u64 = 5_000;

/// The maximum number of batches that can be sequenced or verified at once.
pub const MAX_VERIFY_BATCHES: u64 = 1_000;

/// The trusted aggregator timeout set after a pending state is overridden (1 week).
pub const HALT_AGGREGATION_TIMEOUT: u64 = 7 * 24 * 60 * 60;

/// The maximum exponent applied to the batch fee multiplier in a single verification.
pub const MAX_BATCH_MULTIPLIER: u64 = 12;

/// The denominator of the batch fee multiplier.
pub const BATCH_FEE_DENOMINATOR: u64 = 1_000;

/// The lower bound of the batch fee (1 gwei).
pub const MIN_BATCH_FEE: U256 = uint!(1_000_000_000_U256);

/// The upper bound of the batch fee (1000 ether).
pub const MAX_BATCH_FEE: U256 = uint!(1_000_000_000_000_000_000_000_U256);

/// The initial batch fee (0.1 ether).
pub const INITIAL_BATCH_FEE: U256 = uint!(100_000_000_000_000_000_U256);

/// The initial batch fee multiplier.
pub const INITIAL_MULTIPLIER_BATCH_FEE: u16 = 1002;

/// The initial verify batch time target (30 minutes).
pub const INITIAL_VERIFY_BATCH_TIME_TARGET: u64 = 30 * 60;

/// The initial force batch timeout (5 days).
pub const INITIAL_FORCE_BATCH_TIMEOUT: u64 = 5 * 24 * 60 * 60;
