//! The batch fee adjustment applied on every permissionless verification.

use crate::FeeConfig;

use alloy_primitives::{uint, U256};

/// The fixed point precision of the fee divisor.
const FEE_PRECISION: U256 = uint!(1_000_000_000_000_000_000_U256);

/// The split of the newly verified batches around the verification time target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VerificationTiming {
    /// Batches verified after the target time elapsed.
    pub above_target: u64,
    /// Batches verified within the target time.
    pub below_target: u64,
}

impl VerificationTiming {
    /// Returns the total number of verified batches.
    pub const fn total(&self) -> u64 {
        self.above_target.saturating_add(self.below_target)
    }
}

/// Returns the batch fee following a verification with the provided timing.
///
/// Late verifications raise the fee by `multiplier / denominator` per excess batch, early ones
/// lower it by the same ratio. The exponent is capped and the result clamped to the configured
/// bounds. A verification of zero batches leaves the fee untouched.
pub fn adjust_batch_fee(
    batch_fee: U256,
    multiplier: u16,
    timing: VerificationTiming,
    config: &FeeConfig,
) -> U256 {
    if timing.total() == 0 {
        return batch_fee;
    }

    let multiplier = U256::from(multiplier);
    let denominator = U256::from(config.fee_denominator);
    let ratio_pow = |diff: u64| {
        let exponent = U256::from(diff.min(config.max_batch_multiplier));
        (multiplier.saturating_pow(exponent), denominator.saturating_pow(exponent))
    };

    let fee = if timing.below_target < timing.above_target {
        let (numerator, divisor) = ratio_pow(timing.above_target - timing.below_target);
        batch_fee.saturating_mul(numerator).checked_div(divisor).unwrap_or(config.max_batch_fee)
    } else {
        let (numerator, divisor) = ratio_pow(timing.below_target - timing.above_target);
        let acc_divisor =
            FEE_PRECISION.saturating_mul(numerator).checked_div(divisor).unwrap_or_default();
        FEE_PRECISION
            .saturating_mul(batch_fee)
            .checked_div(acc_divisor)
            .unwrap_or(config.max_batch_fee)
    };

    fee.clamp(config.min_batch_fee, config.max_batch_fee)
}
