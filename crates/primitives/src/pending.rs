use alloy_primitives::B256;

/// A verified state transition waiting to be consolidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct PendingState {
    /// The pending state number.
    pub pending_state_number: u64,
    /// The L1 timestamp at which the pending state was created.
    pub timestamp: u64,
    /// The last batch verified by the transition.
    pub last_verified_batch: u64,
    /// The local exit root after the transition.
    pub exit_root: B256,
    /// The state root after the transition.
    pub state_root: B256,
    /// Whether the pending state was consolidated.
    pub consolidated: bool,
    /// The L1 block in which the pending state was created.
    pub block_number: u64,
}

impl PendingState {
    /// Returns true if the pending state can be consolidated at `now` given the timeout.
    pub const fn is_consolidable(&self, now: u64, pending_state_timeout: u64) -> bool {
        self.timestamp != 0 && self.timestamp.saturating_add(pending_state_timeout) <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_consolidable() {
        let state = PendingState {
            pending_state_number: 1,
            timestamp: 1_000,
            last_verified_batch: 5,
            exit_root: B256::ZERO,
            state_root: B256::ZERO,
            consolidated: false,
            block_number: 10,
        };

        assert!(!state.is_consolidable(1_099, 100));
        assert!(state.is_consolidable(1_100, 100));
        assert!(state.is_consolidable(1_000, 0));
    }
}
