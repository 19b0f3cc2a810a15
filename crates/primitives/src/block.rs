use crate::L1EventLog;

use alloy_primitives::B256;

/// Information about a block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
}

impl BlockInfo {
    /// Returns a new instance of [`BlockInfo`].
    pub const fn new(number: u64, hash: B256) -> Self {
        Self { number, hash }
    }
}

impl core::fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{} ({})", self.number, self.hash)
    }
}

#[cfg(feature = "arbitrary")]
impl arbitrary::Arbitrary<'_> for BlockInfo {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let number = u.int_in_range(0..=u32::MAX)?;
        let hash = B256::arbitrary(u)?;
        Ok(Self { number: number as u64, hash })
    }
}

/// The header fields of an L1 block required to apply its events and detect reorgs.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct L1BlockHeader {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The block timestamp in seconds.
    pub timestamp: u64,
}

impl L1BlockHeader {
    /// Returns the [`BlockInfo`] of the header.
    pub const fn block_info(&self) -> BlockInfo {
        BlockInfo { number: self.number, hash: self.hash }
    }
}

/// All the rollup contract events emitted in a single L1 block, in log order.
///
/// A block without any rollup events is still delivered so that the chain of parent hashes can be
/// followed without gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct L1BlockEvents {
    /// The header of the block.
    pub header: L1BlockHeader,
    /// The decoded events, ordered by log index.
    pub events: Vec<L1EventLog>,
}

impl L1BlockEvents {
    /// Returns a new [`L1BlockEvents`] with no events.
    pub const fn empty(header: L1BlockHeader) -> Self {
        Self { header, events: Vec::new() }
    }

    /// Returns the block number.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// Returns the [`BlockInfo`] of the block.
    pub const fn block_info(&self) -> BlockInfo {
        self.header.block_info()
    }
}
