//! A library containing the rollup contract ABI and the decoding of its logs into
//! [`RollupEvent`](rollup_sync_primitives::RollupEvent)s.

pub mod abi;

mod decode;
pub use decode::{L1Transaction, RollupLog};

mod error;
pub use error::DecodeError;
