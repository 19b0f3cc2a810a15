//! The ABI of the rollup contract.

/// The calls to the rollup contract whose calldata completes the emitted events.
#[allow(missing_docs)]
pub mod calls;

/// The events emitted by the rollup contract.
#[allow(missing_docs)]
pub mod logs;
