use alloy_primitives::Selector;

/// An error that occurred while decoding a rollup contract log.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The event requires the emitting transaction but none was provided.
    #[error("event {0} requires the emitting transaction")]
    MissingTransaction(&'static str),
    /// The calldata of the emitting transaction does not match the event.
    #[error("unexpected calldata for event {event}: selector {selector:?}")]
    UnexpectedCalldata {
        /// The name of the event.
        event: &'static str,
        /// The selector found in the calldata, if any.
        selector: Option<Selector>,
    },
    /// The calldata of the emitting transaction contradicts the log.
    #[error("calldata of the emitting transaction does not match event {0}")]
    CalldataMismatch(&'static str),
    /// The ABI decoding failed.
    #[error("abi decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}
