use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct SequencedBatchData {
        bytes32 transactionsHash;
        bytes32 globalExitRoot;
        uint64 timestamp;
        uint64 minForcedTimestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ForcedBatchCallData {
        bytes transactions;
        bytes32 globalExitRoot;
        uint64 minForcedTimestamp;
    }

    #[derive(Debug, PartialEq, Eq)]
    function sequenceBatches(
        SequencedBatchData[] batches,
        address l2Coinbase,
        bytes signaturesAndAddrs
    ) external;

    #[derive(Debug, PartialEq, Eq)]
    function sequenceForceBatches(ForcedBatchCallData[] batches) external;

    #[derive(Debug, PartialEq, Eq)]
    function forceBatch(bytes transactions, uint256 maticAmount) external;

    #[derive(Debug, PartialEq, Eq)]
    function verifyBatches(
        uint64 pendingStateNum,
        uint64 initNumBatch,
        uint64 finalNewBatch,
        bytes32 newLocalExitRoot,
        bytes32 newStateRoot,
        bytes32[24] proof
    ) external;

    #[derive(Debug, PartialEq, Eq)]
    function verifyBatchesTrustedAggregator(
        uint64 pendingStateNum,
        uint64 initNumBatch,
        uint64 finalNewBatch,
        bytes32 newLocalExitRoot,
        bytes32 newStateRoot,
        bytes32[24] proof
    ) external;

    #[derive(Debug, PartialEq, Eq)]
    function overridePendingState(
        uint64 initPendingStateNum,
        uint64 finalPendingStateNum,
        uint64 initNumBatch,
        uint64 finalNewBatch,
        bytes32 newLocalExitRoot,
        bytes32 newStateRoot,
        bytes32[24] proof
    ) external;

    #[derive(Debug, PartialEq, Eq)]
    function proveNonDeterministicPendingState(
        uint64 initPendingStateNum,
        uint64 finalPendingStateNum,
        uint64 initNumBatch,
        uint64 finalNewBatch,
        bytes32 newLocalExitRoot,
        bytes32 newStateRoot,
        bytes32[24] proof
    ) external;

    #[derive(Debug, PartialEq, Eq)]
    function activateEmergencyState(uint64 sequencedBatchNum) external;
}
