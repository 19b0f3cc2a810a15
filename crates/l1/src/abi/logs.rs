use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event SequenceBatches(uint64 indexed numBatch);

    #[derive(Debug, PartialEq, Eq)]
    event SequenceForceBatches(uint64 indexed numBatch);

    #[derive(Debug, PartialEq, Eq)]
    event ForceBatch(
        uint64 indexed forceBatchNum,
        bytes32 lastGlobalExitRoot,
        address sequencer,
        bytes transactions
    );

    #[derive(Debug, PartialEq, Eq)]
    event VerifyBatches(uint64 indexed numBatch, bytes32 stateRoot, address indexed aggregator);

    #[derive(Debug, PartialEq, Eq)]
    event VerifyBatchesTrustedAggregator(
        uint64 indexed numBatch,
        bytes32 stateRoot,
        address indexed aggregator
    );

    #[derive(Debug, PartialEq, Eq)]
    event ConsolidatePendingState(
        uint64 indexed numBatch,
        bytes32 stateRoot,
        uint64 indexed pendingStateNum
    );

    #[derive(Debug, PartialEq, Eq)]
    event OverridePendingState(
        uint64 indexed numBatch,
        bytes32 stateRoot,
        address indexed aggregator
    );

    #[derive(Debug, PartialEq, Eq)]
    event ProveNonDeterministicPendingState(bytes32 storedStateRoot, bytes32 provedStateRoot);

    #[derive(Debug, PartialEq, Eq)]
    event EmergencyStateActivated();

    #[derive(Debug, PartialEq, Eq)]
    event EmergencyStateDeactivated();

    #[derive(Debug, PartialEq, Eq)]
    event SetTrustedSequencer(address newTrustedSequencer);

    #[derive(Debug, PartialEq, Eq)]
    event SetTrustedSequencerURL(string newTrustedSequencerURL);

    #[derive(Debug, PartialEq, Eq)]
    event SetTrustedAggregator(address newTrustedAggregator);

    #[derive(Debug, PartialEq, Eq)]
    event SetTrustedAggregatorTimeout(uint64 newTrustedAggregatorTimeout);

    #[derive(Debug, PartialEq, Eq)]
    event SetPendingStateTimeout(uint64 newPendingStateTimeout);

    #[derive(Debug, PartialEq, Eq)]
    event SetMultiplierBatchFee(uint16 newMultiplierBatchFee);

    #[derive(Debug, PartialEq, Eq)]
    event SetVerifyBatchTimeTarget(uint64 newVerifyBatchTimeTarget);

    #[derive(Debug, PartialEq, Eq)]
    event SetForceBatchTimeout(uint64 newforceBatchTimeout);

    #[derive(Debug, PartialEq, Eq)]
    event ActivateForceBatches();

    #[derive(Debug, PartialEq, Eq)]
    event TransferAdminRole(address newPendingAdmin);

    #[derive(Debug, PartialEq, Eq)]
    event AcceptAdminRole(address newAdmin);

    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

    #[derive(Debug, PartialEq, Eq)]
    event UpdateSupernets2Version(uint64 numBatch, uint64 forkID, string version);

    #[derive(Debug, PartialEq, Eq)]
    event Initialized(uint8 version);
}
