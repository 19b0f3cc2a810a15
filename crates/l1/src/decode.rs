use crate::{
    abi::{calls, logs},
    DecodeError,
};

use alloy_primitives::{keccak256, Address, Bytes, LogData, Selector};
use alloy_sol_types::{SolCall, SolEvent};
use rollup_sync_primitives::{
    BatchData, ConsolidatePendingState, ForceBatch, ForcedBatchData, PendingStateProof,
    RollupEvent, SequenceBatches, SequenceForceBatches, VerifyBatches,
};

/// The fields of the transaction that emitted a log which are needed to complete the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Transaction {
    /// The sender of the transaction.
    pub from: Address,
    /// The calldata of the transaction.
    pub input: Bytes,
}

/// A log emitted by the rollup contract.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::From)]
#[allow(missing_docs)]
pub enum RollupLog {
    SequenceBatches(logs::SequenceBatches),
    SequenceForceBatches(logs::SequenceForceBatches),
    ForceBatch(logs::ForceBatch),
    VerifyBatches(logs::VerifyBatches),
    VerifyBatchesTrustedAggregator(logs::VerifyBatchesTrustedAggregator),
    ConsolidatePendingState(logs::ConsolidatePendingState),
    OverridePendingState(logs::OverridePendingState),
    ProveNonDeterministicPendingState(logs::ProveNonDeterministicPendingState),
    EmergencyStateActivated(logs::EmergencyStateActivated),
    EmergencyStateDeactivated(logs::EmergencyStateDeactivated),
    SetTrustedSequencer(logs::SetTrustedSequencer),
    SetTrustedSequencerURL(logs::SetTrustedSequencerURL),
    SetTrustedAggregator(logs::SetTrustedAggregator),
    SetTrustedAggregatorTimeout(logs::SetTrustedAggregatorTimeout),
    SetPendingStateTimeout(logs::SetPendingStateTimeout),
    SetMultiplierBatchFee(logs::SetMultiplierBatchFee),
    SetVerifyBatchTimeTarget(logs::SetVerifyBatchTimeTarget),
    SetForceBatchTimeout(logs::SetForceBatchTimeout),
    ActivateForceBatches(logs::ActivateForceBatches),
    TransferAdminRole(logs::TransferAdminRole),
    AcceptAdminRole(logs::AcceptAdminRole),
    OwnershipTransferred(logs::OwnershipTransferred),
    UpdateSupernets2Version(logs::UpdateSupernets2Version),
    Initialized(logs::Initialized),
}

macro_rules! decode_by_signature {
    ($topic:expr, $data:expr, [$($event:ident),* $(,)?]) => {
        $(
            if $topic == logs::$event::SIGNATURE_HASH {
                return Ok(Some(Self::$event(logs::$event::decode_log_data($data)?)));
            }
        )*
    };
}

impl RollupLog {
    /// Tries to decode the provided log data. Returns `None` if the first topic does not match
    /// any rollup contract event.
    pub fn try_decode(data: &LogData) -> Result<Option<Self>, DecodeError> {
        let Some(topic) = data.topics().first().copied() else { return Ok(None) };
        decode_by_signature!(
            topic,
            data,
            [
                SequenceBatches,
                SequenceForceBatches,
                ForceBatch,
                VerifyBatches,
                VerifyBatchesTrustedAggregator,
                ConsolidatePendingState,
                OverridePendingState,
                ProveNonDeterministicPendingState,
                EmergencyStateActivated,
                EmergencyStateDeactivated,
                SetTrustedSequencer,
                SetTrustedSequencerURL,
                SetTrustedAggregator,
                SetTrustedAggregatorTimeout,
                SetPendingStateTimeout,
                SetMultiplierBatchFee,
                SetVerifyBatchTimeTarget,
                SetForceBatchTimeout,
                ActivateForceBatches,
                TransferAdminRole,
                AcceptAdminRole,
                OwnershipTransferred,
                UpdateSupernets2Version,
                Initialized,
            ]
        );
        Ok(None)
    }

    /// Returns the signature hashes of all the rollup contract events, used to filter logs.
    pub fn signatures() -> Vec<alloy_primitives::B256> {
        vec![
            logs::SequenceBatches::SIGNATURE_HASH,
            logs::SequenceForceBatches::SIGNATURE_HASH,
            logs::ForceBatch::SIGNATURE_HASH,
            logs::VerifyBatches::SIGNATURE_HASH,
            logs::VerifyBatchesTrustedAggregator::SIGNATURE_HASH,
            logs::ConsolidatePendingState::SIGNATURE_HASH,
            logs::OverridePendingState::SIGNATURE_HASH,
            logs::ProveNonDeterministicPendingState::SIGNATURE_HASH,
            logs::EmergencyStateActivated::SIGNATURE_HASH,
            logs::EmergencyStateDeactivated::SIGNATURE_HASH,
            logs::SetTrustedSequencer::SIGNATURE_HASH,
            logs::SetTrustedSequencerURL::SIGNATURE_HASH,
            logs::SetTrustedAggregator::SIGNATURE_HASH,
            logs::SetTrustedAggregatorTimeout::SIGNATURE_HASH,
            logs::SetPendingStateTimeout::SIGNATURE_HASH,
            logs::SetMultiplierBatchFee::SIGNATURE_HASH,
            logs::SetVerifyBatchTimeTarget::SIGNATURE_HASH,
            logs::SetForceBatchTimeout::SIGNATURE_HASH,
            logs::ActivateForceBatches::SIGNATURE_HASH,
            logs::TransferAdminRole::SIGNATURE_HASH,
            logs::AcceptAdminRole::SIGNATURE_HASH,
            logs::OwnershipTransferred::SIGNATURE_HASH,
            logs::UpdateSupernets2Version::SIGNATURE_HASH,
            logs::Initialized::SIGNATURE_HASH,
        ]
    }

    /// Returns true if the emitting transaction is needed to convert the log into a
    /// [`RollupEvent`].
    pub fn requires_transaction(&self) -> bool {
        match self {
            Self::ForceBatch(log) => log.transactions.is_empty(),
            Self::SequenceBatches(_) |
            Self::SequenceForceBatches(_) |
            Self::VerifyBatches(_) |
            Self::VerifyBatchesTrustedAggregator(_) |
            Self::ConsolidatePendingState(_) |
            Self::OverridePendingState(_) |
            Self::ProveNonDeterministicPendingState(_) |
            Self::EmergencyStateActivated(_) => true,
            _ => false,
        }
    }

    /// Converts the log into a [`RollupEvent`], completing it with the calldata of the emitting
    /// transaction where the log alone is not enough.
    pub fn into_event(self, tx: Option<&L1Transaction>) -> Result<RollupEvent, DecodeError> {
        let event = match self {
            Self::SequenceBatches(log) => {
                let call: calls::sequenceBatchesCall = decode_call("SequenceBatches", tx)?;
                RollupEvent::SequenceBatches(SequenceBatches {
                    last_batch_number: log.numBatch,
                    batches: call
                        .batches
                        .into_iter()
                        .map(|batch| BatchData {
                            transactions_hash: batch.transactionsHash,
                            global_exit_root: batch.globalExitRoot,
                            timestamp: batch.timestamp,
                            min_forced_timestamp: batch.minForcedTimestamp,
                            transactions_len: None,
                        })
                        .collect(),
                    l2_coinbase: call.l2Coinbase,
                })
            }
            Self::SequenceForceBatches(log) => {
                let call: calls::sequenceForceBatchesCall =
                    decode_call("SequenceForceBatches", tx)?;
                RollupEvent::SequenceForceBatches(SequenceForceBatches {
                    last_batch_number: log.numBatch,
                    batches: call
                        .batches
                        .into_iter()
                        .map(|batch| ForcedBatchData {
                            transactions_hash: keccak256(&batch.transactions),
                            global_exit_root: batch.globalExitRoot,
                            min_forced_timestamp: batch.minForcedTimestamp,
                        })
                        .collect(),
                    sequencer: sender("SequenceForceBatches", tx)?,
                })
            }
            Self::ForceBatch(log) => {
                let transactions = if log.transactions.is_empty() {
                    let call: calls::forceBatchCall = decode_call("ForceBatch", tx)?;
                    call.transactions
                } else {
                    log.transactions
                };
                RollupEvent::ForceBatch(ForceBatch {
                    force_batch_number: log.forceBatchNum,
                    last_global_exit_root: log.lastGlobalExitRoot,
                    sequencer: log.sequencer,
                    transactions,
                })
            }
            Self::VerifyBatches(log) => {
                let call: calls::verifyBatchesCall = decode_call("VerifyBatches", tx)?;
                ensure_matches("VerifyBatches", log.numBatch == call.finalNewBatch)?;
                ensure_matches("VerifyBatches", log.stateRoot == call.newStateRoot)?;
                RollupEvent::VerifyBatches(VerifyBatches {
                    init_pending_state_number: call.pendingStateNum,
                    init_batch_number: call.initNumBatch,
                    final_batch_number: call.finalNewBatch,
                    new_local_exit_root: call.newLocalExitRoot,
                    new_state_root: call.newStateRoot,
                    aggregator: log.aggregator,
                })
            }
            Self::VerifyBatchesTrustedAggregator(log) => {
                let call: calls::verifyBatchesTrustedAggregatorCall =
                    decode_call("VerifyBatchesTrustedAggregator", tx)?;
                let name = "VerifyBatchesTrustedAggregator";
                ensure_matches(name, log.numBatch == call.finalNewBatch)?;
                ensure_matches(name, log.stateRoot == call.newStateRoot)?;
                RollupEvent::VerifyBatchesTrustedAggregator(VerifyBatches {
                    init_pending_state_number: call.pendingStateNum,
                    init_batch_number: call.initNumBatch,
                    final_batch_number: call.finalNewBatch,
                    new_local_exit_root: call.newLocalExitRoot,
                    new_state_root: call.newStateRoot,
                    aggregator: log.aggregator,
                })
            }
            Self::ConsolidatePendingState(log) => {
                RollupEvent::ConsolidatePendingState(ConsolidatePendingState {
                    batch_number: log.numBatch,
                    state_root: log.stateRoot,
                    pending_state_number: log.pendingStateNum,
                    sender: sender("ConsolidatePendingState", tx)?,
                })
            }
            Self::OverridePendingState(log) => {
                let call: calls::overridePendingStateCall =
                    decode_call("OverridePendingState", tx)?;
                ensure_matches("OverridePendingState", log.numBatch == call.finalNewBatch)?;
                RollupEvent::OverridePendingState(PendingStateProof {
                    init_pending_state_number: call.initPendingStateNum,
                    final_pending_state_number: call.finalPendingStateNum,
                    init_batch_number: call.initNumBatch,
                    final_batch_number: call.finalNewBatch,
                    new_local_exit_root: call.newLocalExitRoot,
                    new_state_root: call.newStateRoot,
                    aggregator: log.aggregator,
                })
            }
            Self::ProveNonDeterministicPendingState(log) => {
                let call: calls::proveNonDeterministicPendingStateCall =
                    decode_call("ProveNonDeterministicPendingState", tx)?;
                ensure_matches(
                    "ProveNonDeterministicPendingState",
                    log.provedStateRoot == call.newStateRoot,
                )?;
                RollupEvent::ProveNonDeterministicPendingState(PendingStateProof {
                    init_pending_state_number: call.initPendingStateNum,
                    final_pending_state_number: call.finalPendingStateNum,
                    init_batch_number: call.initNumBatch,
                    final_batch_number: call.finalNewBatch,
                    new_local_exit_root: call.newLocalExitRoot,
                    new_state_root: call.newStateRoot,
                    aggregator: sender("ProveNonDeterministicPendingState", tx)?,
                })
            }
            Self::EmergencyStateActivated(_) => {
                // The activation can also be emitted by a non-deterministic pending state proof,
                // in which case no batch is named.
                let sequenced_batch_number = tx
                    .filter(|tx| tx.input.starts_with(&calls::activateEmergencyStateCall::SELECTOR))
                    .map(|tx| calls::activateEmergencyStateCall::abi_decode(&tx.input))
                    .transpose()?
                    .map(|call| call.sequencedBatchNum);
                RollupEvent::EmergencyStateActivated { sequenced_batch_number }
            }
            Self::EmergencyStateDeactivated(_) => RollupEvent::EmergencyStateDeactivated,
            Self::SetTrustedSequencer(log) => {
                RollupEvent::SetTrustedSequencer(log.newTrustedSequencer)
            }
            Self::SetTrustedSequencerURL(log) => {
                RollupEvent::SetTrustedSequencerUrl(log.newTrustedSequencerURL)
            }
            Self::SetTrustedAggregator(log) => {
                RollupEvent::SetTrustedAggregator(log.newTrustedAggregator)
            }
            Self::SetTrustedAggregatorTimeout(log) => {
                RollupEvent::SetTrustedAggregatorTimeout(log.newTrustedAggregatorTimeout)
            }
            Self::SetPendingStateTimeout(log) => {
                RollupEvent::SetPendingStateTimeout(log.newPendingStateTimeout)
            }
            Self::SetMultiplierBatchFee(log) => {
                RollupEvent::SetMultiplierBatchFee(log.newMultiplierBatchFee)
            }
            Self::SetVerifyBatchTimeTarget(log) => {
                RollupEvent::SetVerifyBatchTimeTarget(log.newVerifyBatchTimeTarget)
            }
            Self::SetForceBatchTimeout(log) => {
                RollupEvent::SetForceBatchTimeout(log.newforceBatchTimeout)
            }
            Self::ActivateForceBatches(_) => RollupEvent::ActivateForceBatches,
            Self::TransferAdminRole(log) => RollupEvent::TransferAdminRole(log.newPendingAdmin),
            Self::AcceptAdminRole(log) => RollupEvent::AcceptAdminRole(log.newAdmin),
            Self::OwnershipTransferred(log) => RollupEvent::OwnershipTransferred {
                previous_owner: log.previousOwner,
                new_owner: log.newOwner,
            },
            Self::UpdateSupernets2Version(log) => RollupEvent::UpdateVersion {
                batch_number: log.numBatch,
                fork_id: log.forkID,
                version: log.version,
            },
            Self::Initialized(log) => RollupEvent::Initialized(log.version),
        };
        Ok(event)
    }
}

/// Decodes the calldata of the emitting transaction as the call `C`.
fn decode_call<C: SolCall>(
    event: &'static str,
    tx: Option<&L1Transaction>,
) -> Result<C, DecodeError> {
    let tx = tx.ok_or(DecodeError::MissingTransaction(event))?;
    let selector = tx.input.get(..4).map(Selector::from_slice);
    if selector != Some(Selector::from(C::SELECTOR)) {
        return Err(DecodeError::UnexpectedCalldata { event, selector });
    }
    Ok(C::abi_decode(&tx.input)?)
}

fn sender(event: &'static str, tx: Option<&L1Transaction>) -> Result<Address, DecodeError> {
    tx.map(|tx| tx.from).ok_or(DecodeError::MissingTransaction(event))
}

const fn ensure_matches(event: &'static str, matches: bool) -> Result<(), DecodeError> {
    if matches {
        Ok(())
    } else {
        Err(DecodeError::CalldataMismatch(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes, B256};

    fn tx(input: Vec<u8>) -> L1Transaction {
        L1Transaction {
            from: address!("0x00000000000000000000000000000000000000aa"),
            input: input.into(),
        }
    }

    #[test]
    fn test_decode_sequence_batches() -> Result<(), DecodeError> {
        let log = logs::SequenceBatches { numBatch: 2 }.encode_log_data();
        let call = calls::sequenceBatchesCall {
            batches: vec![
                calls::SequencedBatchData {
                    transactionsHash: B256::repeat_byte(1),
                    globalExitRoot: B256::repeat_byte(2),
                    timestamp: 10,
                    minForcedTimestamp: 0,
                },
                calls::SequencedBatchData {
                    transactionsHash: B256::repeat_byte(3),
                    globalExitRoot: B256::repeat_byte(2),
                    timestamp: 11,
                    minForcedTimestamp: 0,
                },
            ],
            l2Coinbase: address!("0x00000000000000000000000000000000000000bb"),
            signaturesAndAddrs: bytes!(""),
        };

        let decoded = RollupLog::try_decode(&log)?.expect("known event");
        assert!(decoded.requires_transaction());

        let event = decoded.into_event(Some(&tx(call.abi_encode())))?;
        let RollupEvent::SequenceBatches(sequence) = event else {
            panic!("expected sequence batches, got {event:?}")
        };
        assert_eq!(sequence.last_batch_number, 2);
        assert_eq!(sequence.batches.len(), 2);
        assert_eq!(sequence.batches[1].transactions_hash, B256::repeat_byte(3));
        assert_eq!(sequence.l2_coinbase, address!("0x00000000000000000000000000000000000000bb"));

        Ok(())
    }

    #[test]
    fn test_decode_requires_transaction() -> Result<(), DecodeError> {
        let log = logs::ConsolidatePendingState {
            numBatch: 5,
            stateRoot: B256::repeat_byte(5),
            pendingStateNum: 1,
        }
        .encode_log_data();

        let decoded = RollupLog::try_decode(&log)?.expect("known event");
        assert!(matches!(decoded.into_event(None), Err(DecodeError::MissingTransaction(_))));

        Ok(())
    }

    #[test]
    fn test_decode_force_batch_falls_back_to_calldata() -> Result<(), DecodeError> {
        let log = logs::ForceBatch {
            forceBatchNum: 1,
            lastGlobalExitRoot: B256::repeat_byte(7),
            sequencer: address!("0x00000000000000000000000000000000000000cc"),
            transactions: Bytes::new(),
        }
        .encode_log_data();
        let call = calls::forceBatchCall {
            transactions: bytes!("0xdeadbeef"),
            maticAmount: Default::default(),
        };

        let decoded = RollupLog::try_decode(&log)?.expect("known event");
        assert!(decoded.requires_transaction());
        let RollupEvent::ForceBatch(force) = decoded.into_event(Some(&tx(call.abi_encode())))?
        else {
            panic!("expected force batch")
        };
        assert_eq!(force.transactions, bytes!("0xdeadbeef"));

        Ok(())
    }

    #[test]
    fn test_decode_verify_batches_rejects_mismatching_calldata() -> Result<(), DecodeError> {
        let log = logs::VerifyBatches {
            numBatch: 5,
            stateRoot: B256::repeat_byte(1),
            aggregator: Address::ZERO,
        }
        .encode_log_data();
        let call = calls::verifyBatchesCall {
            pendingStateNum: 0,
            initNumBatch: 0,
            finalNewBatch: 4,
            newLocalExitRoot: B256::ZERO,
            newStateRoot: B256::repeat_byte(1),
            proof: Default::default(),
        };

        let decoded = RollupLog::try_decode(&log)?.expect("known event");
        assert!(matches!(
            decoded.into_event(Some(&tx(call.abi_encode()))),
            Err(DecodeError::CalldataMismatch("VerifyBatches"))
        ));

        Ok(())
    }

    #[test]
    fn test_decode_emergency_activation_without_named_batch() -> Result<(), DecodeError> {
        let log = logs::EmergencyStateActivated {}.encode_log_data();
        let decoded = RollupLog::try_decode(&log)?.expect("known event");

        let event = decoded.into_event(Some(&tx(vec![0u8; 4])))?;
        assert_eq!(event, RollupEvent::EmergencyStateActivated { sequenced_batch_number: None });

        Ok(())
    }

    #[test]
    fn test_decode_unknown_topic() -> Result<(), DecodeError> {
        let log = LogData::new_unchecked(vec![B256::repeat_byte(0xff)], Bytes::new());
        assert!(RollupLog::try_decode(&log)?.is_none());
        Ok(())
    }
}
