//! The batch sequencing ledger.

use crate::{
    error::EventResult, fee::VerificationTiming, BlockContext, ReconcilerConfig, SequencingError,
};

use alloy_primitives::{keccak256, B256};
use rollup_sync_db::{DatabaseConnectionProvider, DatabaseError, DatabaseOperations};
use rollup_sync_primitives::{
    accumulate_input_hash, ForceBatch, ForcedBatch, RollupParameters, SequenceBatches,
    SequenceForceBatches, SequencedBatch,
};

/// The ledger of sequenced and forced batches.
#[derive(Debug)]
pub(crate) struct BatchLedger<'a, DB> {
    db: &'a DB,
    config: &'a ReconcilerConfig,
}

impl<'a, DB> BatchLedger<'a, DB>
where
    DB: DatabaseConnectionProvider + Sync,
{
    /// Returns a new [`BatchLedger`] over the database.
    pub(crate) const fn new(db: &'a DB, config: &'a ReconcilerConfig) -> Self {
        Self { db, config }
    }

    /// Appends the batches sequenced by the trusted sequencer. Batches with a minimum forced
    /// timestamp consume the next forced batches in order.
    pub(crate) async fn append_sequenced(
        &self,
        sequence: &SequenceBatches,
        ctx: &BlockContext,
        parameters: &mut RollupParameters,
    ) -> EventResult<u64> {
        let count = self.check_sequence_len(sequence.batches.len())?;
        let last = self.last_batch().await?;
        check_last_batch_number(last.batch_number + count, sequence.last_batch_number)?;

        let last_forced = self.db.get_last_forced_batch_number().await?;
        let mut forced_cursor = self.db.get_last_consumed_forced_batch_number().await?;
        let mut acc_input_hash = last.acc_input_hash;
        let mut last_timestamp = parameters.last_timestamp;

        for (batch_number, data) in (last.batch_number + 1..).zip(&sequence.batches) {
            let forced_batch_number = if data.is_forced() {
                forced_cursor += 1;
                if forced_cursor > last_forced {
                    return Err(SequencingError::ForceBatchesOverflow {
                        requested: forced_cursor,
                        last_forced,
                    }
                    .into());
                }
                let forced = self.unconsumed_forced_batch(forced_cursor).await?;
                if forced.hash() != data.forced_hash() {
                    return Err(SequencingError::ForcedDataDoesNotMatch(forced_cursor).into());
                }
                if data.timestamp < data.min_forced_timestamp {
                    return Err(SequencingError::TimestampBelowForcedTimestamp {
                        batch_number,
                        timestamp: data.timestamp,
                        min_forced_timestamp: data.min_forced_timestamp,
                    }
                    .into());
                }
                Some(forced_cursor)
            } else {
                let max = self.config.max_transactions_byte_length;
                if let Some(length) = data.transactions_len.filter(|length| *length > max) {
                    return Err(
                        SequencingError::TransactionsLengthAboveMax { batch_number, length, max }
                            .into(),
                    );
                }
                None
            };

            if data.timestamp < last_timestamp || data.timestamp > ctx.now() {
                return Err(SequencingError::TimestampInvalid {
                    batch_number,
                    timestamp: data.timestamp,
                    last_timestamp,
                    now: ctx.now(),
                }
                .into());
            }

            acc_input_hash = accumulate_input_hash(
                acc_input_hash,
                data.transactions_hash,
                data.global_exit_root,
                data.timestamp,
                sequence.l2_coinbase,
            );
            self.db
                .insert_batch(SequencedBatch {
                    batch_number,
                    acc_input_hash,
                    transactions_hash: data.transactions_hash,
                    global_exit_root: data.global_exit_root,
                    timestamp: data.timestamp,
                    sequenced_timestamp: ctx.now(),
                    previous_last_batch_sequenced: last.batch_number,
                    coinbase: sequence.l2_coinbase,
                    forced_batch_number,
                    block_number: ctx.number(),
                    state_root: None,
                })
                .await?;
            if let Some(forced_batch_number) = forced_batch_number {
                self.db
                    .consume_forced_batch(forced_batch_number, batch_number, ctx.number())
                    .await?;
            }

            last_timestamp = data.timestamp;
        }

        parameters.last_timestamp = last_timestamp;
        tracing::debug!(
            target: "sync::reconciler",
            first = last.batch_number + 1,
            last = sequence.last_batch_number,
            "sequenced batches"
        );

        Ok(count)
    }

    /// Appends forced batches sequenced by anyone once the force batch timeout elapsed. The
    /// forced batches are consumed in order starting from the last sequenced one.
    pub(crate) async fn append_forced(
        &self,
        sequence: &SequenceForceBatches,
        ctx: &BlockContext,
        parameters: &mut RollupParameters,
    ) -> EventResult<u64> {
        if parameters.is_forced_batch_disallowed {
            return Err(SequencingError::ForceBatchNotAllowed.into());
        }
        let count = self.check_sequence_len(sequence.batches.len())?;

        let last_forced = self.db.get_last_forced_batch_number().await?;
        let last_consumed = self.db.get_last_consumed_forced_batch_number().await?;
        if last_consumed + count > last_forced {
            return Err(SequencingError::ForceBatchesOverflow {
                requested: last_consumed + count,
                last_forced,
            }
            .into());
        }

        let last = self.last_batch().await?;
        check_last_batch_number(last.batch_number + count, sequence.last_batch_number)?;

        let mut acc_input_hash = last.acc_input_hash;
        let batches = (last.batch_number + 1..).zip(last_consumed + 1..).zip(&sequence.batches);
        for (i, ((batch_number, force_batch_number), data)) in batches.enumerate() {
            let forced = self.unconsumed_forced_batch(force_batch_number).await?;
            if forced.hash() != data.hash() {
                return Err(SequencingError::ForcedDataDoesNotMatch(force_batch_number).into());
            }
            let is_last = i as u64 == count - 1;
            if is_last &&
                data.min_forced_timestamp.saturating_add(parameters.force_batch_timeout) >
                    ctx.now()
            {
                return Err(SequencingError::ForceBatchTimeoutNotExpired(force_batch_number).into());
            }

            acc_input_hash = accumulate_input_hash(
                acc_input_hash,
                data.transactions_hash,
                data.global_exit_root,
                ctx.now(),
                sequence.sequencer,
            );
            self.db
                .insert_batch(SequencedBatch {
                    batch_number,
                    acc_input_hash,
                    transactions_hash: data.transactions_hash,
                    global_exit_root: data.global_exit_root,
                    timestamp: ctx.now(),
                    sequenced_timestamp: ctx.now(),
                    previous_last_batch_sequenced: last.batch_number,
                    coinbase: sequence.sequencer,
                    forced_batch_number: Some(force_batch_number),
                    block_number: ctx.number(),
                    state_root: None,
                })
                .await?;
            self.db.consume_forced_batch(force_batch_number, batch_number, ctx.number()).await?;
        }

        parameters.last_timestamp = ctx.now();
        tracing::debug!(
            target: "sync::reconciler",
            first = last.batch_number + 1,
            last = sequence.last_batch_number,
            "sequenced forced batches"
        );

        Ok(count)
    }

    /// Records a batch forced on L1, committing to its transactions.
    pub(crate) async fn record_forced(
        &self,
        event: &ForceBatch,
        ctx: &BlockContext,
        parameters: &RollupParameters,
    ) -> EventResult<()> {
        if parameters.is_forced_batch_disallowed {
            return Err(SequencingError::ForceBatchNotAllowed.into());
        }

        let length = event.transactions.len() as u64;
        let max = self.config.max_force_batch_byte_length;
        if length > max {
            return Err(SequencingError::ForceBatchTooLarge { length, max }.into());
        }

        let expected = self.db.get_last_forced_batch_number().await? + 1;
        if event.force_batch_number != expected {
            return Err(SequencingError::ForceBatchNumberMismatch {
                expected,
                emitted: event.force_batch_number,
            }
            .into());
        }

        self.db
            .insert_forced_batch(ForcedBatch {
                force_batch_number: event.force_batch_number,
                transactions_hash: keccak256(&event.transactions),
                global_exit_root: event.last_global_exit_root,
                min_forced_timestamp: ctx.now(),
                sequencer: event.sequencer,
                block_number: ctx.number(),
                consumed_by: None,
            })
            .await?;
        tracing::debug!(
            target: "sync::reconciler",
            force_batch_number = event.force_batch_number,
            sequencer = ?event.sequencer,
            "recorded forced batch"
        );

        Ok(())
    }

    /// Returns the confirmed state root of the batch. Pending roots are never returned.
    pub(crate) async fn state_root_at(
        &self,
        batch_number: u64,
    ) -> Result<Option<B256>, DatabaseError> {
        self.db.get_state_root(batch_number).await
    }

    /// Splits the batches in `(last_verified, final_batch]` around the verification target by
    /// walking the sequences back from the final batch.
    pub(crate) async fn verification_timing(
        &self,
        final_batch: u64,
        last_verified: u64,
        target_timestamp: u64,
    ) -> Result<VerificationTiming, SequencingOrDatabaseError> {
        let mut current = final_batch;
        let mut above_target = 0;
        while current > last_verified {
            let batch = load_batch(self.db, current).await?;
            if batch.sequenced_timestamp > target_timestamp {
                current = batch.previous_last_batch_sequenced;
            } else {
                above_target = current - last_verified;
                break;
            }
        }

        let total = final_batch.saturating_sub(last_verified);
        Ok(VerificationTiming { above_target, below_target: total - above_target })
    }

    /// Returns the last sequenced batch. The genesis batch always exists once initialized.
    async fn last_batch(&self) -> EventResult<SequencedBatch> {
        Ok(self.db.get_last_batch().await?.ok_or(SequencingError::BatchNotFound(0))?)
    }

    /// Returns the forced batch, failing if it is missing or consumed.
    async fn unconsumed_forced_batch(&self, force_batch_number: u64) -> EventResult<ForcedBatch> {
        let forced = self
            .db
            .get_forced_batch(force_batch_number)
            .await?
            .ok_or(SequencingError::ForcedBatchNotFound(force_batch_number))?;
        if let Some(batch_number) = forced.consumed_by {
            return Err(
                SequencingError::ForcedBatchAlreadyConsumed { force_batch_number, batch_number }
                    .into(),
            );
        }
        Ok(forced)
    }

    /// Checks the number of batches of a sequence.
    fn check_sequence_len(&self, len: usize) -> Result<u64, SequencingError> {
        let count = len as u64;
        if count == 0 {
            return Err(SequencingError::ZeroBatches);
        }
        if count > self.config.max_verify_batches {
            return Err(SequencingError::ExceedMaxBatches {
                count,
                max: self.config.max_verify_batches,
            });
        }
        Ok(count)
    }
}

/// Recomputes the accumulated input hash of the batches in `[from, to]` and checks it against
/// the stored values.
pub(crate) async fn check_hash_chain<DB>(
    db: &DB,
    from: u64,
    to: u64,
) -> Result<(), SequencingOrDatabaseError>
where
    DB: DatabaseConnectionProvider + Sync,
{
    let from = from.max(1);
    let mut previous = load_batch(db, from - 1).await?.acc_input_hash;
    for batch_number in from..=to {
        let batch = load_batch(db, batch_number).await?;
        let computed = accumulate_input_hash(
            previous,
            batch.transactions_hash,
            batch.global_exit_root,
            batch.timestamp,
            batch.coinbase,
        );
        if computed != batch.acc_input_hash {
            return Err(SequencingError::AccInputHashMismatch {
                batch_number,
                stored: batch.acc_input_hash,
                computed,
            }
            .into());
        }
        previous = computed;
    }

    Ok(())
}

async fn load_batch<DB>(
    db: &DB,
    batch_number: u64,
) -> Result<SequencedBatch, SequencingOrDatabaseError>
where
    DB: DatabaseConnectionProvider + Sync,
{
    Ok(db.get_batch(batch_number).await?.ok_or(SequencingError::BatchNotFound(batch_number))?)
}

/// Checks the last batch number emitted by a sequencing event.
const fn check_last_batch_number(expected: u64, emitted: u64) -> Result<(), SequencingError> {
    if expected != emitted {
        return Err(SequencingError::BatchNumberMismatch { expected, emitted });
    }
    Ok(())
}

/// An error of a ledger read that can fail on integrity or storage.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SequencingOrDatabaseError {
    /// The ledger is inconsistent.
    #[error(transparent)]
    Sequencing(#[from] SequencingError),
    /// The database failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<SequencingOrDatabaseError> for crate::ReconcileError {
    fn from(error: SequencingOrDatabaseError) -> Self {
        match error {
            SequencingOrDatabaseError::Sequencing(error) => Self::Sequencing(error),
            SequencingOrDatabaseError::Database(error) => Self::Database(error),
        }
    }
}

impl From<SequencingOrDatabaseError> for crate::QueryError {
    fn from(error: SequencingOrDatabaseError) -> Self {
        match error {
            SequencingOrDatabaseError::Sequencing(error) => Self::Integrity(error),
            SequencingOrDatabaseError::Database(error) => Self::Database(error),
        }
    }
}
