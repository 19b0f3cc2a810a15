use super::{models, DatabaseError};
use crate::{models::sync_watermark::WATERMARK_ID, DatabaseConnectionProvider, SyncWatermark};

use alloy_primitives::B256;
use rollup_sync_primitives::{
    EmergencyState, ForcedBatch, L1BlockHeader, PendingState, RollupParameters, SequencedBatch,
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Iterable, QueryFilter, QueryOrder,
};

/// Converts a number into its storage representation.
fn to_db(number: u64) -> Result<i64, DatabaseError> {
    i64::try_from(number).map_err(|_| DatabaseError::OutOfRange(number))
}

/// The [`DatabaseOperations`] trait provides methods for interacting with the database.
#[async_trait::async_trait]
pub trait DatabaseOperations: DatabaseConnectionProvider {
    /// Get the [`SyncWatermark`] if the ledger was initialized.
    async fn get_sync_watermark(&self) -> Result<Option<SyncWatermark>, DatabaseError> {
        Ok(models::sync_watermark::Entity::find_by_id(WATERMARK_ID)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Insert or replace the [`SyncWatermark`].
    async fn upsert_sync_watermark(&self, watermark: SyncWatermark) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            last_block = %watermark.last_block,
            rollback_target = ?watermark.rollback_target,
            "Updating sync watermark."
        );
        let watermark: models::sync_watermark::ActiveModel = watermark.into();
        models::sync_watermark::Entity::insert(watermark)
            .on_conflict(
                OnConflict::column(models::sync_watermark::Column::Id)
                    .update_columns(
                        models::sync_watermark::Column::iter()
                            .filter(|c| !matches!(c, models::sync_watermark::Column::Id)),
                    )
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Insert an applied [`L1BlockHeader`] into the database.
    async fn insert_l1_block(&self, header: L1BlockHeader) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            block_number = header.number,
            block_hash = ?header.hash,
            "Inserting L1 block into database."
        );
        let header: models::l1_block::ActiveModel = header.into();
        header.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the applied [`L1BlockHeader`] at the provided block number.
    async fn get_l1_block(
        &self,
        block_number: u64,
    ) -> Result<Option<L1BlockHeader>, DatabaseError> {
        Ok(models::l1_block::Entity::find_by_id(to_db(block_number)?)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Insert a [`SequencedBatch`] into the database.
    async fn insert_batch(&self, batch: SequencedBatch) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            batch_number = batch.batch_number,
            acc_input_hash = ?batch.acc_input_hash,
            "Inserting batch into database."
        );
        let batch: models::batch::ActiveModel = batch.into();
        batch.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get a [`SequencedBatch`] from the database by its batch number.
    async fn get_batch(&self, batch_number: u64) -> Result<Option<SequencedBatch>, DatabaseError> {
        Ok(models::batch::Entity::find_by_id(to_db(batch_number)?)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Get the last sequenced [`SequencedBatch`].
    async fn get_last_batch(&self) -> Result<Option<SequencedBatch>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .order_by_desc(models::batch::Column::BatchNumber)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Set the confirmed state root of a batch, verified in the provided L1 block.
    ///
    /// Errors if the batch is not found in the database.
    async fn set_batch_state_root(
        &self,
        batch_number: u64,
        state_root: B256,
        block_number: u64,
    ) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            batch_number,
            ?state_root,
            block_number,
            "Setting batch state root in database."
        );
        let result = models::batch::Entity::update_many()
            .col_expr(models::batch::Column::StateRoot, Expr::value(state_root.to_vec()))
            .col_expr(
                models::batch::Column::VerifiedBlockNumber,
                Expr::value(to_db(block_number)?),
            )
            .filter(models::batch::Column::BatchNumber.eq(to_db(batch_number)?))
            .exec(self.get_connection())
            .await?;

        if result.rows_affected == 0 {
            tracing::error!(
                target: "sync::db",
                batch_number,
                "Batch not found in DB when trying to set state root."
            );
            return Err(DatabaseError::BatchNotFound(batch_number));
        }
        Ok(())
    }

    /// Get the confirmed state root of a batch. Pending state roots are never returned.
    async fn get_state_root(&self, batch_number: u64) -> Result<Option<B256>, DatabaseError> {
        Ok(models::batch::Entity::find_by_id(to_db(batch_number)?)
            .one(self.get_connection())
            .await?
            .and_then(|batch| batch.state_root)
            .map(|root| B256::from_slice(&root)))
    }

    /// Get the last batch with a confirmed state root, zero if none.
    async fn get_last_verified_batch(&self) -> Result<u64, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(models::batch::Column::StateRoot.is_not_null())
            .order_by_desc(models::batch::Column::BatchNumber)
            .one(self.get_connection())
            .await?
            .map(|batch| batch.batch_number as u64)
            .unwrap_or_default())
    }

    /// Insert a [`ForcedBatch`] into the database.
    async fn insert_forced_batch(&self, forced_batch: ForcedBatch) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            force_batch_number = forced_batch.force_batch_number,
            "Inserting forced batch into database."
        );
        let forced_batch: models::forced_batch::ActiveModel = forced_batch.into();
        forced_batch.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get a [`ForcedBatch`] from the database by its number.
    async fn get_forced_batch(
        &self,
        force_batch_number: u64,
    ) -> Result<Option<ForcedBatch>, DatabaseError> {
        Ok(models::forced_batch::Entity::find_by_id(to_db(force_batch_number)?)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Get the number of the last forced batch, zero if none.
    async fn get_last_forced_batch_number(&self) -> Result<u64, DatabaseError> {
        Ok(models::forced_batch::Entity::find()
            .order_by_desc(models::forced_batch::Column::ForceBatchNumber)
            .one(self.get_connection())
            .await?
            .map(|forced| forced.force_batch_number as u64)
            .unwrap_or_default())
    }

    /// Get the number of the last sequenced forced batch, zero if none.
    async fn get_last_consumed_forced_batch_number(&self) -> Result<u64, DatabaseError> {
        Ok(models::forced_batch::Entity::find()
            .filter(models::forced_batch::Column::ConsumedByBatch.is_not_null())
            .order_by_desc(models::forced_batch::Column::ForceBatchNumber)
            .one(self.get_connection())
            .await?
            .map(|forced| forced.force_batch_number as u64)
            .unwrap_or_default())
    }

    /// Mark a forced batch as consumed by the provided batch in the provided L1 block.
    ///
    /// Errors if the forced batch is not found in the database.
    async fn consume_forced_batch(
        &self,
        force_batch_number: u64,
        batch_number: u64,
        block_number: u64,
    ) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            force_batch_number,
            batch_number,
            block_number,
            "Consuming forced batch in database."
        );
        let result = models::forced_batch::Entity::update_many()
            .col_expr(
                models::forced_batch::Column::ConsumedByBatch,
                Expr::value(to_db(batch_number)?),
            )
            .col_expr(
                models::forced_batch::Column::ConsumedBlockNumber,
                Expr::value(to_db(block_number)?),
            )
            .filter(models::forced_batch::Column::ForceBatchNumber.eq(to_db(force_batch_number)?))
            .exec(self.get_connection())
            .await?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::ForcedBatchNotFound(force_batch_number));
        }
        Ok(())
    }

    /// Insert a [`PendingState`] into the database.
    async fn insert_pending_state(&self, pending_state: PendingState) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            pending_state_number = pending_state.pending_state_number,
            last_verified_batch = pending_state.last_verified_batch,
            "Inserting pending state into database."
        );
        let pending_state: models::pending_state::ActiveModel = pending_state.into();
        pending_state.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the active (not invalidated) [`PendingState`] with the provided number.
    async fn get_active_pending_state(
        &self,
        pending_state_number: u64,
    ) -> Result<Option<PendingState>, DatabaseError> {
        Ok(models::pending_state::Entity::find()
            .filter(
                Condition::all()
                    .add(
                        models::pending_state::Column::PendingStateNumber
                            .eq(to_db(pending_state_number)?),
                    )
                    .add(models::pending_state::Column::InvalidatedBlockNumber.is_null()),
            )
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Get the active [`PendingState`] with the highest number.
    async fn get_last_pending_state(&self) -> Result<Option<PendingState>, DatabaseError> {
        Ok(models::pending_state::Entity::find()
            .filter(models::pending_state::Column::InvalidatedBlockNumber.is_null())
            .order_by_desc(models::pending_state::Column::PendingStateNumber)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Get the number of the last consolidated active pending state, zero if none.
    async fn get_last_consolidated_pending_state_number(&self) -> Result<u64, DatabaseError> {
        Ok(models::pending_state::Entity::find()
            .filter(
                Condition::all()
                    .add(models::pending_state::Column::InvalidatedBlockNumber.is_null())
                    .add(models::pending_state::Column::ConsolidatedBlockNumber.is_not_null()),
            )
            .order_by_desc(models::pending_state::Column::PendingStateNumber)
            .one(self.get_connection())
            .await?
            .map(|state| PendingState::from(state).pending_state_number)
            .unwrap_or_default())
    }

    /// Get the active pending states numbered above `since`, in ascending order.
    async fn get_active_pending_states(
        &self,
        since: u64,
    ) -> Result<Vec<PendingState>, DatabaseError> {
        Ok(models::pending_state::Entity::find()
            .filter(
                Condition::all()
                    .add(models::pending_state::Column::PendingStateNumber.gt(to_db(since)?))
                    .add(models::pending_state::Column::InvalidatedBlockNumber.is_null()),
            )
            .order_by_asc(models::pending_state::Column::PendingStateNumber)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Mark all active pending states up to and including `pending_state_number` as
    /// consolidated in the provided L1 block.
    async fn consolidate_pending_states(
        &self,
        pending_state_number: u64,
        block_number: u64,
    ) -> Result<u64, DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            pending_state_number,
            block_number,
            "Consolidating pending states in database."
        );
        Ok(models::pending_state::Entity::update_many()
            .col_expr(
                models::pending_state::Column::ConsolidatedBlockNumber,
                Expr::value(to_db(block_number)?),
            )
            .filter(
                Condition::all()
                    .add(
                        models::pending_state::Column::PendingStateNumber
                            .lte(to_db(pending_state_number)?),
                    )
                    .add(models::pending_state::Column::InvalidatedBlockNumber.is_null())
                    .add(models::pending_state::Column::ConsolidatedBlockNumber.is_null()),
            )
            .exec(self.get_connection())
            .await?
            .rows_affected)
    }

    /// Invalidate all active pending states numbered `from` and above in the provided L1 block.
    async fn invalidate_pending_states(
        &self,
        from: u64,
        block_number: u64,
    ) -> Result<u64, DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            from,
            block_number,
            "Invalidating pending states in database."
        );
        Ok(models::pending_state::Entity::update_many()
            .col_expr(
                models::pending_state::Column::InvalidatedBlockNumber,
                Expr::value(to_db(block_number)?),
            )
            .filter(
                Condition::all()
                    .add(models::pending_state::Column::PendingStateNumber.gte(to_db(from)?))
                    .add(models::pending_state::Column::InvalidatedBlockNumber.is_null()),
            )
            .exec(self.get_connection())
            .await?
            .rows_affected)
    }

    /// Get the current [`RollupParameters`].
    async fn get_rollup_parameters(&self) -> Result<Option<RollupParameters>, DatabaseError> {
        Ok(models::rollup_parameters::Entity::find()
            .order_by_desc(models::rollup_parameters::Column::BlockNumber)
            .one(self.get_connection())
            .await
            .map(|x| x.map(Into::into))?)
    }

    /// Insert or replace the [`RollupParameters`] as of the provided L1 block.
    async fn upsert_rollup_parameters(
        &self,
        block_number: u64,
        parameters: &RollupParameters,
    ) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            block_number,
            batch_fee = %parameters.batch_fee,
            "Updating rollup parameters in database."
        );
        let parameters: models::rollup_parameters::ActiveModel = (block_number, parameters).into();
        models::rollup_parameters::Entity::insert(parameters)
            .on_conflict(
                OnConflict::column(models::rollup_parameters::Column::BlockNumber)
                    .update_columns(
                        models::rollup_parameters::Column::iter().filter(|c| {
                            !matches!(c, models::rollup_parameters::Column::BlockNumber)
                        }),
                    )
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Get the current [`EmergencyState`], inactive if never set.
    async fn get_emergency_state(&self) -> Result<EmergencyState, DatabaseError> {
        Ok(models::emergency_state::Entity::find()
            .order_by_desc(models::emergency_state::Column::BlockNumber)
            .one(self.get_connection())
            .await?
            .map(Into::into)
            .unwrap_or_default())
    }

    /// Insert or replace the [`EmergencyState`] as of the provided L1 block.
    async fn upsert_emergency_state(
        &self,
        block_number: u64,
        state: EmergencyState,
    ) -> Result<(), DatabaseError> {
        tracing::trace!(
            target: "sync::db",
            block_number,
            is_active = state.is_active,
            "Updating emergency state in database."
        );
        let state: models::emergency_state::ActiveModel = (block_number, state).into();
        models::emergency_state::Entity::insert(state)
            .on_conflict(
                OnConflict::column(models::emergency_state::Column::BlockNumber)
                    .update_columns([
                        models::emergency_state::Column::IsActive,
                        models::emergency_state::Column::ActivatedAtBatch,
                    ])
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Unwinds the ledger to the provided L1 block number: every row created after it is
    /// deleted and every fact recorded after it is cleared.
    async fn unwind(&self, block_number: u64) -> Result<(), DatabaseError> {
        tracing::trace!(target: "sync::db", block_number, "Unwinding ledger.");
        let n = to_db(block_number)?;
        let conn = self.get_connection();

        models::l1_block::Entity::delete_many()
            .filter(models::l1_block::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;

        models::batch::Entity::delete_many()
            .filter(models::batch::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;
        models::batch::Entity::update_many()
            .col_expr(models::batch::Column::StateRoot, Expr::value(Option::<Vec<u8>>::None))
            .col_expr(models::batch::Column::VerifiedBlockNumber, Expr::value(Option::<i64>::None))
            .filter(models::batch::Column::VerifiedBlockNumber.gt(n))
            .exec(conn)
            .await?;

        models::forced_batch::Entity::delete_many()
            .filter(models::forced_batch::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;
        models::forced_batch::Entity::update_many()
            .col_expr(
                models::forced_batch::Column::ConsumedByBatch,
                Expr::value(Option::<i64>::None),
            )
            .col_expr(
                models::forced_batch::Column::ConsumedBlockNumber,
                Expr::value(Option::<i64>::None),
            )
            .filter(models::forced_batch::Column::ConsumedBlockNumber.gt(n))
            .exec(conn)
            .await?;

        models::pending_state::Entity::delete_many()
            .filter(models::pending_state::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;
        models::pending_state::Entity::update_many()
            .col_expr(
                models::pending_state::Column::ConsolidatedBlockNumber,
                Expr::value(Option::<i64>::None),
            )
            .filter(models::pending_state::Column::ConsolidatedBlockNumber.gt(n))
            .exec(conn)
            .await?;
        models::pending_state::Entity::update_many()
            .col_expr(
                models::pending_state::Column::InvalidatedBlockNumber,
                Expr::value(Option::<i64>::None),
            )
            .filter(models::pending_state::Column::InvalidatedBlockNumber.gt(n))
            .exec(conn)
            .await?;

        models::rollup_parameters::Entity::delete_many()
            .filter(models::rollup_parameters::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;
        models::emergency_state::Entity::delete_many()
            .filter(models::emergency_state::Column::BlockNumber.gt(n))
            .exec(conn)
            .await?;

        Ok(())
    }
}

impl<T> DatabaseOperations for T where T: DatabaseConnectionProvider {}
