//! The pending state ledger of permissionless verifications.

use crate::{
    error::{EventResult, PendingStateError, Rejection},
    BlockContext,
};

use rollup_sync_db::{DatabaseConnectionProvider, DatabaseError, DatabaseOperations};
use rollup_sync_primitives::{
    ConsolidatePendingState, PendingState, RollupParameters, VerifyBatches,
};

/// The ledger of pending states. Active pending states are numbered contiguously from 1, numbers
/// restart after every reset.
#[derive(Debug)]
pub(crate) struct PendingStateLedger<'a, DB> {
    db: &'a DB,
}

impl<'a, DB> PendingStateLedger<'a, DB>
where
    DB: DatabaseConnectionProvider + Sync,
{
    /// Returns a new [`PendingStateLedger`] over the database.
    pub(crate) const fn new(db: &'a DB) -> Self {
        Self { db }
    }

    /// Proposes a new pending state for the verification and returns it.
    pub(crate) async fn propose(
        &self,
        event: &VerifyBatches,
        ctx: &BlockContext,
    ) -> Result<PendingState, DatabaseError> {
        let pending_state = PendingState {
            pending_state_number: self.last_pending_state_number().await? + 1,
            timestamp: ctx.now(),
            last_verified_batch: event.final_batch_number,
            exit_root: event.new_local_exit_root,
            state_root: event.new_state_root,
            consolidated: false,
            block_number: ctx.number(),
        };
        self.db.insert_pending_state(pending_state).await?;

        tracing::debug!(
            target: "sync::reconciler",
            pending_state_number = pending_state.pending_state_number,
            last_verified_batch = pending_state.last_verified_batch,
            "proposed pending state"
        );
        Ok(pending_state)
    }

    /// Consolidates the pending state named by the event along with every earlier one, committing
    /// its state root. Returns the number of pending states consolidated.
    pub(crate) async fn consolidate(
        &self,
        event: &ConsolidatePendingState,
        ctx: &BlockContext,
        parameters: &RollupParameters,
    ) -> EventResult<u64> {
        let pending_state_number = event.pending_state_number;
        let state = self
            .db
            .get_active_pending_state(pending_state_number)
            .await?
            .ok_or(PendingStateError::NotFound(pending_state_number))?;

        if state.last_verified_batch != event.batch_number {
            return Err(PendingStateError::BatchMismatch {
                pending_state_number,
                stored: state.last_verified_batch,
                emitted: event.batch_number,
            }
            .into());
        }
        if state.state_root != event.state_root {
            return Err(PendingStateError::StateRootMismatch {
                pending_state_number,
                stored: state.state_root,
                emitted: event.state_root,
            }
            .into());
        }

        if state.consolidated {
            tracing::debug!(
                target: "sync::reconciler",
                pending_state_number,
                "pending state already consolidated"
            );
            return Ok(0);
        }

        let is_trusted = event.sender == parameters.trusted_aggregator;
        if !is_trusted && !state.is_consolidable(ctx.now(), parameters.pending_state_timeout) {
            return Err(Rejection::PendingStateNotConsolidable {
                pending_state_number,
                consolidable_at: state.timestamp.saturating_add(parameters.pending_state_timeout),
            }
            .into());
        }

        let consolidated =
            self.db.consolidate_pending_states(pending_state_number, ctx.number()).await?;
        self.db
            .set_batch_state_root(state.last_verified_batch, state.state_root, ctx.number())
            .await?;

        tracing::debug!(
            target: "sync::reconciler",
            pending_state_number,
            consolidated,
            batch_number = state.last_verified_batch,
            "consolidated pending state"
        );
        Ok(consolidated)
    }

    /// Invalidates every active pending state numbered `from` and above.
    pub(crate) async fn invalidate_from(
        &self,
        from: u64,
        ctx: &BlockContext,
    ) -> Result<u64, DatabaseError> {
        let invalidated = self.db.invalidate_pending_states(from, ctx.number()).await?;
        if invalidated > 0 {
            tracing::debug!(
                target: "sync::reconciler",
                from,
                invalidated,
                "invalidated pending states"
            );
        }
        Ok(invalidated)
    }

    /// Retires every active pending state, consolidated or not.
    pub(crate) async fn reset(&self, ctx: &BlockContext) -> Result<u64, DatabaseError> {
        self.invalidate_from(1, ctx).await
    }

    /// Returns the number of the last active pending state, zero if none.
    pub(crate) async fn last_pending_state_number(&self) -> Result<u64, DatabaseError> {
        Ok(self
            .db
            .get_last_pending_state()
            .await?
            .map(|state| state.pending_state_number)
            .unwrap_or_default())
    }

    /// Returns the number of the last consolidated pending state, zero if none.
    pub(crate) async fn last_consolidated_number(&self) -> Result<u64, DatabaseError> {
        self.db.get_last_consolidated_pending_state_number().await
    }

    /// Returns the active pending state.
    pub(crate) async fn get(
        &self,
        pending_state_number: u64,
    ) -> Result<Option<PendingState>, DatabaseError> {
        self.db.get_active_pending_state(pending_state_number).await
    }

    /// Returns the last verified batch, counting the batches of pending states.
    pub(crate) async fn last_verified_batch_including_pending(&self) -> Result<u64, DatabaseError> {
        match self.db.get_last_pending_state().await? {
            Some(state) => Ok(state.last_verified_batch),
            None => self.db.get_last_verified_batch().await,
        }
    }

    /// Returns true if the pending state is proposed, not consolidated and its timeout elapsed at
    /// `now`.
    pub(crate) async fn is_consolidable(
        &self,
        pending_state_number: u64,
        now: u64,
        pending_state_timeout: u64,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .db
            .get_active_pending_state(pending_state_number)
            .await?
            .is_some_and(|state| {
                !state.consolidated && state.is_consolidable(now, pending_state_timeout)
            }))
    }
}
