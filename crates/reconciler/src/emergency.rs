use crate::BlockContext;

use rollup_sync_db::{DatabaseConnectionProvider, DatabaseError, DatabaseOperations};
use rollup_sync_primitives::EmergencyState;

/// Tracks the emergency state of the rollup. While halted, every event that mutates the batch or
/// pending state ledgers is rejected.
#[derive(Debug)]
pub(crate) struct HaltMonitor<'a, DB> {
    db: &'a DB,
}

impl<'a, DB> HaltMonitor<'a, DB>
where
    DB: DatabaseConnectionProvider + Sync,
{
    /// Returns a new [`HaltMonitor`] over the database.
    pub(crate) const fn new(db: &'a DB) -> Self {
        Self { db }
    }

    /// Returns true if the emergency state is active.
    pub(crate) async fn is_halted(&self) -> Result<bool, DatabaseError> {
        Ok(self.state().await?.is_active)
    }

    /// Returns the current [`EmergencyState`].
    pub(crate) async fn state(&self) -> Result<EmergencyState, DatabaseError> {
        self.db.get_emergency_state().await
    }

    /// Transitions between the normal and halted states. Activation records the batch at which
    /// the emergency was raised. Redundant transitions are ignored.
    pub(crate) async fn set_halted(
        &self,
        halted: bool,
        at_batch: u64,
        ctx: &BlockContext,
    ) -> Result<(), DatabaseError> {
        let current = self.state().await?;
        if current.is_active == halted {
            tracing::info!(
                target: "sync::reconciler",
                halted,
                block_number = ctx.number(),
                "emergency state unchanged"
            );
            return Ok(());
        }

        let state =
            if halted { EmergencyState::activated(at_batch) } else { EmergencyState::default() };
        self.db.upsert_emergency_state(ctx.number(), state).await?;

        if halted {
            tracing::warn!(
                target: "sync::reconciler",
                at_batch,
                block_number = ctx.number(),
                "emergency state activated"
            );
        } else {
            tracing::info!(
                target: "sync::reconciler",
                block_number = ctx.number(),
                "emergency state deactivated"
            );
        }
        Ok(())
    }
}
