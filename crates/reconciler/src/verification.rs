//! Verification of batches and proofs against pending states.

use crate::{
    error::{EventResult, VerificationError},
    fee::adjust_batch_fee,
    pending::PendingStateLedger,
    sequencing::BatchLedger,
    BlockContext, ReconcilerConfig,
};

use alloy_primitives::B256;
use rollup_sync_db::{DatabaseConnectionProvider, DatabaseOperations};
use rollup_sync_primitives::{PendingStateProof, RollupParameters, VerifyBatches};

/// Applies verifications of batches to the batch and pending state ledgers.
#[derive(Debug)]
pub(crate) struct Verifier<'a, DB> {
    db: &'a DB,
    config: &'a ReconcilerConfig,
}

impl<'a, DB> Verifier<'a, DB>
where
    DB: DatabaseConnectionProvider + Sync,
{
    /// Returns a new [`Verifier`] over the database.
    pub(crate) const fn new(db: &'a DB, config: &'a ReconcilerConfig) -> Self {
        Self { db, config }
    }

    const fn batches(&self) -> BatchLedger<'a, DB> {
        BatchLedger::new(self.db, self.config)
    }

    const fn pending(&self) -> PendingStateLedger<'a, DB> {
        PendingStateLedger::new(self.db)
    }

    /// Applies a permissionless verification. The batch fee is adjusted and the new root is
    /// proposed as a pending state, or committed when the pending state timeout is zero.
    pub(crate) async fn verify_batches(
        &self,
        event: &VerifyBatches,
        ctx: &BlockContext,
        parameters: &mut RollupParameters,
    ) -> EventResult<()> {
        let final_batch = event.final_batch_number;
        let last_sequenced = self.last_sequenced_batch().await?;
        let sequenced = self
            .db
            .get_batch(final_batch)
            .await?
            .ok_or(VerificationError::FinalBatchNotSequenced { final_batch, last_sequenced })?;
        if sequenced.sequenced_timestamp.saturating_add(parameters.trusted_aggregator_timeout) >
            ctx.now()
        {
            return Err(VerificationError::TrustedAggregatorTimeoutNotExpired(final_batch).into());
        }

        let count = final_batch.saturating_sub(event.init_batch_number);
        if count > self.config.max_verify_batches {
            return Err(VerificationError::ExceedMaxVerifyBatches {
                count,
                max: self.config.max_verify_batches,
            }
            .into());
        }

        let last_verified = self.check_transition(event, last_sequenced).await?;

        let target = ctx.now().saturating_sub(parameters.verify_batch_time_target);
        let timing = self.batches().verification_timing(final_batch, last_verified, target).await?;
        let batch_fee = adjust_batch_fee(
            parameters.batch_fee,
            parameters.multiplier_batch_fee,
            timing,
            &self.config.fee,
        );
        tracing::debug!(
            target: "sync::reconciler",
            above_target = timing.above_target,
            below_target = timing.below_target,
            old_fee = %parameters.batch_fee,
            new_fee = %batch_fee,
            "adjusted batch fee"
        );
        parameters.batch_fee = batch_fee;

        if parameters.pending_state_timeout == 0 {
            self.commit_root(final_batch, event.new_state_root, ctx).await?;
        } else {
            self.pending().propose(event, ctx).await?;
        }

        Ok(())
    }

    /// Applies a verification by the trusted aggregator, committing the new root immediately.
    pub(crate) async fn verify_batches_trusted(
        &self,
        event: &VerifyBatches,
        ctx: &BlockContext,
    ) -> EventResult<()> {
        let last_sequenced = self.last_sequenced_batch().await?;
        self.check_transition(event, last_sequenced).await?;
        self.commit_root(event.final_batch_number, event.new_state_root, ctx).await
    }

    /// Applies an override of a pending state by the trusted aggregator. Aggregation is halted for
    /// everyone else afterwards.
    pub(crate) async fn override_pending_state(
        &self,
        proof: &PendingStateProof,
        ctx: &BlockContext,
        parameters: &mut RollupParameters,
    ) -> EventResult<()> {
        self.prove_distinct_pending_state(proof).await?;
        self.replace_pending_state(proof, ctx).await?;
        parameters.trusted_aggregator_timeout = self.config.halt_aggregation_timeout;
        Ok(())
    }

    /// Applies a proof that a pending state is non-deterministic.
    pub(crate) async fn prove_non_deterministic(
        &self,
        proof: &PendingStateProof,
        ctx: &BlockContext,
    ) -> EventResult<()> {
        self.prove_distinct_pending_state(proof).await?;
        self.replace_pending_state(proof, ctx).await
    }

    /// Checks the init and final batches of a verification. Returns the last verified batch,
    /// counting pending states.
    async fn check_transition(
        &self,
        event: &VerifyBatches,
        last_sequenced: u64,
    ) -> EventResult<u64> {
        let last_verified = self.pending().last_verified_batch_including_pending().await?;
        let init_batch = event.init_batch_number;

        if event.init_pending_state_number != 0 {
            self.check_init_pending_state(event.init_pending_state_number, init_batch).await?;
        } else {
            if init_batch > last_verified {
                return Err(
                    VerificationError::InitBatchAboveLastVerified { init_batch, last_verified }
                        .into(),
                );
            }
            self.check_init_root(init_batch).await?;
        }

        let final_batch = event.final_batch_number;
        if final_batch <= last_verified {
            return Err(
                VerificationError::FinalBatchBelowLastVerified { final_batch, last_verified }.into()
            );
        }
        if final_batch > last_sequenced {
            return Err(
                VerificationError::FinalBatchNotSequenced { final_batch, last_sequenced }.into()
            );
        }

        Ok(last_verified)
    }

    /// Checks that a proof contradicts an unconsolidated pending state.
    async fn prove_distinct_pending_state(&self, proof: &PendingStateProof) -> EventResult<()> {
        let init_batch = proof.init_batch_number;
        if proof.init_pending_state_number != 0 {
            self.check_init_pending_state(proof.init_pending_state_number, init_batch).await?;
        } else {
            let last_verified = self.db.get_last_verified_batch().await?;
            if init_batch > last_verified {
                return Err(
                    VerificationError::InitBatchAboveLastVerified { init_batch, last_verified }
                        .into(),
                );
            }
            self.check_init_root(init_batch).await?;
        }

        let pending = self.pending();
        let last_pending_state = pending.last_pending_state_number().await?;
        let last_consolidated = pending.last_consolidated_number().await?;
        let final_pending_state = proof.final_pending_state_number;
        if final_pending_state <= proof.init_pending_state_number ||
            final_pending_state > last_pending_state ||
            final_pending_state <= last_consolidated
        {
            return Err(VerificationError::FinalPendingStateInvalid {
                init_pending_state: proof.init_pending_state_number,
                final_pending_state,
                last_pending_state,
                last_consolidated,
            }
            .into());
        }

        let final_state = pending
            .get(final_pending_state)
            .await?
            .ok_or(VerificationError::PendingStateDoesNotExist(final_pending_state))?;
        if final_state.last_verified_batch != proof.final_batch_number {
            return Err(VerificationError::FinalBatchDoesNotMatchPendingState {
                final_batch: proof.final_batch_number,
                pending_batch: final_state.last_verified_batch,
            }
            .into());
        }
        if final_state.state_root == proof.new_state_root {
            return Err(VerificationError::StoredRootMustBeDifferent(final_pending_state).into());
        }

        Ok(())
    }

    /// Invalidates the contradicted pending state and those after it, retires the rest and
    /// commits the proven root.
    async fn replace_pending_state(
        &self,
        proof: &PendingStateProof,
        ctx: &BlockContext,
    ) -> EventResult<()> {
        let pending = self.pending();
        pending.invalidate_from(proof.final_pending_state_number, ctx).await?;
        pending.reset(ctx).await?;
        self.db
            .set_batch_state_root(proof.final_batch_number, proof.new_state_root, ctx.number())
            .await?;

        tracing::debug!(
            target: "sync::reconciler",
            pending_state_number = proof.final_pending_state_number,
            batch_number = proof.final_batch_number,
            state_root = ?proof.new_state_root,
            "replaced pending state"
        );
        Ok(())
    }

    async fn check_init_pending_state(
        &self,
        init_pending_state: u64,
        init_batch: u64,
    ) -> EventResult<()> {
        let state = self
            .pending()
            .get(init_pending_state)
            .await?
            .ok_or(VerificationError::PendingStateDoesNotExist(init_pending_state))?;
        if state.last_verified_batch != init_batch {
            return Err(VerificationError::InitBatchDoesNotMatchPendingState {
                init_batch,
                pending_batch: state.last_verified_batch,
            }
            .into());
        }
        Ok(())
    }

    async fn check_init_root(&self, init_batch: u64) -> EventResult<B256> {
        Ok(self
            .batches()
            .state_root_at(init_batch)
            .await?
            .ok_or(VerificationError::OldStateRootDoesNotExist(init_batch))?)
    }

    /// Commits the root at the batch and retires every pending state.
    async fn commit_root(
        &self,
        batch_number: u64,
        state_root: B256,
        ctx: &BlockContext,
    ) -> EventResult<()> {
        self.db.set_batch_state_root(batch_number, state_root, ctx.number()).await?;
        self.pending().reset(ctx).await?;

        tracing::debug!(
            target: "sync::reconciler",
            batch_number,
            ?state_root,
            "committed state root"
        );
        Ok(())
    }

    async fn last_sequenced_batch(&self) -> EventResult<u64> {
        Ok(self.db.get_last_batch().await?.map(|batch| batch.batch_number).unwrap_or_default())
    }
}
