//! Rollback of the ledger on L1 reorgs.

use crate::{ReconcileError, Reconciler};

use alloy_primitives::B256;
use rollup_sync_db::{DatabaseOperations, SyncWatermark};
use rollup_sync_primitives::{BlockInfo, L1BlockEvents};
use rollup_sync_watcher::CanonicalChain;

impl<C: CanonicalChain> Reconciler<C> {
    /// Returns the last applied block that is still part of the canonical chain.
    ///
    /// The search starts at the last applied block and stops at the configured reorg depth or at
    /// the genesis block, whichever comes first. The parent hash of the delivered block is only
    /// trusted when the block extends the ledger.
    pub(crate) async fn find_common_ancestor(
        &self,
        block: &L1BlockEvents,
        last: BlockInfo,
    ) -> Result<BlockInfo, ReconcileError> {
        let extends_ledger = block.number() == last.number + 1;
        let lowest = last
            .number
            .saturating_sub(self.config.max_reorg_depth)
            .max(self.config.genesis.block.number);

        let mut number = last.number;
        while number >= lowest {
            let stored = self
                .database
                .get_l1_block(number)
                .await?
                .ok_or(ReconcileError::MissingL1Block(number))?;

            let canonical = if extends_ledger && number == last.number {
                Some(block.header.parent_hash)
            } else {
                self.canonical_block_hash(number).await?
            };

            if canonical == Some(stored.hash) {
                return Ok(stored.block_info());
            }
            tracing::trace!(
                target: "sync::reconciler",
                number,
                stored = ?stored.hash,
                ?canonical,
                "block not canonical"
            );

            if number == 0 {
                break;
            }
            number -= 1;
        }

        Err(ReconcileError::ReorgTooDeep { block: block.block_info(), searched_to: lowest })
    }

    /// Returns the hash of the canonical block at the provided number.
    pub(crate) async fn canonical_block_hash(
        &self,
        number: u64,
    ) -> Result<Option<B256>, ReconcileError> {
        self.chain
            .canonical_hash(number)
            .await
            .map_err(|err| ReconcileError::CanonicalChain(Box::new(err)))
    }

    /// Rolls the ledger back to the target block.
    pub(crate) async fn rollback(
        &mut self,
        mut watermark: SyncWatermark,
        target: u64,
    ) -> Result<SyncWatermark, ReconcileError> {
        watermark.rollback_target = Some(target);
        self.finish_rollback(watermark).await
    }

    /// Completes the rollback recorded in the watermark, if any.
    ///
    /// Blocks are undone newest first, one transaction per block. Each transaction also persists
    /// the watermark with the rollback target, so an interrupted rollback resumes where it
    /// stopped.
    pub(crate) async fn finish_rollback(
        &mut self,
        mut watermark: SyncWatermark,
    ) -> Result<SyncWatermark, ReconcileError> {
        let Some(target) = watermark.rollback_target else { return Ok(watermark) };
        tracing::info!(
            target: "sync::reconciler",
            from = %watermark.last_block,
            target,
            "rolling back ledger"
        );

        if watermark.last_block.number <= target {
            watermark.rollback_target = None;
            self.database.upsert_sync_watermark(watermark).await?;
            return Ok(watermark);
        }

        while watermark.last_block.number > target {
            let parent_number = watermark.last_block.number - 1;

            let tx = self.database.tx().await?;
            tx.unwind(parent_number).await?;
            let parent = tx
                .get_l1_block(parent_number)
                .await?
                .ok_or(ReconcileError::MissingL1Block(parent_number))?;
            watermark.last_block = parent.block_info();
            if parent_number == target {
                watermark.rollback_target = None;
            }
            tx.upsert_sync_watermark(watermark).await?;
            tx.commit().await?;

            tracing::debug!(
                target: "sync::reconciler",
                block = %watermark.last_block,
                "rolled back block"
            );
            self.metrics.record_rolled_back(parent_number);
        }

        Ok(watermark)
    }
}
