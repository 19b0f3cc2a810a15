use super::{
    m20250701_000002_create_batch_tables::{Batch, ForcedBatch},
    m20250701_000003_create_pending_state_table::PendingState,
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// The indexes used by the rollback queries, which filter on the L1 block that created or
/// updated a row.
const INDEXES: [(&str, &str); 8] = [
    ("idx_batch_block_number", "batch"),
    ("idx_batch_verified_block_number", "batch"),
    ("idx_forced_batch_block_number", "forced_batch"),
    ("idx_forced_batch_consumed_block_number", "forced_batch"),
    ("idx_pending_state_number", "pending_state"),
    ("idx_pending_state_block_number", "pending_state"),
    ("idx_pending_state_consolidated_block_number", "pending_state"),
    ("idx_pending_state_invalidated_block_number", "pending_state"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create indexes for the `batch` table.
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[0].0)
                    .col(Batch::BlockNumber)
                    .table(Batch::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[1].0)
                    .col(Batch::VerifiedBlockNumber)
                    .table(Batch::Table)
                    .to_owned(),
            )
            .await?;

        // Create indexes for the `forced_batch` table.
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[2].0)
                    .col(ForcedBatch::BlockNumber)
                    .table(ForcedBatch::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[3].0)
                    .col(ForcedBatch::ConsumedBlockNumber)
                    .table(ForcedBatch::Table)
                    .to_owned(),
            )
            .await?;

        // Create indexes for the `pending_state` table.
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[4].0)
                    .col(PendingState::PendingStateNumber)
                    .table(PendingState::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[5].0)
                    .col(PendingState::BlockNumber)
                    .table(PendingState::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[6].0)
                    .col(PendingState::ConsolidatedBlockNumber)
                    .table(PendingState::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name(INDEXES[7].0)
                    .col(PendingState::InvalidatedBlockNumber)
                    .table(PendingState::Table)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in INDEXES {
            manager.drop_index(Index::drop().name(name).table(Alias::new(table)).to_owned()).await?;
        }
        Ok(())
    }
}
