use super::HASH_LENGTH;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Pending state numbers restart from one after every reset, so rows are keyed by a
        // surrogate id and retired rows keep their invalidation block.
        manager
            .create_table(
                Table::create()
                    .table(PendingState::Table)
                    .if_not_exists()
                    .col(pk_auto(PendingState::Id))
                    .col(big_unsigned(PendingState::PendingStateNumber))
                    .col(big_unsigned(PendingState::Timestamp))
                    .col(big_unsigned(PendingState::LastVerifiedBatch))
                    .col(binary_len(PendingState::ExitRoot, HASH_LENGTH))
                    .col(binary_len(PendingState::StateRoot, HASH_LENGTH))
                    .col(big_unsigned(PendingState::BlockNumber))
                    .col(big_unsigned_null(PendingState::ConsolidatedBlockNumber))
                    .col(big_unsigned_null(PendingState::InvalidatedBlockNumber))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PendingState::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum PendingState {
    Table,
    Id,
    PendingStateNumber,
    Timestamp,
    LastVerifiedBatch,
    ExitRoot,
    StateRoot,
    BlockNumber,
    ConsolidatedBlockNumber,
    InvalidatedBlockNumber,
}
