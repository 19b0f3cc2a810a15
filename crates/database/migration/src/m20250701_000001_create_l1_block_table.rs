use super::HASH_LENGTH;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The L1 blocks applied to the ledger, used to detect reorgs.
        manager
            .create_table(
                Table::create()
                    .table(L1Block::Table)
                    .if_not_exists()
                    .col(big_unsigned(L1Block::BlockNumber).not_null().primary_key())
                    .col(binary_len(L1Block::BlockHash, HASH_LENGTH))
                    .col(binary_len(L1Block::ParentHash, HASH_LENGTH))
                    .col(big_unsigned(L1Block::BlockTimestamp))
                    .to_owned(),
            )
            .await?;

        // The single row tracking the last applied block and any unfinished rollback.
        manager
            .create_table(
                Table::create()
                    .table(SyncWatermark::Table)
                    .if_not_exists()
                    .col(integer(SyncWatermark::Id).not_null().primary_key())
                    .col(big_unsigned(SyncWatermark::LastBlockNumber))
                    .col(binary_len(SyncWatermark::LastBlockHash, HASH_LENGTH))
                    .col(big_unsigned(SyncWatermark::GenesisBlockNumber))
                    .col(big_unsigned_null(SyncWatermark::RollbackTarget))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(SyncWatermark::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(L1Block::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum L1Block {
    Table,
    BlockNumber,
    BlockHash,
    ParentHash,
    BlockTimestamp,
}

#[derive(DeriveIden)]
enum SyncWatermark {
    Table,
    Id,
    LastBlockNumber,
    LastBlockHash,
    GenesisBlockNumber,
    RollbackTarget,
}
