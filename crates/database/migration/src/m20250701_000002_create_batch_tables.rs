use super::{ADDRESS_LENGTH, HASH_LENGTH};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batch::Table)
                    .if_not_exists()
                    .col(big_unsigned(Batch::BatchNumber).not_null().primary_key())
                    .col(binary_len(Batch::AccInputHash, HASH_LENGTH))
                    .col(binary_len(Batch::TransactionsHash, HASH_LENGTH))
                    .col(binary_len(Batch::GlobalExitRoot, HASH_LENGTH))
                    .col(big_unsigned(Batch::Timestamp))
                    .col(big_unsigned(Batch::SequencedTimestamp))
                    .col(big_unsigned(Batch::PreviousLastBatchSequenced))
                    .col(binary_len(Batch::Coinbase, ADDRESS_LENGTH))
                    .col(big_unsigned_null(Batch::ForcedBatchNumber))
                    .col(big_unsigned(Batch::BlockNumber))
                    .col(binary_len_null(Batch::StateRoot, HASH_LENGTH))
                    .col(big_unsigned_null(Batch::VerifiedBlockNumber))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ForcedBatch::Table)
                    .if_not_exists()
                    .col(big_unsigned(ForcedBatch::ForceBatchNumber).not_null().primary_key())
                    .col(binary_len(ForcedBatch::TransactionsHash, HASH_LENGTH))
                    .col(binary_len(ForcedBatch::GlobalExitRoot, HASH_LENGTH))
                    .col(big_unsigned(ForcedBatch::MinForcedTimestamp))
                    .col(binary_len(ForcedBatch::Sequencer, ADDRESS_LENGTH))
                    .col(big_unsigned(ForcedBatch::BlockNumber))
                    .col(big_unsigned_null(ForcedBatch::ConsumedByBatch))
                    .col(big_unsigned_null(ForcedBatch::ConsumedBlockNumber))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ForcedBatch::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Batch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Batch {
    Table,
    BatchNumber,
    AccInputHash,
    TransactionsHash,
    GlobalExitRoot,
    Timestamp,
    SequencedTimestamp,
    PreviousLastBatchSequenced,
    Coinbase,
    ForcedBatchNumber,
    BlockNumber,
    StateRoot,
    VerifiedBlockNumber,
}

#[derive(DeriveIden)]
pub(crate) enum ForcedBatch {
    Table,
    ForceBatchNumber,
    TransactionsHash,
    GlobalExitRoot,
    MinForcedTimestamp,
    Sequencer,
    BlockNumber,
    ConsumedByBatch,
    ConsumedBlockNumber,
}
