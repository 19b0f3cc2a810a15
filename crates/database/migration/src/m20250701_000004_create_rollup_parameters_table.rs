use super::{ADDRESS_LENGTH, HASH_LENGTH};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Both tables hold one row per L1 block that changed them, the newest row is current.
        manager
            .create_table(
                Table::create()
                    .table(RollupParameters::Table)
                    .if_not_exists()
                    .col(big_unsigned(RollupParameters::BlockNumber).not_null().primary_key())
                    .col(binary_len(RollupParameters::BatchFee, HASH_LENGTH))
                    .col(integer(RollupParameters::MultiplierBatchFee))
                    .col(big_unsigned(RollupParameters::VerifyBatchTimeTarget))
                    .col(big_unsigned(RollupParameters::PendingStateTimeout))
                    .col(big_unsigned(RollupParameters::TrustedAggregatorTimeout))
                    .col(big_unsigned(RollupParameters::ForceBatchTimeout))
                    .col(big_unsigned(RollupParameters::LastTimestamp))
                    .col(binary_len(RollupParameters::TrustedSequencer, ADDRESS_LENGTH))
                    .col(string(RollupParameters::TrustedSequencerUrl))
                    .col(binary_len(RollupParameters::TrustedAggregator, ADDRESS_LENGTH))
                    .col(binary_len(RollupParameters::Admin, ADDRESS_LENGTH))
                    .col(binary_len(RollupParameters::PendingAdmin, ADDRESS_LENGTH))
                    .col(binary_len(RollupParameters::Owner, ADDRESS_LENGTH))
                    .col(boolean(RollupParameters::IsForcedBatchDisallowed))
                    .col(big_unsigned(RollupParameters::ForkId))
                    .col(string(RollupParameters::Version))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmergencyState::Table)
                    .if_not_exists()
                    .col(big_unsigned(EmergencyState::BlockNumber).not_null().primary_key())
                    .col(boolean(EmergencyState::IsActive))
                    .col(big_unsigned_null(EmergencyState::ActivatedAtBatch))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EmergencyState::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RollupParameters::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum RollupParameters {
    Table,
    BlockNumber,
    BatchFee,
    MultiplierBatchFee,
    VerifyBatchTimeTarget,
    PendingStateTimeout,
    TrustedAggregatorTimeout,
    ForceBatchTimeout,
    LastTimestamp,
    TrustedSequencer,
    TrustedSequencerUrl,
    TrustedAggregator,
    Admin,
    PendingAdmin,
    Owner,
    IsForcedBatchDisallowed,
    ForkId,
    Version,
}

#[derive(DeriveIden)]
enum EmergencyState {
    Table,
    BlockNumber,
    IsActive,
    ActivatedAtBatch,
}
