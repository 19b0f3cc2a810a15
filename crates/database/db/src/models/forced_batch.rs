use alloy_primitives::{Address, B256};
use rollup_sync_primitives::ForcedBatch;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a forced batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "forced_batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub(crate) force_batch_number: i64,
    transactions_hash: Vec<u8>,
    global_exit_root: Vec<u8>,
    min_forced_timestamp: i64,
    sequencer: Vec<u8>,
    block_number: i64,
    consumed_by_batch: Option<i64>,
    consumed_block_number: Option<i64>,
}

/// The relation for the forced batch model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the forced batch model.
impl ActiveModelBehavior for ActiveModel {}

impl From<ForcedBatch> for ActiveModel {
    fn from(forced: ForcedBatch) -> Self {
        Self {
            force_batch_number: ActiveValue::Set(forced.force_batch_number as i64),
            transactions_hash: ActiveValue::Set(forced.transactions_hash.to_vec()),
            global_exit_root: ActiveValue::Set(forced.global_exit_root.to_vec()),
            min_forced_timestamp: ActiveValue::Set(forced.min_forced_timestamp as i64),
            sequencer: ActiveValue::Set(forced.sequencer.to_vec()),
            block_number: ActiveValue::Set(forced.block_number as i64),
            consumed_by_batch: ActiveValue::Set(forced.consumed_by.map(|n| n as i64)),
            consumed_block_number: ActiveValue::Set(
                forced.consumed_by.map(|_| forced.block_number as i64),
            ),
        }
    }
}

impl From<Model> for ForcedBatch {
    fn from(value: Model) -> Self {
        Self {
            force_batch_number: value.force_batch_number as u64,
            transactions_hash: B256::from_slice(&value.transactions_hash),
            global_exit_root: B256::from_slice(&value.global_exit_root),
            min_forced_timestamp: value.min_forced_timestamp as u64,
            sequencer: Address::from_slice(&value.sequencer),
            block_number: value.block_number as u64,
            consumed_by: value.consumed_by_batch.map(|n| n as u64),
        }
    }
}
