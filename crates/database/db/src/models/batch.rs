use alloy_primitives::{Address, B256};
use rollup_sync_primitives::SequencedBatch;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a sequenced batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub(crate) batch_number: i64,
    acc_input_hash: Vec<u8>,
    transactions_hash: Vec<u8>,
    global_exit_root: Vec<u8>,
    timestamp: i64,
    sequenced_timestamp: i64,
    previous_last_batch_sequenced: i64,
    coinbase: Vec<u8>,
    forced_batch_number: Option<i64>,
    block_number: i64,
    pub(crate) state_root: Option<Vec<u8>>,
    verified_block_number: Option<i64>,
}

/// The relation for the batch model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the batch model.
impl ActiveModelBehavior for ActiveModel {}

impl From<SequencedBatch> for ActiveModel {
    fn from(batch: SequencedBatch) -> Self {
        Self {
            batch_number: ActiveValue::Set(batch.batch_number as i64),
            acc_input_hash: ActiveValue::Set(batch.acc_input_hash.to_vec()),
            transactions_hash: ActiveValue::Set(batch.transactions_hash.to_vec()),
            global_exit_root: ActiveValue::Set(batch.global_exit_root.to_vec()),
            timestamp: ActiveValue::Set(batch.timestamp as i64),
            sequenced_timestamp: ActiveValue::Set(batch.sequenced_timestamp as i64),
            previous_last_batch_sequenced: ActiveValue::Set(
                batch.previous_last_batch_sequenced as i64,
            ),
            coinbase: ActiveValue::Set(batch.coinbase.to_vec()),
            forced_batch_number: ActiveValue::Set(batch.forced_batch_number.map(|n| n as i64)),
            block_number: ActiveValue::Set(batch.block_number as i64),
            // A batch inserted with a root is verified in the block that created it.
            state_root: ActiveValue::Set(batch.state_root.map(|r| r.to_vec())),
            verified_block_number: ActiveValue::Set(
                batch.state_root.map(|_| batch.block_number as i64),
            ),
        }
    }
}

impl From<Model> for SequencedBatch {
    fn from(value: Model) -> Self {
        Self {
            batch_number: value.batch_number as u64,
            acc_input_hash: B256::from_slice(&value.acc_input_hash),
            transactions_hash: B256::from_slice(&value.transactions_hash),
            global_exit_root: B256::from_slice(&value.global_exit_root),
            timestamp: value.timestamp as u64,
            sequenced_timestamp: value.sequenced_timestamp as u64,
            previous_last_batch_sequenced: value.previous_last_batch_sequenced as u64,
            coinbase: Address::from_slice(&value.coinbase),
            forced_batch_number: value.forced_batch_number.map(|n| n as u64),
            block_number: value.block_number as u64,
            state_root: value.state_root.map(|r| B256::from_slice(&r)),
        }
    }
}
