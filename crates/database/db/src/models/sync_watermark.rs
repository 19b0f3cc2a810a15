use alloy_primitives::B256;
use rollup_sync_primitives::BlockInfo;
use sea_orm::{entity::prelude::*, ActiveValue};

/// The id of the single watermark row.
pub(crate) const WATERMARK_ID: i32 = 0;

/// The progress of the synchronization with L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWatermark {
    /// The last L1 block applied to the ledger.
    pub last_block: BlockInfo,
    /// The L1 block the ledger was initialized at. The ledger cannot be rolled back past it.
    pub genesis_block_number: u64,
    /// The target of an unfinished rollback.
    pub rollback_target: Option<u64>,
}

/// A database model that represents the sync watermark.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_watermark")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    id: i32,
    last_block_number: i64,
    last_block_hash: Vec<u8>,
    genesis_block_number: i64,
    rollback_target: Option<i64>,
}

/// The relation for the sync watermark model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the sync watermark model.
impl ActiveModelBehavior for ActiveModel {}

impl From<SyncWatermark> for ActiveModel {
    fn from(watermark: SyncWatermark) -> Self {
        Self {
            id: ActiveValue::Set(WATERMARK_ID),
            last_block_number: ActiveValue::Set(watermark.last_block.number as i64),
            last_block_hash: ActiveValue::Set(watermark.last_block.hash.to_vec()),
            genesis_block_number: ActiveValue::Set(watermark.genesis_block_number as i64),
            rollback_target: ActiveValue::Set(watermark.rollback_target.map(|n| n as i64)),
        }
    }
}

impl From<Model> for SyncWatermark {
    fn from(value: Model) -> Self {
        Self {
            last_block: BlockInfo {
                number: value.last_block_number as u64,
                hash: B256::from_slice(&value.last_block_hash),
            },
            genesis_block_number: value.genesis_block_number as u64,
            rollback_target: value.rollback_target.map(|n| n as u64),
        }
    }
}
