use alloy_primitives::B256;
use rollup_sync_primitives::L1BlockHeader;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an applied L1 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "l1_block")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub(crate) block_number: i64,
    block_hash: Vec<u8>,
    parent_hash: Vec<u8>,
    block_timestamp: i64,
}

/// The relation for the L1 block model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the L1 block model.
impl ActiveModelBehavior for ActiveModel {}

impl From<L1BlockHeader> for ActiveModel {
    fn from(header: L1BlockHeader) -> Self {
        Self {
            block_number: ActiveValue::Set(header.number as i64),
            block_hash: ActiveValue::Set(header.hash.to_vec()),
            parent_hash: ActiveValue::Set(header.parent_hash.to_vec()),
            block_timestamp: ActiveValue::Set(header.timestamp as i64),
        }
    }
}

impl From<Model> for L1BlockHeader {
    fn from(value: Model) -> Self {
        Self {
            number: value.block_number as u64,
            hash: B256::from_slice(&value.block_hash),
            parent_hash: B256::from_slice(&value.parent_hash),
            timestamp: value.block_timestamp as u64,
        }
    }
}
