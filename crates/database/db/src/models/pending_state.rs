use alloy_primitives::B256;
use rollup_sync_primitives::PendingState;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a pending state.
///
/// Rows are never reused: a retired pending state keeps the block that invalidated it so that a
/// rollback can restore it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_state")]
pub struct Model {
    #[sea_orm(primary_key)]
    id: i32,
    pending_state_number: i64,
    timestamp: i64,
    last_verified_batch: i64,
    exit_root: Vec<u8>,
    state_root: Vec<u8>,
    block_number: i64,
    consolidated_block_number: Option<i64>,
    invalidated_block_number: Option<i64>,
}

/// The relation for the pending state model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the pending state model.
impl ActiveModelBehavior for ActiveModel {}

impl From<PendingState> for ActiveModel {
    fn from(state: PendingState) -> Self {
        Self {
            id: ActiveValue::NotSet,
            pending_state_number: ActiveValue::Set(state.pending_state_number as i64),
            timestamp: ActiveValue::Set(state.timestamp as i64),
            last_verified_batch: ActiveValue::Set(state.last_verified_batch as i64),
            exit_root: ActiveValue::Set(state.exit_root.to_vec()),
            state_root: ActiveValue::Set(state.state_root.to_vec()),
            block_number: ActiveValue::Set(state.block_number as i64),
            consolidated_block_number: ActiveValue::Set(
                state.consolidated.then_some(state.block_number as i64),
            ),
            invalidated_block_number: ActiveValue::Set(None),
        }
    }
}

impl From<Model> for PendingState {
    fn from(value: Model) -> Self {
        Self {
            pending_state_number: value.pending_state_number as u64,
            timestamp: value.timestamp as u64,
            last_verified_batch: value.last_verified_batch as u64,
            exit_root: B256::from_slice(&value.exit_root),
            state_root: B256::from_slice(&value.state_root),
            consolidated: value.consolidated_block_number.is_some(),
            block_number: value.block_number as u64,
        }
    }
}
