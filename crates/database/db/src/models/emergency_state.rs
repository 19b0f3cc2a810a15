use rollup_sync_primitives::EmergencyState;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents the emergency state as of an L1 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "emergency_state")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    block_number: i64,
    is_active: bool,
    activated_at_batch: Option<i64>,
}

/// The relation for the emergency state model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the emergency state model.
impl ActiveModelBehavior for ActiveModel {}

impl From<(u64, EmergencyState)> for ActiveModel {
    fn from((block_number, state): (u64, EmergencyState)) -> Self {
        Self {
            block_number: ActiveValue::Set(block_number as i64),
            is_active: ActiveValue::Set(state.is_active),
            activated_at_batch: ActiveValue::Set(state.activated_at_batch.map(|n| n as i64)),
        }
    }
}

impl From<Model> for EmergencyState {
    fn from(value: Model) -> Self {
        Self {
            is_active: value.is_active,
            activated_at_batch: value.activated_at_batch.map(|n| n as u64),
        }
    }
}
