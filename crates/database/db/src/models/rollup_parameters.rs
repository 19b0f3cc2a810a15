use alloy_primitives::{Address, U256};
use rollup_sync_primitives::RollupParameters;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents the rollup parameters as of an L1 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rollup_parameters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    block_number: i64,
    batch_fee: Vec<u8>,
    multiplier_batch_fee: i32,
    verify_batch_time_target: i64,
    pending_state_timeout: i64,
    trusted_aggregator_timeout: i64,
    force_batch_timeout: i64,
    last_timestamp: i64,
    trusted_sequencer: Vec<u8>,
    trusted_sequencer_url: String,
    trusted_aggregator: Vec<u8>,
    admin: Vec<u8>,
    pending_admin: Vec<u8>,
    owner: Vec<u8>,
    is_forced_batch_disallowed: bool,
    fork_id: i64,
    version: String,
}

/// The relation for the rollup parameters model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the rollup parameters model.
impl ActiveModelBehavior for ActiveModel {}

impl From<(u64, &RollupParameters)> for ActiveModel {
    fn from((block_number, parameters): (u64, &RollupParameters)) -> Self {
        Self {
            block_number: ActiveValue::Set(block_number as i64),
            batch_fee: ActiveValue::Set(parameters.batch_fee.to_be_bytes::<32>().to_vec()),
            multiplier_batch_fee: ActiveValue::Set(parameters.multiplier_batch_fee as i32),
            verify_batch_time_target: ActiveValue::Set(parameters.verify_batch_time_target as i64),
            pending_state_timeout: ActiveValue::Set(parameters.pending_state_timeout as i64),
            trusted_aggregator_timeout: ActiveValue::Set(
                parameters.trusted_aggregator_timeout as i64,
            ),
            force_batch_timeout: ActiveValue::Set(parameters.force_batch_timeout as i64),
            last_timestamp: ActiveValue::Set(parameters.last_timestamp as i64),
            trusted_sequencer: ActiveValue::Set(parameters.trusted_sequencer.to_vec()),
            trusted_sequencer_url: ActiveValue::Set(parameters.trusted_sequencer_url.clone()),
            trusted_aggregator: ActiveValue::Set(parameters.trusted_aggregator.to_vec()),
            admin: ActiveValue::Set(parameters.admin.to_vec()),
            pending_admin: ActiveValue::Set(parameters.pending_admin.to_vec()),
            owner: ActiveValue::Set(parameters.owner.to_vec()),
            is_forced_batch_disallowed: ActiveValue::Set(parameters.is_forced_batch_disallowed),
            fork_id: ActiveValue::Set(parameters.fork_id as i64),
            version: ActiveValue::Set(parameters.version.clone()),
        }
    }
}

impl From<Model> for RollupParameters {
    fn from(value: Model) -> Self {
        Self {
            batch_fee: U256::from_be_slice(&value.batch_fee),
            multiplier_batch_fee: value.multiplier_batch_fee as u16,
            verify_batch_time_target: value.verify_batch_time_target as u64,
            pending_state_timeout: value.pending_state_timeout as u64,
            trusted_aggregator_timeout: value.trusted_aggregator_timeout as u64,
            force_batch_timeout: value.force_batch_timeout as u64,
            last_timestamp: value.last_timestamp as u64,
            trusted_sequencer: Address::from_slice(&value.trusted_sequencer),
            trusted_sequencer_url: value.trusted_sequencer_url,
            trusted_aggregator: Address::from_slice(&value.trusted_aggregator),
            admin: Address::from_slice(&value.admin),
            pending_admin: Address::from_slice(&value.pending_admin),
            owner: Address::from_slice(&value.owner),
            is_forced_batch_disallowed: value.is_forced_batch_disallowed,
            fork_id: value.fork_id as u64,
            version: value.version,
        }
    }
}
