pub use sea_orm_migration::prelude::*;

mod m20250701_000001_create_l1_block_table;
mod m20250701_000002_create_batch_tables;
mod m20250701_000003_create_pending_state_table;
mod m20250701_000004_create_rollup_parameters_table;
mod m20250715_091203_add_rollback_indexes;

/// The length of a hash column.
const HASH_LENGTH: u32 = 32;

/// The length of an address column.
const ADDRESS_LENGTH: u32 = 20;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250701_000001_create_l1_block_table::Migration),
            Box::new(m20250701_000002_create_batch_tables::Migration),
            Box::new(m20250701_000003_create_pending_state_table::Migration),
            Box::new(m20250701_000004_create_rollup_parameters_table::Migration),
            Box::new(m20250715_091203_add_rollback_indexes::Migration),
        ]
    }
}
