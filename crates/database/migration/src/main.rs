use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    tracing::info!(target: "sync::migration", "Running database migrations.");
    cli::run_cli(migration::Migrator).await;
    tracing::info!(target: "sync::migration", "Database migrations complete.")
}
