//! The rollup synchronizer: follows the rollup contract on the L1 and keeps a local ledger of its
//! batches, verifications and parameters.

mod args;
pub use args::{GenesisArgs, L1ProviderArgs, RollupSyncArgs, WatcherArgs};

/// Default values of the arguments.
pub mod constants;

mod node;
pub use node::run;
