/// The max retries for the L1 provider.
pub const PROVIDER_MAX_RETRIES: u32 = 10;

/// The initial backoff for the L1 provider.
pub const PROVIDER_INITIAL_BACKOFF: u64 = 100;

/// The default provider compute units per second.
pub const PROVIDER_COMPUTE_UNITS_PER_SECOND: u64 = 50;

/// The default database url.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://rollup-sync.db?mode=rwc";
