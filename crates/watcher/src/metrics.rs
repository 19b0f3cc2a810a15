use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::L1Watcher`].
#[derive(Metrics)]
#[metrics(scope = "l1_watcher")]
pub struct WatcherMetrics {
    /// A counter on the L1 blocks delivered.
    pub blocks: Counter,
    /// A counter on the rollup events delivered.
    pub rollup_events: Counter,
    /// A counter on the ranges discarded because the chain changed while fetching them.
    pub refetched_ranges: Counter,
    /// A counter on the rewinds requested by the consumer.
    pub rewinds: Counter,
    /// The latest L1 block number observed.
    pub l1_head: Gauge,
    /// A histogram of the duration of a range fetch.
    pub range_fetch_duration: Histogram,
}
