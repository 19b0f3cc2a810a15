use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;
use std::{collections::HashMap, time::Duration};

/// The metric handler for the reconciler. Tracks per block and per event outcomes.
#[derive(Debug, Default)]
pub(crate) struct MetricsHandler {
    /// The reconciler metrics.
    reconciler: ReconcilerMetrics,
    /// The metrics of each event, keyed by event name.
    events: HashMap<&'static str, EventMetrics>,
}

impl MetricsHandler {
    /// Records an applied block.
    pub(crate) fn record_block(&self, number: u64, duration: Duration) {
        self.reconciler.blocks_applied.increment(1);
        self.reconciler.last_block.set(number as f64);
        self.reconciler.block_processing_duration.record(duration.as_secs_f64());
    }

    /// Records an event applied to the ledger.
    pub(crate) fn record_applied(&mut self, event: &'static str) {
        self.reconciler.events_applied.increment(1);
        self.event(event).applied.increment(1);
    }

    /// Records a rejected event.
    pub(crate) fn record_rejected(&mut self, event: &'static str) {
        self.reconciler.events_rejected.increment(1);
        self.event(event).rejected.increment(1);
    }

    /// Records a reorg rolling back `depth` blocks.
    pub(crate) fn record_reorg(&self, depth: u64) {
        self.reconciler.reorgs.increment(1);
        self.reconciler.reorg_depth.record(depth as f64);
    }

    /// Records a block rolled back.
    pub(crate) fn record_rolled_back(&self, number: u64) {
        self.reconciler.rolled_back_blocks.increment(1);
        self.reconciler.last_block.set(number as f64);
    }

    fn event(&mut self, event: &'static str) -> &EventMetrics {
        self.events
            .entry(event)
            .or_insert_with(|| EventMetrics::new_with_labels(&[("event", event)]))
    }
}

/// The metrics for the [`super::Reconciler`].
#[derive(Metrics, Clone)]
#[metrics(scope = "reconciler")]
pub(crate) struct ReconcilerMetrics {
    /// A counter on the L1 blocks applied.
    blocks_applied: Counter,
    /// A counter on the events applied.
    events_applied: Counter,
    /// A counter on the events rejected.
    events_rejected: Counter,
    /// A counter on the reorgs handled.
    reorgs: Counter,
    /// A histogram of the number of blocks rolled back per reorg.
    reorg_depth: Histogram,
    /// A counter on the blocks rolled back.
    rolled_back_blocks: Counter,
    /// A histogram of the duration of a block application.
    block_processing_duration: Histogram,
    /// The last L1 block applied.
    last_block: Gauge,
}

/// The outcomes of an event type.
#[derive(Metrics, Clone)]
#[metrics(scope = "reconciler")]
pub(crate) struct EventMetrics {
    /// A counter on the events of the type applied.
    applied: Counter,
    /// A counter on the events of the type rejected.
    rejected: Counter,
}
