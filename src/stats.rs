//! Per-worker run statistics and their aggregation.

use crate::invariant_ppt::{assert_invariant, STATS_CONSERVED};
use crate::matrix::Matrix;

/// What one worker handled over its lifetime. Worker-local while the run is
/// live; read by the coordinator only after the worker has been joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Running sum of the element-sums of every payload handled.
    pub sum_total: i64,
    /// Successful pairwise multiplies (consumer side only).
    pub combine_total: u64,
    /// Payloads produced or consumed, discarded replacements included.
    pub item_total: u64,
}

impl StageStats {
    /// Account for one payload passing through this worker's hands.
    pub fn absorb(&mut self, payload: &Matrix) {
        self.sum_total += payload.element_sum();
        self.item_total += 1;
    }
}

/// Final report: both workers' stats plus the drained signal logs.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Producer-side totals.
    pub producer: StageStats,
    /// Consumer-side totals.
    pub consumer: StageStats,
    /// Progress facts drained from the producer's signal queue.
    pub producer_signals: Vec<u8>,
    /// Progress facts drained from the consumer's signal queue.
    pub consumer_signals: Vec<u8>,
}

impl RunReport {
    /// Merge both sides into a report, asserting the end-to-end conservation
    /// invariant: everything the producer staged, the consumer drained.
    pub fn aggregate(
        producer: StageStats,
        consumer: StageStats,
        producer_signals: Vec<u8>,
        consumer_signals: Vec<u8>,
    ) -> Self {
        assert_invariant(
            STATS_CONSERVED,
            producer.sum_total == consumer.sum_total,
            "element sums diverged between production and consumption",
            Some("aggregate"),
        );
        Self {
            producer,
            consumer,
            producer_signals,
            consumer_signals,
        }
    }

    /// The conservation check as a value, for callers that report rather
    /// than assert.
    pub fn is_balanced(&self) -> bool {
        self.producer.sum_total == self.consumer.sum_total
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "produced: {} items (element sum {})",
            self.producer.item_total, self.producer.sum_total
        )?;
        writeln!(
            f,
            "consumed: {} items (element sum {})",
            self.consumer.item_total, self.consumer.sum_total
        )?;
        write!(f, "multiplies: {}", self.consumer.combine_total)
    }
}
