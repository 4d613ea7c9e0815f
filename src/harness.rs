//! Run harness: drives deterministic pipeline runs and checks gate facts.

use crate::pipeline::{PayloadMode, Pipeline};
use crate::stats::RunReport;

/// Harness for pipeline proofs: runs a configured pipeline with
/// deterministic payloads and checks the termination facts.
pub struct RunHarness {
    pipeline: Pipeline,
}

impl RunHarness {
    /// Harness over fixed 2x2 payloads with a fixed seed.
    pub fn new(capacity: usize, target: u64) -> Self {
        let pipeline = Pipeline::builder()
            .capacity(capacity)
            .target(target)
            .payload(PayloadMode::FixedSize(2))
            .seed(0)
            .build()
            .expect("harness configuration is valid by construction");
        Self { pipeline }
    }

    /// Run once and assert the counting facts every run must satisfy.
    pub fn run_checked(&self) -> RunReport {
        let target = self.pipeline.target();
        let report = self.pipeline.run();
        assert_eq!(report.producer.item_total, target);
        assert_eq!(report.consumer.item_total, target);
        assert!(report.is_balanced());
        report
    }
}
