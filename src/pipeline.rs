//! Pipeline orchestration: spawn both workers, join them, aggregate stats.

use crate::config::PipelineBuilder;
use crate::invariant_ppt::{assert_invariant, PIPELINE_TERMINATES};
use crate::invariant_sig::{drain_signals, new_signal_queue};
use crate::matrix::{Matrix, MatrixError};
use crate::source::{FixedSource, MatrixSource, RandomSource};
use crate::stage::StageBuffer;
use crate::stats::{RunReport, StageStats};
use crate::workers::{consume, produce};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// How the default payload source shapes its matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Random shapes (1..=4 per side); pairs may mismatch.
    Random,
    /// Fixed n x n shapes; every pair multiplies cleanly.
    FixedSize(usize),
}

/// A configured run: one producer thread, one consumer thread, one staging
/// buffer between them. Construct through [`Pipeline::builder`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    capacity: usize,
    target: u64,
    mode: PayloadMode,
    seed: Option<u64>,
}

impl Pipeline {
    /// Start configuring a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub(crate) fn from_parts(
        capacity: usize,
        target: u64,
        mode: PayloadMode,
        seed: Option<u64>,
    ) -> Self {
        Self {
            capacity,
            target,
            mode,
            seed,
        }
    }

    /// Buffer capacity this run uses.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Per-side item target this run uses.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Run with the configured payload mode and the standard multiply.
    /// Blocks until both workers have terminated.
    pub fn run(&self) -> RunReport {
        let source: Box<dyn MatrixSource> = match (self.mode, self.seed) {
            (PayloadMode::Random, Some(seed)) => Box::new(RandomSource::seeded(seed)),
            (PayloadMode::Random, None) => Box::new(RandomSource::new()),
            (PayloadMode::FixedSize(dim), Some(seed)) => Box::new(FixedSource::seeded(dim, seed)),
            (PayloadMode::FixedSize(dim), None) => Box::new(FixedSource::new(dim)),
        };
        self.run_with(source, |a, b| a.multiply(b))
    }

    /// Run with a caller-supplied source and combine seam.
    ///
    /// Tests use this to feed tagged or deliberately mismatching payloads
    /// and to observe what the consumer sees.
    pub fn run_with<S, C>(&self, source: S, combine: C) -> RunReport
    where
        S: MatrixSource,
        C: FnMut(&Matrix, &Matrix) -> Result<Matrix, MatrixError> + Send + 'static,
    {
        let stage = Arc::new(StageBuffer::new(self.capacity, self.target));
        let (mut producer_sig, mut producer_drain) = new_signal_queue();
        let (mut consumer_sig, mut consumer_drain) = new_signal_queue();

        let producer = {
            let stage = Arc::clone(&stage);
            let mut source = source;
            thread::Builder::new()
                .name("stage-producer".into())
                .spawn(move || produce(&stage, &mut source, &mut producer_sig))
                .expect("failed to spawn producer worker")
        };
        let consumer = {
            let stage = Arc::clone(&stage);
            thread::Builder::new()
                .name("stage-consumer".into())
                .spawn(move || consume(&stage, combine, &mut consumer_sig))
                .expect("failed to spawn consumer worker")
        };

        let producer_stats = join_worker(producer);
        let consumer_stats = join_worker(consumer);

        assert_invariant(
            PIPELINE_TERMINATES,
            stage.counts() == (self.target, self.target),
            "run finished with gate counters off target",
            Some("run_with"),
        );

        RunReport::aggregate(
            producer_stats,
            consumer_stats,
            drain_signals(&mut producer_drain),
            drain_signals(&mut consumer_drain),
        )
    }
}

/// Collect a worker's stats, re-raising its panic loudly rather than
/// continuing with half a run.
fn join_worker(handle: JoinHandle<StageStats>) -> StageStats {
    match handle.join() {
        Ok(stats) => stats,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
