//! Builder API for configuring a pipeline run.

use crate::pipeline::{PayloadMode, Pipeline};

/// Default buffer capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 8;
/// Default per-side item target when none is configured.
pub const DEFAULT_TARGET: u64 = 200;

/// The pipeline builder. Validation happens at `build`, so configuration
/// calls chain freely.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    capacity: usize,
    target: u64,
    mode: PayloadMode,
    seed: Option<u64>,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A staging buffer needs at least one slot.
    ZeroCapacity,
    /// Fixed payload shapes need at least one row and column.
    ZeroPayloadDim,
}

impl PipelineBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            target: DEFAULT_TARGET,
            mode: PayloadMode::Random,
            seed: None,
        }
    }

    /// Set the buffer capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the per-side item target.
    pub fn target(mut self, target: u64) -> Self {
        self.target = target;
        self
    }

    /// Set the payload mode for the default source.
    pub fn payload(mut self, mode: PayloadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed the default source for a reproducible run.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate and build the pipeline.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let PayloadMode::FixedSize(0) = self.mode {
            return Err(ConfigError::ZeroPayloadDim);
        }
        Ok(Pipeline::from_parts(
            self.capacity,
            self.target,
            self.mode,
            self.seed,
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
