//! Trait-based payload sources feeding the producer worker.
//!
//! Generation happens outside the stage lock, so a slow source can never
//! stall the consumer. Implement [`MatrixSource`] to feed the pipeline
//! custom payloads (tests use this seam for tagged and mismatching shapes).

use crate::matrix::Matrix;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Smallest row/column count a random source draws.
pub const MIN_RANDOM_DIM: usize = 1;
/// Largest row/column count a random source draws.
pub const MAX_RANDOM_DIM: usize = 4;
/// Element values are drawn from 1..=MAX_ELEMENT.
pub const MAX_ELEMENT: i64 = 10;

/// A source of matrix payloads. One payload per call, on demand.
pub trait MatrixSource: Send + 'static {
    /// Produce the next payload. Never invoked under the stage lock.
    fn next_matrix(&mut self) -> Matrix;
}

impl MatrixSource for Box<dyn MatrixSource> {
    fn next_matrix(&mut self) -> Matrix {
        (**self).next_matrix()
    }
}

/// Random shapes and random elements; shapes may be mutually incompatible,
/// which exercises the consumer's discard-and-replace path.
#[derive(Debug)]
pub struct RandomSource {
    rng: SmallRng,
}

impl RandomSource {
    /// Entropy-seeded source.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Deterministically seeded source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixSource for RandomSource {
    fn next_matrix(&mut self) -> Matrix {
        let rows = self.rng.random_range(MIN_RANDOM_DIM..=MAX_RANDOM_DIM);
        let cols = self.rng.random_range(MIN_RANDOM_DIM..=MAX_RANDOM_DIM);
        let data = (0..rows * cols)
            .map(|_| self.rng.random_range(1..=MAX_ELEMENT))
            .collect();
        Matrix::new(rows, cols, data)
    }
}

/// Fixed n x n shapes with random elements; every pair multiplies cleanly.
#[derive(Debug)]
pub struct FixedSource {
    dim: usize,
    rng: SmallRng,
}

impl FixedSource {
    /// n x n payloads, entropy-seeded elements.
    pub fn new(dim: usize) -> Self {
        Self::seeded(dim, rand::rng().random())
    }

    /// n x n payloads with a deterministic element stream.
    pub fn seeded(dim: usize, seed: u64) -> Self {
        assert!(dim > 0, "payload dimension must be at least 1");
        Self {
            dim,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl MatrixSource for FixedSource {
    fn next_matrix(&mut self) -> Matrix {
        let data = (0..self.dim * self.dim)
            .map(|_| self.rng.random_range(1..=MAX_ELEMENT))
            .collect();
        Matrix::new(self.dim, self.dim, data)
    }
}

/// Deterministic 1 x 1 payloads carrying an increasing sequence tag.
/// Every pair is compatible, and the tag order lets tests observe FIFO
/// delivery through the combine seam.
#[derive(Debug, Default)]
pub struct SequenceSource {
    next_tag: i64,
}

impl SequenceSource {
    /// Tags start at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatrixSource for SequenceSource {
    fn next_matrix(&mut self) -> Matrix {
        let tag = self.next_tag;
        self.next_tag += 1;
        Matrix::new(1, 1, vec![tag])
    }
}
