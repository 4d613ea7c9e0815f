//! matstage: a fixed-capacity, thread-safe staging buffer that decouples a
//! matrix-generating producer from a matrix-multiplying consumer.
//!
//! One [`stage::StageBuffer`] carries payloads between exactly one producer
//! thread and one consumer thread. Both workers stop cleanly once an exact
//! target item count has passed through, and the consumer compensates for
//! shape-mismatched pairs by discarding and re-acquiring the second operand.
//! Configure and drive a run through [`pipeline::Pipeline`].

pub mod config;
#[doc(hidden)]
pub mod harness;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod invariant_sig;
pub mod matrix;
pub mod pipeline;
pub mod source;
pub mod stage;
pub mod stats;
mod workers;
