//! Worker-side invariant signaling for the staging pipeline.
//!
//! Two-tier design:
//! - **Tier 1 (worker)**: lock-free signaling of progress-fact IDs from the
//!   producer and consumer loops
//! - **Tier 2 (coordinator)**: draining, counting, and contract judgment on
//!   the joining thread
//!
//! Workers **signal facts**. The coordinator **judges correctness**. Signals
//! ride an SPSC queue so emitting one never touches the stage lock and never
//! extends a critical section. The gate counters stay authoritative; signals
//! are evidence for contract tests, not accounting.

use rtrb::{Consumer, Producer, RingBuffer};

// ============================================================================
// Worker Signal IDs (Tier 1)
// ============================================================================
// Integer IDs, not strings. No allocation, no formatting in worker loops.

/// A payload was inserted into the staging buffer.
pub const SIG_ITEM_STAGED: u8 = 1;

/// A payload was removed from the staging buffer.
pub const SIG_ITEM_TAKEN: u8 = 2;

/// A pairwise multiply succeeded.
pub const SIG_COMBINE_APPLIED: u8 = 3;

/// A pairwise multiply hit a shape mismatch; the second operand was
/// discarded and a replacement requested.
pub const SIG_COMBINE_RETRIED: u8 = 4;

/// The producer observed its post-increment count hit the target and exited.
pub const SIG_PRODUCER_EXIT: u8 = 5;

/// The consumer observed the gate drained and exited.
pub const SIG_CONSUMER_EXIT: u8 = 6;

// ============================================================================
// Signal Queue
// ============================================================================

/// Capacity for each worker's signal queue.
/// Sized for the run lengths the contract tests drive; longer runs shed
/// signals rather than block a worker.
pub const SIGNAL_QUEUE_CAPACITY: usize = 1024;

/// Creates a new signal queue pair for one worker.
///
/// Returns (producer for the worker, consumer for the coordinator).
pub fn new_signal_queue() -> (Producer<u8>, Consumer<u8>) {
    RingBuffer::new(SIGNAL_QUEUE_CAPACITY)
}

/// Signals a progress fact from a worker loop.
///
/// If the queue is full the signal is dropped; a shed signal is preferable
/// to a worker blocking on telemetry.
#[inline]
pub fn signal(tx: &mut Producer<u8>, id: u8) {
    let _ = tx.push(id);
}

// ============================================================================
// Coordinator Verification (Tier 2)
// ============================================================================

/// Drains all pending signals from a worker's queue.
///
/// Called by the coordinator after (or while) the worker runs.
pub fn drain_signals(rx: &mut Consumer<u8>) -> Vec<u8> {
    let mut signals = Vec::with_capacity(SIGNAL_QUEUE_CAPACITY);
    while let Ok(id) = rx.pop() {
        signals.push(id);
    }
    signals
}

/// Counts occurrences of each signal ID in a drained list.
pub fn count_signals(signals: &[u8]) -> [usize; 256] {
    let mut counts = [0usize; 256];
    for &id in signals {
        counts[id as usize] += 1;
    }
    counts
}

/// Contract verification: asserts that required signals were observed.
///
/// # Panics
/// Panics if any required signal was not observed at least once.
#[cfg(any(test, feature = "ppt"))]
pub fn contract_signals(contract_name: &str, signals: &[u8], required: &[u8]) {
    let counts = count_signals(signals);
    let mut missing = Vec::new();

    for &id in required {
        if counts[id as usize] == 0 {
            missing.push(signal_name(id));
        }
    }

    if !missing.is_empty() {
        let present: Vec<&str> = signals
            .iter()
            .map(|&id| signal_name(id))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        panic!(
            "Contract '{}' missing signals: {:?}. Present: {:?}",
            contract_name, missing, present
        );
    }
}

/// Maps a signal ID to a human-readable name (for diagnostics only).
pub const fn signal_name(id: u8) -> &'static str {
    match id {
        SIG_ITEM_STAGED => "ITEM_STAGED",
        SIG_ITEM_TAKEN => "ITEM_TAKEN",
        SIG_COMBINE_APPLIED => "COMBINE_APPLIED",
        SIG_COMBINE_RETRIED => "COMBINE_RETRIED",
        SIG_PRODUCER_EXIT => "PRODUCER_EXIT",
        SIG_CONSUMER_EXIT => "CONSUMER_EXIT",
        _ => "UNKNOWN",
    }
}

// ============================================================================
// Tests
// ============================================================================
