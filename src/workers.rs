//! Worker loops: the producer and consumer state machines.
//!
//! The producer runs GENERATE -> ACQUIRE_SLOT -> INSERT -> ADVANCE until the
//! gate closes. The consumer acquires pairs, multiplies them, and compensates
//! for shape mismatches by discarding the second operand and fetching a
//! replacement. Both loops consult the gate through the stage's own
//! operations, so neither can park past the target.

use crate::invariant_ppt::{
    assert_invariant, COMBINE_RECOVERS, CONSUMER_EXACT_EXIT, PRODUCER_EXACT_EXIT,
};
use crate::invariant_sig::{
    signal, SIG_COMBINE_APPLIED, SIG_COMBINE_RETRIED, SIG_CONSUMER_EXIT, SIG_ITEM_STAGED,
    SIG_ITEM_TAKEN, SIG_PRODUCER_EXIT,
};
use crate::matrix::{Matrix, MatrixError};
use crate::source::MatrixSource;
use crate::stage::{PopOutcome, PushOutcome, StageBuffer};
use crate::stats::StageStats;
use rtrb::Producer as SignalTx;

/// Producer loop: generate outside the lock, stage, account, stop on target.
pub(crate) fn produce<S: MatrixSource>(
    stage: &StageBuffer<Matrix>,
    source: &mut S,
    sig: &mut SignalTx<u8>,
) -> StageStats {
    let mut stats = StageStats::default();
    while stage.production_pending() {
        // Generation never holds the stage lock; a slow source cannot
        // stall the consumer.
        let payload = source.next_matrix();
        let sum = payload.element_sum();
        match stage.push(payload) {
            PushOutcome::Stored(_) => {
                stats.sum_total += sum;
                stats.item_total += 1;
                signal(sig, SIG_ITEM_STAGED);
            }
            PushOutcome::Refused(payload) => {
                // Gate closed while we were parked; release unstaged.
                drop(payload);
                break;
            }
        }
    }
    let (produced, _) = stage.counts();
    assert_invariant(
        PRODUCER_EXACT_EXIT,
        produced == stage.target(),
        "producer exited with an unmet or overrun target",
        Some("produce"),
    );
    signal(sig, SIG_PRODUCER_EXIT);
    stats
}

/// Consumer loop: acquire pairs, multiply, discard-and-replace on mismatch.
pub(crate) fn consume<C>(
    stage: &StageBuffer<Matrix>,
    mut combine: C,
    sig: &mut SignalTx<u8>,
) -> StageStats
where
    C: FnMut(&Matrix, &Matrix) -> Result<Matrix, MatrixError>,
{
    let mut stats = StageStats::default();
    'pairs: loop {
        let (first, first_count) = match stage.pop() {
            PopOutcome::Taken(payload, count) => (payload, count),
            PopOutcome::Drained => break,
        };
        stats.absorb(&first);
        signal(sig, SIG_ITEM_TAKEN);
        if first_count == stage.target() {
            // The first of the pair hit the target: no second is coming,
            // the producer has already stopped.
            break;
        }
        loop {
            let (second, second_count) = match stage.pop() {
                PopOutcome::Taken(payload, count) => (payload, count),
                PopOutcome::Drained => break 'pairs,
            };
            stats.absorb(&second);
            signal(sig, SIG_ITEM_TAKEN);
            match combine(&first, &second) {
                Ok(product) => {
                    stats.combine_total += 1;
                    signal(sig, SIG_COMBINE_APPLIED);
                    drop(product);
                    break;
                }
                Err(MatrixError::ShapeMismatch) => {
                    // The discarded operand's consumption count is spent;
                    // its replacement is fetched on the next iteration.
                    // `second` drops here, before the replacement pop.
                    signal(sig, SIG_COMBINE_RETRIED);
                    assert_invariant(
                        COMBINE_RECOVERS,
                        true,
                        "shape mismatch compensated by discard-and-replace",
                        Some("consume"),
                    );
                    if second_count == stage.target() {
                        break 'pairs;
                    }
                }
            }
        }
    }
    let (_, consumed) = stage.counts();
    assert_invariant(
        CONSUMER_EXACT_EXIT,
        consumed == stage.target(),
        "consumer exited with an unmet or overrun target",
        Some("consume"),
    );
    signal(sig, SIG_CONSUMER_EXIT);
    stats
}
