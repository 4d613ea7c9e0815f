//! PPT invariant system: runtime enforcement of the staging pipeline's
//! synchronization invariants, with contract tracking for tests.

#[cfg(feature = "ppt")]
use lazy_static::lazy_static;
#[cfg(feature = "ppt")]
use std::collections::HashSet;
#[cfg(feature = "ppt")]
use std::sync::Mutex;

// Invariant constants for contract tracking. These fire at the stage and
// worker choke points; contract tests assert they were exercised.
pub const STAGE_IN_BOUNDS: u32 = 1;
pub const STAGE_SLOT_LIVE: u32 = 2;
pub const STAGE_ACCOUNTING: u32 = 3;
pub const GATE_MONOTONE: u32 = 4;
pub const GATE_NEVER_OVERRUNS: u32 = 5;
pub const PRODUCER_EXACT_EXIT: u32 = 6;
pub const CONSUMER_EXACT_EXIT: u32 = 7;
pub const COMBINE_RECOVERS: u32 = 8;
pub const STATS_CONSERVED: u32 = 9;
pub const PIPELINE_TERMINATES: u32 = 10;

#[cfg(feature = "ppt")]
lazy_static! {
    static ref INVARIANT_LOG: Mutex<HashSet<u32>> = Mutex::new(HashSet::new());
}

#[cfg(feature = "ppt")]
/// Assert an invariant: logs it and panics on failure.
pub(crate) fn assert_invariant(id: u32, condition: bool, message: &str, context: Option<&str>) {
    if !condition {
        let full_message = if let Some(ctx) = context {
            format!("Invariant {} failed: {} (context: {})", id, message, ctx)
        } else {
            format!("Invariant {} failed: {}", id, message)
        };
        eprintln!("{}", full_message);
        panic!("{}", full_message);
    }
    // Log the invariant presence
    INVARIANT_LOG.lock().unwrap().insert(id);
}

#[cfg(not(feature = "ppt"))]
/// Assert an invariant: checks condition and panics on failure.
pub(crate) fn assert_invariant(_id: u32, condition: bool, message: &str, _context: Option<&str>) {
    if !condition {
        panic!("Invariant failed: {}", message);
    }
}

#[cfg(feature = "ppt")]
/// Contract test: checks that specified invariants were asserted.
pub fn contract_test(test_name: &str, required_invariants: &[u32]) {
    let log = INVARIANT_LOG.lock().unwrap();
    let mut missing = Vec::new();
    for &inv in required_invariants {
        if !log.contains(&inv) {
            missing.push(inv);
        }
    }
    drop(log); // Drop the lock before panicking
    if !missing.is_empty() {
        panic!(
            "Contract test '{}' failed: invariants not enforced: {:?}",
            test_name, missing
        );
    }
}

#[cfg(not(feature = "ppt"))]
/// Contract test: no-op when PPT feature is disabled.
pub fn contract_test(_test_name: &str, _required_invariants: &[u32]) {}

#[cfg(feature = "ppt")]
/// Clear invariant log (for between test runs).
pub fn clear_invariant_log() {
    INVARIANT_LOG.lock().unwrap().clear();
}

#[cfg(not(feature = "ppt"))]
/// Clear invariant log: no-op when PPT feature is disabled.
pub fn clear_invariant_log() {}
