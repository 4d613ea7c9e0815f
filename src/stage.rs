//! Staging buffer: a fixed-capacity blocking ring with its termination gate.
//!
//! One `StageBuffer` bundles the ring storage, both cursors, the occupancy
//! count, and the produced/consumed gate counters behind a single mutex with
//! two condition variables. Every invariant is enforced at this choke point;
//! there are no free-floating locks, flags, or counters anywhere else in the
//! crate. Full and empty are handled by blocking, never by error returns.

use crate::invariant_ppt::{
    assert_invariant, GATE_MONOTONE, GATE_NEVER_OVERRUNS, STAGE_ACCOUNTING, STAGE_IN_BOUNDS,
    STAGE_SLOT_LIVE,
};
use std::sync::{Condvar, Mutex};

/// Outcome of a producer-side `push`.
#[derive(Debug)]
pub enum PushOutcome<T> {
    /// The payload was stored; carries the post-increment produced count so
    /// the caller can tell if it just reached the target.
    Stored(u64),
    /// The production target was reached while the caller was parked; the
    /// payload is handed back untouched and must be released by its owner.
    Refused(T),
}

/// Outcome of a consumer-side `pop`.
#[derive(Debug)]
pub enum PopOutcome<T> {
    /// A payload was removed; carries the post-increment consumed count so
    /// the caller can tell if it just reached the target.
    Taken(T, u64),
    /// The consumption target has been reached; nothing more will be served.
    Drained,
}

/// Cursors, occupancy, and gate counters. Only ever touched under the lock.
#[derive(Debug)]
struct StageState<T> {
    slots: Vec<Option<T>>,
    head: usize,
    tail: usize,
    occupancy: usize,
    produced: u64,
    consumed: u64,
}

/// Fixed-capacity staging buffer shared by exactly one producer and one
/// consumer. Owns each payload from the moment `push` stores it until `pop`
/// returns it by value; payloads still resident at teardown are freed with
/// the buffer.
#[derive(Debug)]
pub struct StageBuffer<T> {
    state: Mutex<StageState<T>>,
    /// Signaled when a slot opens up (or the gate closes).
    space_free: Condvar,
    /// Signaled when a payload lands (or the gate closes).
    data_ready: Condvar,
    capacity: usize,
    target: u64,
}

impl<T> StageBuffer<T> {
    /// Create a buffer with `capacity` slots gated on `target` items per side.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; the builder rejects that earlier.
    pub fn new(capacity: usize, target: u64) -> Self {
        assert!(capacity > 0, "staging buffer capacity must be at least 1");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            state: Mutex::new(StageState {
                slots,
                head: 0,
                tail: 0,
                occupancy: 0,
                produced: 0,
                consumed: 0,
            }),
            space_free: Condvar::new(),
            data_ready: Condvar::new(),
            capacity,
            target,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Per-side item target.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Current number of resident payloads.
    pub fn occupancy(&self) -> usize {
        self.state.lock().unwrap().occupancy
    }

    /// (produced, consumed) gate counters.
    pub fn counts(&self) -> (u64, u64) {
        let st = self.state.lock().unwrap();
        (st.produced, st.consumed)
    }

    /// Gate predicate: the producer still owes items toward the target.
    pub fn production_pending(&self) -> bool {
        self.state.lock().unwrap().produced < self.target
    }

    /// Gate predicate: the consumer still owes items toward the target.
    pub fn consumption_pending(&self) -> bool {
        self.state.lock().unwrap().consumed < self.target
    }

    /// Insert a payload, blocking while the buffer is full.
    ///
    /// The wait loops on its condition: a woken caller re-checks occupancy
    /// before proceeding. If the production target is reached while the
    /// caller is parked, the payload is handed back via
    /// [`PushOutcome::Refused`] instead of being stored.
    pub fn push(&self, item: T) -> PushOutcome<T> {
        let mut st = self.state.lock().unwrap();
        while st.produced < self.target && st.occupancy == self.capacity {
            st = self.space_free.wait(st).unwrap();
        }
        if st.produced >= self.target {
            assert_invariant(
                GATE_NEVER_OVERRUNS,
                st.produced == self.target,
                "produced counter ran past the target",
                Some("push"),
            );
            return PushOutcome::Refused(item);
        }

        let tail = st.tail;
        assert_invariant(
            STAGE_SLOT_LIVE,
            st.slots[tail].is_none(),
            "write cursor landed on an occupied slot",
            Some("push"),
        );
        st.slots[tail] = Some(item);
        st.tail = (tail + 1) % self.capacity;
        st.occupancy += 1;
        st.produced += 1;
        assert_invariant(
            STAGE_IN_BOUNDS,
            st.occupancy <= self.capacity,
            "occupancy exceeded capacity",
            Some("push"),
        );
        assert_invariant(
            STAGE_ACCOUNTING,
            st.produced - st.consumed == st.occupancy as u64,
            "gate counters fell out of step with occupancy",
            Some("push"),
        );

        let produced = st.produced;
        drop(st);
        if produced == self.target {
            // Final insert: every parked waiter re-checks its exit condition.
            self.data_ready.notify_all();
            self.space_free.notify_all();
        } else {
            self.data_ready.notify_one();
        }
        PushOutcome::Stored(produced)
    }

    /// Remove the oldest payload, blocking while the buffer is empty.
    ///
    /// Returns [`PopOutcome::Drained`] the moment the consumption target is
    /// reached; the check runs both before and after every wait, so a caller
    /// parked on an empty buffer is released when the gate closes.
    pub fn pop(&self) -> PopOutcome<T> {
        let mut st = self.state.lock().unwrap();
        loop {
            if st.consumed >= self.target {
                assert_invariant(
                    GATE_NEVER_OVERRUNS,
                    st.consumed == self.target,
                    "consumed counter ran past the target",
                    Some("pop"),
                );
                return PopOutcome::Drained;
            }
            if st.occupancy > 0 {
                break;
            }
            st = self.data_ready.wait(st).unwrap();
        }

        let head = st.head;
        let item = st.slots[head]
            .take()
            .expect("read cursor landed on an empty slot");
        st.head = (head + 1) % self.capacity;
        st.occupancy -= 1;
        let before = st.consumed;
        st.consumed += 1;
        assert_invariant(
            GATE_MONOTONE,
            st.consumed == before + 1,
            "consumed counter must advance by exactly one",
            Some("pop"),
        );
        assert_invariant(
            STAGE_ACCOUNTING,
            st.produced - st.consumed == st.occupancy as u64,
            "gate counters fell out of step with occupancy",
            Some("pop"),
        );

        let consumed = st.consumed;
        drop(st);
        if consumed == self.target {
            // Final removal: the producer may be parked waiting for space.
            self.space_free.notify_all();
            self.data_ready.notify_all();
        } else {
            self.space_free.notify_one();
        }
        PopOutcome::Taken(item, consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_empty() {
        let stage: StageBuffer<i32> = StageBuffer::new(4, 10);
        assert_eq!(stage.capacity(), 4);
        assert_eq!(stage.target(), 10);
        assert_eq!(stage.occupancy(), 0);
        assert_eq!(stage.counts(), (0, 0));
        assert!(stage.production_pending());
        assert!(stage.consumption_pending());
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn zero_capacity_rejected() {
        let _stage: StageBuffer<i32> = StageBuffer::new(0, 1);
    }

    #[test]
    fn fifo_within_capacity() {
        let stage = StageBuffer::new(3, 3);
        for v in [10, 20, 30] {
            assert!(matches!(stage.push(v), PushOutcome::Stored(_)));
        }
        for expect in [10, 20, 30] {
            match stage.pop() {
                PopOutcome::Taken(v, _) => assert_eq!(v, expect),
                PopOutcome::Drained => panic!("drained before target"),
            }
        }
        assert!(matches!(stage.pop(), PopOutcome::Drained));
    }

    #[test]
    fn cursors_wrap_modulo_capacity() {
        let stage = StageBuffer::new(2, 6);
        let mut out = Vec::new();
        // Interleave so occupancy never exceeds 2 on a single thread.
        for v in 0..6 {
            stage.push(v);
            if let PopOutcome::Taken(got, _) = stage.pop() {
                out.push(got);
            }
        }
        assert_eq!(out, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(stage.counts(), (6, 6));
    }

    #[test]
    fn push_refused_once_target_reached() {
        let stage = StageBuffer::new(2, 1);
        assert!(matches!(stage.push(7), PushOutcome::Stored(1)));
        match stage.push(8) {
            PushOutcome::Refused(v) => assert_eq!(v, 8),
            PushOutcome::Stored(_) => panic!("stored past the target"),
        }
        assert!(!stage.production_pending());
    }

    #[test]
    fn pop_drained_once_target_reached() {
        let stage = StageBuffer::new(2, 1);
        stage.push(7);
        assert!(matches!(stage.pop(), PopOutcome::Taken(7, 1)));
        assert!(matches!(stage.pop(), PopOutcome::Drained));
        assert!(!stage.consumption_pending());
    }

    #[test]
    fn pop_blocks_until_data_arrives() {
        let stage = Arc::new(StageBuffer::new(1, 1));
        let pusher = {
            let stage = Arc::clone(&stage);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                stage.push(42);
            })
        };
        // Blocks until the other thread delivers.
        match stage.pop() {
            PopOutcome::Taken(v, n) => {
                assert_eq!(v, 42);
                assert_eq!(n, 1);
            }
            PopOutcome::Drained => panic!("drained before anything was staged"),
        }
        pusher.join().unwrap();
    }

    #[test]
    fn push_blocks_until_space_frees() {
        let stage = Arc::new(StageBuffer::new(1, 2));
        stage.push(1);
        let popper = {
            let stage = Arc::clone(&stage);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                stage.pop()
            })
        };
        // Buffer is full; this blocks until the popper frees the slot.
        assert!(matches!(stage.push(2), PushOutcome::Stored(2)));
        assert!(matches!(popper.join().unwrap(), PopOutcome::Taken(1, 1)));
    }

    #[test]
    fn resident_payloads_freed_on_teardown() {
        let stage = StageBuffer::new(4, 4);
        stage.push(String::from("left behind"));
        stage.push(String::from("also left behind"));
        // Dropping the buffer drops the two resident strings.
        drop(stage);
    }

    proptest! {
        #[test]
        fn drain_preserves_order_and_counts(cap in 1..8usize, len in 0..32u64) {
            let stage = StageBuffer::new(cap, len);
            let mut seen = Vec::new();
            let mut next = 0u64;
            // Single-threaded interleaving that never overfills: top the
            // buffer up, then drain it, until the gate closes both sides.
            while stage.production_pending() || stage.consumption_pending() {
                while stage.production_pending() && stage.occupancy() < cap {
                    prop_assert!(matches!(stage.push(next), PushOutcome::Stored(_)));
                    next += 1;
                }
                loop {
                    match stage.pop() {
                        PopOutcome::Taken(v, _) => seen.push(v),
                        PopOutcome::Drained => break,
                    }
                    if stage.occupancy() == 0 {
                        break;
                    }
                }
            }
            prop_assert_eq!(seen.len() as u64, len);
            prop_assert!(seen.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(stage.counts(), (len, len));
        }
    }
}
