//! Resource discipline: every payload is released exactly once, including
//! payloads still resident when the buffer is torn down early.

use matstage::stage::{PopOutcome, PushOutcome, StageBuffer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

/// Payload double that records its own drop against a shared ledger.
struct Tracked {
    id: u64,
    ledger: Arc<Mutex<HashMap<u64, u32>>>,
}

impl Tracked {
    fn new(id: u64, ledger: &Arc<Mutex<HashMap<u64, u32>>>) -> Self {
        Self {
            id,
            ledger: Arc::clone(ledger),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        *self.ledger.lock().unwrap().entry(self.id).or_insert(0) += 1;
    }
}

#[test]
fn every_payload_dropped_exactly_once_across_a_full_run() {
    const TARGET: u64 = 200;
    let ledger = Arc::new(Mutex::new(HashMap::new()));
    let stage = Arc::new(StageBuffer::new(4, TARGET));

    let producer = {
        let stage = Arc::clone(&stage);
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            let mut id = 0;
            while stage.production_pending() {
                match stage.push(Tracked::new(id, &ledger)) {
                    PushOutcome::Stored(_) => id += 1,
                    PushOutcome::Refused(item) => {
                        drop(item);
                        break;
                    }
                }
            }
        })
    };
    let consumer = {
        let stage = Arc::clone(&stage);
        thread::spawn(move || loop {
            match stage.pop() {
                PopOutcome::Taken(item, _) => drop(item),
                PopOutcome::Drained => break,
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();
    drop(stage);

    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.len() as u64, TARGET);
    for (id, drops) in ledger.iter() {
        assert_eq!(*drops, 1, "payload {} dropped {} times", id, drops);
    }
}

#[test]
fn resident_payloads_released_when_buffer_is_torn_down() {
    // Early shutdown: three payloads staged, none consumed. Dropping the
    // buffer must release each exactly once.
    let ledger = Arc::new(Mutex::new(HashMap::new()));
    let stage = StageBuffer::new(4, 10);
    for id in 0..3 {
        assert!(matches!(
            stage.push(Tracked::new(id, &ledger)),
            PushOutcome::Stored(_)
        ));
    }
    assert!(ledger.lock().unwrap().is_empty());

    drop(stage);

    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.len(), 3);
    assert!(ledger.values().all(|&drops| drops == 1));
}

#[test]
fn popped_payload_is_no_longer_owned_by_the_buffer() {
    let ledger = Arc::new(Mutex::new(HashMap::new()));
    let stage = StageBuffer::new(2, 2);
    stage.push(Tracked::new(0, &ledger));

    match stage.pop() {
        PopOutcome::Taken(item, _) => drop(item),
        PopOutcome::Drained => panic!("drained before target"),
    }
    drop(stage);

    // One drop from the consumer side, none from teardown.
    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.get(&0), Some(&1));
}
