use delegation_kernel::verify::{index_view_hash, registry_state_hash};
use delegation_kernel::{Address, RejectionReason, SpaceId};
use delegation_node::events::event_log::collect_events;
use delegation_node::events::{rebuild_index, recover_registry, EventLog, MemoryEventLog};
use delegation_node::{Engine, NodeConfig};
use std::sync::Arc;
use std::thread;

fn addr(b: u8) -> Address {
    Address([b; 20])
}

fn shared_engine() -> (Arc<Engine>, Arc<MemoryEventLog>) {
    let log = Arc::new(MemoryEventLog::new());
    let engine = Engine::with_log(
        NodeConfig::default(),
        log.clone(),
        Arc::new(delegation_node::clock::SystemClock),
    )
    .unwrap();
    (Arc::new(engine), log)
}

#[test]
fn test_distinct_keys_produce_gap_free_log() {
    let (engine, log) = shared_engine();
    let threads = 8u8;
    let per_thread = 50u8;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let delegator = addr(100 + t);
                let space = SpaceId::from_label("shared");
                for i in 0..per_thread {
                    engine.set_delegate(delegator, space, addr(i + 1)).unwrap();
                    if i % 5 == 4 {
                        engine.clear_delegate(delegator, space, addr(i)).unwrap();
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let events = collect_events(log.replay_from(0).unwrap()).unwrap();
    let per_thread_events = per_thread as u64 + per_thread as u64 / 5;
    assert_eq!(events.len() as u64, threads as u64 * per_thread_events);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.sequence, i as u64);
    }

    // Replay equals the live store and the live index.
    let replayed = recover_registry(log.as_ref()).unwrap();
    assert_eq!(replayed, engine.store().to_state());
    let rebuilt = rebuild_index(log.as_ref()).unwrap();
    assert_eq!(index_view_hash(&rebuilt), engine.index().read().view_hash());
    assert_eq!(registry_state_hash(&replayed), registry_state_hash(&engine.store().to_state()));

    for t in 0..threads {
        let total = engine.get_total_delegates(&addr(100 + t), &SpaceId::from_label("shared"));
        assert_eq!(total, (per_thread - per_thread / 5) as usize);
    }
}

#[test]
fn test_same_key_is_linearized() {
    let (engine, log) = shared_engine();
    let delegator = addr(1);
    let space = SpaceId::from_label("contended");

    // Every thread races to add the same delegates; each must land once.
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut won = 0usize;
                for b in 10..40u8 {
                    match engine.set_delegate(delegator, space, addr(b)) {
                        Ok(_) => won += 1,
                        Err(e) => assert_eq!(e.rejection(), Some(RejectionReason::DuplicateDelegate)),
                    }
                }
                won
            })
        })
        .collect();

    let won: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(won, 30);
    assert_eq!(engine.get_total_delegates(&delegator, &space), 30);
    assert_eq!(log.next_sequence(), 30);
    assert_eq!(engine.list_active_delegates(&delegator, &space).len(), 30);
}

#[test]
fn test_concurrent_clear_all_and_set() {
    let (engine, log) = shared_engine();
    let delegator = addr(1);
    let space = SpaceId::from_label("mixed");

    let setter = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for b in 2..100u8 {
                engine.set_delegate(delegator, space, addr(b)).unwrap();
            }
        })
    };
    let clearer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..20 {
                engine.clear_all_delegates(delegator, space).unwrap();
            }
        })
    };
    setter.join().unwrap();
    clearer.join().unwrap();

    // Whatever the interleaving, store, index and replay agree.
    let report = engine.verify().unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.log_head, 98 + 20);
    assert_eq!(
        engine.get_total_delegates(&delegator, &space),
        engine.list_active_delegates(&delegator, &space).len()
    );
    assert_eq!(log.next_sequence(), 118);
}
