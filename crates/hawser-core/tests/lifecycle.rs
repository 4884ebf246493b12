//! Lifecycle semantics of the mount: pooling, retry, close.
//!
//! These tests drive the protocol-agnostic core with scripted in-memory
//! sessions; no network is involved.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hawser_core::testing::{Recorder, ScriptedFactory, transient_error};
use hawser_core::{IdleSlot, Mount, ProtocolKind, VfsError};

fn scripted_mount(recorder: &Arc<Recorder>) -> Mount {
    Mount::open_lazy(Box::new(ScriptedFactory::new(Arc::clone(recorder))))
}

#[test]
fn first_borrow_creates_then_return_caches() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 1);
    mount.give_back(session);

    // Cache hit: no new connection.
    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 1);
    mount.give_back(session);

    mount.close();
    assert_eq!(recorder.disconnected(), vec![1]);
    assert!(recorder.leaked().is_empty());
}

#[test]
fn eager_open_parks_a_session() {
    let recorder = Recorder::new();
    let mount = Mount::open(Box::new(ScriptedFactory::new(Arc::clone(&recorder)))).unwrap();
    assert_eq!(recorder.created(), 1);

    // The parked session is the one handed out.
    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 1);
    mount.give_back(session);
    mount.close();
}

#[test]
fn eager_open_fails_fast() {
    let recorder = Recorder::new();
    recorder.push_create_failure(VfsError::Auth {
        user: "alice".into(),
        endpoint: "example.org:21".into(),
    });
    let result = Mount::open(Box::new(ScriptedFactory::new(Arc::clone(&recorder))));
    assert!(matches!(result, Err(VfsError::Auth { .. })));
}

#[test]
fn concurrent_borrows_create_transient_sessions() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    let first = mount.borrow().unwrap();
    // Slot is empty while `first` is out; a concurrent caller gets a
    // fresh session rather than blocking.
    let second = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 2);

    // Both return: one is cached, the other disconnected exactly once.
    mount.give_back(first);
    mount.give_back(second);
    assert_eq!(recorder.disconnected().len(), 1);
    assert_eq!(recorder.disconnect_calls(), 1);

    mount.close();
    assert_eq!(recorder.disconnected().len(), 2);
    assert!(recorder.leaked().is_empty());
}

#[test]
fn racing_returns_cache_exactly_one() {
    let recorder = Recorder::new();
    let mount = Arc::new(scripted_mount(&recorder));

    let sessions: Vec<_> = (0..8).map(|_| mount.borrow().unwrap()).collect();
    assert_eq!(recorder.created(), 8);

    let handles: Vec<_> = sessions
        .into_iter()
        .map(|s| {
            let mount = Arc::clone(&mount);
            std::thread::spawn(move || mount.give_back(s))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Exactly one cached, the rest disconnected exactly once each.
    assert_eq!(recorder.disconnected().len(), 7);
    assert_eq!(recorder.disconnect_calls(), 7);
    mount.close();
    assert_eq!(recorder.disconnected().len(), 8);
    assert!(recorder.leaked().is_empty());
}

#[test]
fn stale_idle_session_is_discarded_at_borrow() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    let session = mount.borrow().unwrap();
    mount.give_back(session);

    // The transport drops while the session sits idle.
    recorder.mark_stale(1);
    let _fresh = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 2);
    assert_eq!(recorder.disconnected(), vec![1]);
}

#[test]
fn transient_failure_recovers_invisibly() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    recorder.push_list_outcome(Err(transient_error()));
    recorder.push_list_outcome(Ok(Vec::new()));

    let entries = mount.with_session(|s| s.list("/data")).unwrap();
    assert!(entries.is_empty());
    // The failed session was disconnected and replaced.
    assert_eq!(recorder.created(), 2);
    assert_eq!(recorder.disconnected(), vec![1]);

    // The replacement session was returned to the slot.
    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 2);
    mount.give_back(session);
    mount.close();
}

#[test]
fn second_transient_failure_propagates_without_third_attempt() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    recorder.push_list_outcome(Err(transient_error()));
    recorder.push_list_outcome(Err(transient_error()));
    // A third outcome that must never be consumed.
    recorder.push_list_outcome(Ok(Vec::new()));

    let err = mount.with_session(|s| s.list("/data")).unwrap_err();
    assert!(err.is_transient());
    assert_eq!(recorder.created(), 2);
    // Both sessions disconnected, nothing cached.
    assert_eq!(recorder.disconnected(), vec![1, 2]);
    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 3);
    mount.give_back(session);
    mount.close();
}

#[test]
fn protocol_errors_are_not_retried() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    recorder.push_list_outcome(Err(VfsError::not_found("/missing")));

    let err = mount.with_session(|s| s.list("/missing")).unwrap_err();
    assert!(matches!(
        err,
        VfsError::Protocol {
            kind: ProtocolKind::NotFound,
            ..
        }
    ));
    // No reconnect: the session was healthy and went back to the slot.
    assert_eq!(recorder.created(), 1);
    assert!(recorder.disconnected().is_empty());

    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 1);
    mount.give_back(session);
    mount.close();
}

#[test]
fn reconnect_failure_propagates_without_second_create() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    recorder.push_list_outcome(Err(transient_error()));
    recorder.push_create_failure(VfsError::Connect {
        endpoint: "example.org:21".into(),
        message: "refused".into(),
    });

    let err = mount.with_session(|s| s.list("/data")).unwrap_err();
    assert!(matches!(err, VfsError::Connect { .. }));
    // Only the original session was ever created.
    assert_eq!(recorder.created(), 1);
    assert_eq!(recorder.disconnected(), vec![1]);
}

#[test]
fn close_drains_and_freezes() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    let session = mount.borrow().unwrap();
    mount.give_back(session);
    mount.close();
    assert_eq!(recorder.disconnected(), vec![1]);

    // Borrow after close still succeeds with a throwaway session.
    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 2);
    mount.give_back(session);
    // ...but the return never repopulates the slot.
    assert_eq!(recorder.disconnected(), vec![1, 2]);

    let session = mount.borrow().unwrap();
    assert_eq!(recorder.created(), 3);
    mount.give_back(session);
    mount.close();
    assert!(recorder.leaked().is_empty());
}

#[test]
fn close_is_idempotent() {
    let recorder = Recorder::new();
    let mount = scripted_mount(&recorder);

    let session = mount.borrow().unwrap();
    mount.give_back(session);
    mount.close();
    mount.close();
    assert_eq!(recorder.disconnected(), vec![1]);
    assert_eq!(recorder.disconnect_calls(), 1);
}

#[test]
fn close_races_with_returns_without_leaking() {
    for _ in 0..50 {
        let recorder = Recorder::new();
        let mount = Arc::new(scripted_mount(&recorder));
        let sessions: Vec<_> = (0..4).map(|_| mount.borrow().unwrap()).collect();

        let go = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::new();
        for s in sessions {
            let mount = Arc::clone(&mount);
            let go = Arc::clone(&go);
            handles.push(std::thread::spawn(move || {
                while !go.load(Ordering::Acquire) {
                    std::hint::spin_loop();
                }
                mount.give_back(s);
            }));
        }
        {
            let mount = Arc::clone(&mount);
            let go = Arc::clone(&go);
            handles.push(std::thread::spawn(move || {
                while !go.load(Ordering::Acquire) {
                    std::hint::spin_loop();
                }
                mount.close();
            }));
        }
        go.store(true, Ordering::Release);
        for h in handles {
            h.join().unwrap();
        }

        // However the race resolves, every session ends up disconnected
        // exactly once and none is left cached past close.
        assert_eq!(recorder.disconnected().len(), 4);
        assert_eq!(recorder.disconnect_calls(), 4);
        assert!(recorder.leaked().is_empty());
    }
}

#[test]
fn idempotent_disconnect() {
    let recorder = Recorder::new();
    let factory = ScriptedFactory::new(Arc::clone(&recorder));
    use hawser_core::SessionFactory;
    let mut session = factory.create().unwrap();
    session.disconnect();
    session.disconnect();
    assert_eq!(recorder.disconnected(), vec![1]);
    assert_eq!(recorder.disconnect_calls(), 2);
}

mod slot_properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Take,
        Offer(u32),
        Seal,
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Take),
            any::<u32>().prop_map(Step::Offer),
            Just(Step::Seal),
        ]
    }

    proptest! {
        // Model check: the slot holds at most one value, nothing is
        // duplicated or invented, and nothing is accepted after a seal.
        #[test]
        fn single_slot_invariant(steps in proptest::collection::vec(step_strategy(), 0..64)) {
            let slot = IdleSlot::new();
            let mut model: Option<u32> = None;
            let mut sealed = false;

            for step in steps {
                match step {
                    Step::Take => {
                        prop_assert_eq!(slot.take(), model.take());
                    }
                    Step::Offer(v) => {
                        let accepted = slot.offer(v).is_ok();
                        let model_accepts = !sealed && model.is_none();
                        prop_assert_eq!(accepted, model_accepts);
                        if accepted {
                            model = Some(v);
                        }
                    }
                    Step::Seal => {
                        prop_assert_eq!(slot.seal(), model.take());
                        sealed = true;
                    }
                }
                prop_assert_eq!(slot.is_occupied(), model.is_some());
            }
        }
    }
}
