//! # Concurrent Lifecycle Requests
//!
//! Constraint checks run inside the committing transaction, so two
//! concurrent requests cannot both pass a check that only one of them may
//! pass.

use std::sync::Arc;
use std::thread;

use fleet_core::{AccountId, Role, Timestamp};
use fleet_lifecycle::{
    Account, LifecycleConfig, LifecycleEngine, LifecycleState, LifecycleStore, MemorySessionStore,
    MemoryStore, Rejection, Transition, TransitionRequest, Violation,
};

fn engine() -> (LifecycleEngine<MemoryStore>, MemoryStore) {
    let store = MemoryStore::new();
    let engine = LifecycleEngine::new(
        store.clone(),
        Arc::new(MemorySessionStore::new()),
        &LifecycleConfig::default(),
    );
    (engine, store)
}

fn admin(store: &MemoryStore) -> AccountId {
    let account = Account::new(AccountId::new(), "admin", Role::Administrator, Timestamp::now());
    let id = account.id;
    store.insert_account(account);
    id
}

#[test]
fn two_admins_deactivating_each_other_leave_one_active() {
    for _ in 0..50 {
        let (engine, store) = engine();
        let a1 = admin(&store);
        let a2 = admin(&store);

        let (r1, r2) = thread::scope(|s| {
            let h1 = s.spawn(|| {
                engine.request_transition(TransitionRequest::new(a1, a2, Transition::DEACTIVATE))
            });
            let h2 = s.spawn(|| {
                engine.request_transition(TransitionRequest::new(a2, a1, Transition::DEACTIVATE))
            });
            (h1.join().unwrap().unwrap(), h2.join().unwrap().unwrap())
        });

        let committed = [&r1, &r2].iter().filter(|o| o.is_committed()).count();
        assert_eq!(committed, 1, "{r1:?} / {r2:?}");

        let loser = if r1.is_committed() { &r2 } else { &r1 };
        assert_eq!(
            loser.rejection(),
            Some(&Rejection::ConstraintViolation(Violation::LastAdministrator {
                other_active_administrators: 0,
            }))
        );

        let active_admins = [a1, a2]
            .iter()
            .filter(|id| store.account(id).unwrap().unwrap().state == LifecycleState::Active)
            .count();
        assert_eq!(active_admins, 1);
        assert_eq!(store.audit_log().unwrap().len(), 2);
    }
}

#[test]
fn concurrent_requests_produce_a_gapless_chain() {
    let (engine, store) = engine();
    let actors: Vec<AccountId> = (0..4).map(|_| admin(&store)).collect();

    thread::scope(|s| {
        for actor in &actors {
            let engine = &engine;
            s.spawn(move || {
                for _ in 0..10 {
                    let outcome = engine
                        .request_transition(TransitionRequest::new(*actor, *actor, Transition::DEACTIVATE))
                        .unwrap();
                    assert!(!outcome.is_committed());
                }
            });
        }
    });

    let log = store.audit_log().unwrap();
    assert_eq!(log.len(), 40);
    let seqs: Vec<u64> = log.iter().map(|e| e.sequence).collect();
    assert_eq!(seqs, (1..=40).collect::<Vec<u64>>());
    assert!(fleet_lifecycle::verify_chain(&log).unwrap().is_valid());
}
