//! Integration tests for common Herald workflows.
//!
//! These tests drive the registry, events and component store together the
//! way an application would.

use herald::prelude::*;
use herald::{DispatchError, EventKey};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

// =============================================================================
// Helpers
// =============================================================================

fn counter() -> (Arc<AtomicU32>, Callback<()>) {
    let hits = Arc::new(AtomicU32::new(0));
    let sink = hits.clone();
    let callback = Callback::action(move || {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    (hits, callback)
}

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback<()>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let make = move |name: &'static str| {
        let sink = sink.clone();
        Callback::action(move || sink.lock().unwrap().push(name))
    };
    (log, make)
}

struct Turret {
    firing: AtomicBool,
    shots: AtomicU32,
}

impl Turret {
    fn idle() -> Self {
        Self {
            firing: AtomicBool::new(false),
            shots: AtomicU32::new(0),
        }
    }
}

impl Reflect for Turret {
    fn register_methods(methods: &mut MethodTableBuilder<Self>) {
        methods
            .method("activate", |turret| {
                turret.firing.store(true, Ordering::SeqCst);
                Ok(())
            })
            .method_with("fire", "rounds", |turret, rounds: &u32| {
                turret.shots.fetch_add(*rounds, Ordering::SeqCst);
                Ok(())
            });
    }
}

// =============================================================================
// Registry Workflows
// =============================================================================

#[test]
fn test_jump_lifecycle() {
    let host = Host::new();
    let registry = host.registry();
    let (hits, jump) = counter();

    assert!(registry.is_empty());

    registry.add_listener("jump", jump.clone());
    assert!(registry.contains("jump"));
    assert_eq!(registry.listeners("jump").unwrap(), vec![jump.clone()]);

    registry.invoke("jump", false).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    assert!(registry.remove_listener("jump", &jump).unwrap());
    registry.invoke("jump", false).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(registry.contains("jump"));

    registry.remove_event("jump").unwrap();
    let err = registry.invoke("jump", false).unwrap_err();
    assert!(matches!(err, EventError::UnknownEvent(ref key) if key == "jump"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_idempotent_add_event() {
    let registry: EventRegistry = EventRegistry::new();
    let (hits, callback) = counter();

    registry.add_event("spawn", EventKind::Signal);
    registry.add_listener("spawn", callback);
    registry.add_event("spawn", EventKind::Signal);

    registry.invoke("spawn", false).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_namespace_separation() {
    let registry: EventRegistry<u32> = EventRegistry::new();
    let (signal_hits, signal_cb) = counter();
    let total = Arc::new(AtomicU32::new(0));
    let sink = total.clone();

    registry.add_event("x", EventKind::Signal);
    registry.add_event("x", EventKind::Parameterized);
    registry.add_listener("x", signal_cb);
    registry.add_parameter_listener(
        "x",
        Callback::from_fn(move |n: &u32| {
            sink.fetch_add(*n, Ordering::SeqCst);
        }),
    );

    registry.invoke_with("x", &7, false).unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 7);
    assert_eq!(signal_hits.load(Ordering::SeqCst), 0);

    registry.invoke("x", false).unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 7);
    assert_eq!(signal_hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_round_trip_add_remove() {
    let registry: EventRegistry = EventRegistry::new();
    let keys = ["a", "b", "c"];

    for key in keys {
        let (_, callback) = counter();
        registry.add_listener(key, callback.clone());
        registry.remove_listener(key, &callback).unwrap();
        assert!(!registry.is_listening(key, &callback));
    }
}

#[test]
fn test_reverse_order() {
    let registry: EventRegistry = EventRegistry::new();
    let (log, make) = recorder();

    for name in ["A", "B", "C"] {
        registry.add_listener("ordered", make(name));
    }
    registry.invoke("ordered", false).unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["C", "B", "A"]);
}

#[test]
fn test_forwarding_chain_sees_late_listeners() {
    let (log, make) = recorder();
    let first: Signal = Event::new("first");
    let second: Signal = Event::new("second");

    first.add_event_listener(&second);
    second.add_listener(make("late"));
    first.add_listener(make("own"));

    first.fire().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["own", "late"]);
}

#[test]
fn test_registered_events_merge_by_id() {
    let registry: EventRegistry = EventRegistry::new();
    let (log, make) = recorder();

    registry.register_event(Event::new("door").with_listener(make("first")));
    registry.register_event(Event::new("door").with_listener(make("second")));

    registry.invoke("door", false).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    assert_eq!(Event::<()>::new("door").event_key(), "door");
}

#[test]
fn test_create_if_missing() {
    let registry: EventRegistry = EventRegistry::new();

    assert!(registry.invoke("later", false).is_err());
    assert!(!registry.contains("later"));

    registry.invoke("later", true).unwrap();
    assert!(registry.contains("later"));
}

// =============================================================================
// Bindings and Components
// =============================================================================

#[test]
fn test_stale_target_resilience() {
    let host = Host::new();
    let owner = ObjectId::new();
    let (hits, plain) = counter();

    let doomed = host.components().insert(owner, Turret::idle());
    let survivor = host.components().insert(ObjectId::new(), Turret::idle());

    for id in [doomed, survivor] {
        let binding = host.components().bind(BindingDescriptor::new(id, "activate"));
        host.registry().add_binding("alarm", binding);
    }
    host.registry().add_listener("alarm", plain);

    host.components().destroy_object(owner);
    host.registry().invoke("alarm", false).unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let survivor = host.components().get::<Turret>(survivor).unwrap();
    assert!(survivor.firing.load(Ordering::SeqCst));

    let event = host.registry().get_event("alarm").unwrap();
    assert_eq!(event.bindings().len(), 1);
    assert_eq!(host.registry().listener_count("alarm"), 2);
}

#[test]
fn test_descriptor_from_json() {
    let host = Host::new();
    let owner = ObjectId::new();
    let id = host.components().insert(owner, Turret::idle());

    let json = serde_json::json!({
        "targetObject": owner,
        "targetComponent": id,
        "methodName": "fire(u32 rounds)",
        "selectedComponentIndex": 0,
        "selectedMethodIndex": 1,
    });
    let descriptor: BindingDescriptor = serde_json::from_value(json).unwrap();

    let volley: Event<u32> = Event::new("volley");
    volley.add_binding(host.components().bind(descriptor));
    volley.invoke(&3).unwrap();
    volley.invoke(&2).unwrap();

    let turret = host.components().get::<Turret>(id).unwrap();
    assert_eq!(turret.shots.load(Ordering::SeqCst), 5);
}

#[test]
fn test_edit_binding_applies_next_invoke() {
    let host = Host::new();
    let id = host.components().insert(ObjectId::new(), Turret::idle());
    let volley: Event<u32> = Event::new("volley");

    let binding = host.components().bind(BindingDescriptor::new(id, "missing"));
    let uid = binding.uid();
    volley.add_binding(binding);
    assert!(volley.edit_binding(uid, |b| b.set_method_name("fire")));

    volley.invoke(&4).unwrap();
    let turret = host.components().get::<Turret>(id).unwrap();
    assert_eq!(turret.shots.load(Ordering::SeqCst), 4);
}

// =============================================================================
// Failure Policy
// =============================================================================

#[test]
fn test_failures_are_reported_after_broadcast() {
    let registry: EventRegistry = EventRegistry::new();
    let (hits, counted) = counter();

    registry.add_listener("risky", counted);
    registry.add_listener(
        "risky",
        Callback::new(|_: &()| Err(ListenerError::failed("first"))),
    );
    registry.add_listener("risky", Callback::action(|| panic!("second")));

    let err = registry.invoke("risky", false).unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    match err {
        EventError::Dispatch(DispatchError::ListenersFailed { failures, .. }) => {
            assert_eq!(failures.len(), 2);
            assert!(matches!(failures[0], ListenerError::Panicked(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_forwarding_loop_is_skipped() {
    let (hits, counted) = counter();
    let ping: Signal = Event::new("ping");
    let pong: Signal = Event::new("pong");

    ping.add_event_listener(&pong);
    pong.add_event_listener(&ping);
    pong.add_listener(counted);

    ping.fire().unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_registry_use() {
    let host = Host::new();
    let hits = Arc::new(AtomicU32::new(0));

    thread::scope(|scope| {
        for worker in 0..4 {
            let registry = host.registry().clone();
            let hits = hits.clone();
            scope.spawn(move || {
                for round in 0..100 {
                    let sink = hits.clone();
                    let callback = Callback::action(move || {
                        sink.fetch_add(1, Ordering::SeqCst);
                    });
                    let key = format!("shared-{}", round % 3);
                    registry.add_listener(&key, callback.clone());
                    registry.invoke(&key, false).unwrap();
                    assert!(registry.remove_listener(&key, &callback).unwrap());
                }
                worker
            });
        }
    });

    assert!(hits.load(Ordering::SeqCst) >= 400);
    for key in host.registry().keys() {
        assert_eq!(host.registry().listener_count(&key), 0);
    }
}
