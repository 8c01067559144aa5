//! End-to-end runs against the in-process scheduler

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use zone_bridge::{BridgeError, EventLoop, Zone, ZoneError, ZoneHandle, ZoneScheduler, ZoneSettings};
use zone_local::{FunctionRegistry, LocalScheduler, codes};

fn registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .register("math", "add", |args| {
            let sum: i64 = args
                .iter()
                .map(|a| a.parse::<i64>().map_err(|e| e.to_string()))
                .sum::<Result<i64, String>>()?;
            Ok(sum.to_string())
        })
        .register("", "greet", |args| {
            let name = args.first().map_or("world", String::as_str);
            serde_json::to_string(&format!("hello {name}")).map_err(|e| e.to_string())
        })
        .register("", "slow", |_| {
            std::thread::sleep(Duration::from_millis(500));
            Ok("null".to_string())
        })
}

fn zone(scheduler: &Arc<LocalScheduler>, event_loop: &EventLoop, settings: ZoneSettings) -> Zone {
    Zone::create(
        Arc::clone(scheduler) as Arc<dyn ZoneScheduler>,
        event_loop.bridge(),
        "local",
        settings,
    )
    .unwrap()
}

#[test]
fn sync_execute_returns_structured_value() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let event_loop = EventLoop::new();
    let zone = zone(&scheduler, &event_loop, ZoneSettings::new());

    let decoded = zone
        .execute_sync(&json!({ "module": "math", "function": "add", "arguments": [2, "40"] }))
        .unwrap();
    assert_eq!(
        decoded.to_value(),
        json!({ "code": 0, "errorMessage": "", "returnValue": 42 })
    );

    let decoded = zone
        .execute_sync(&json!({ "function": "greet", "arguments": ["zone"] }))
        .unwrap();
    assert_eq!(decoded.return_value, json!("hello zone"));
}

#[test]
fn unknown_function_reports_not_found_code() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let event_loop = EventLoop::new();
    let zone = zone(&scheduler, &event_loop, ZoneSettings::new());

    let decoded = zone
        .execute_sync(&json!({ "module": "math", "function": "mul" }))
        .unwrap();
    assert_eq!(decoded.code, codes::FUNCTION_NOT_FOUND);
    assert_eq!(decoded.return_value, json!(""));
}

#[test]
fn repeated_settings_resolve_last_wins() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let event_loop = EventLoop::new();
    let settings = ZoneSettings::new().with("workers", "4").with("workers", "1");
    let zone = zone(&scheduler, &event_loop, settings);

    assert_eq!(scheduler.workers(zone.handle()), Some(1));
}

#[test]
fn duplicate_zone_is_rejected() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let event_loop = EventLoop::new();
    let _first = zone(&scheduler, &event_loop, ZoneSettings::new());

    let err = Zone::create(
        Arc::clone(&scheduler) as Arc<dyn ZoneScheduler>,
        event_loop.bridge(),
        "local",
        ZoneSettings::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Zone(ZoneError::AlreadyExists { ref id }) if id == "local"
    ));

    let bound = Zone::get(
        Arc::clone(&scheduler) as Arc<dyn ZoneScheduler>,
        event_loop.bridge(),
        "local",
    )
    .unwrap();
    assert_eq!(bound.handle(), &ZoneHandle::new("local"));
}

#[test]
fn broadcast_runs_on_every_worker() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let scheduler = Arc::new(LocalScheduler::new(FunctionRegistry::new().on_broadcast(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    )));
    let event_loop = EventLoop::new();
    let zone = zone(
        &scheduler,
        &event_loop,
        ZoneSettings::from_json(&json!({ "workers": 3 })).unwrap(),
    );

    assert!(zone.broadcast_sync("setup()").code.is_success());
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn async_execute_completes_through_loop() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let mut event_loop = EventLoop::new();
    let zone = zone(&scheduler, &event_loop, ZoneSettings::new());
    let results = Rc::new(RefCell::new(Vec::new()));

    for (a, b) in [(1, 2), (20, 22)] {
        let sink = Rc::clone(&results);
        zone.execute(
            &json!({ "module": "math", "function": "add", "arguments": [a, b] }),
            move |decoded| sink.borrow_mut().push(decoded.return_value),
        )
        .unwrap();
    }

    while event_loop.pending() > 0 {
        tokio::time::timeout(Duration::from_secs(5), event_loop.tick())
            .await
            .unwrap();
    }

    let mut values = results.borrow().clone();
    values.sort_by_key(|v| v.as_i64());
    assert_eq!(values, vec![json!(3), json!(42)]);
}

#[tokio::test]
async fn timeout_is_reported_as_completion_data() {
    let scheduler = Arc::new(LocalScheduler::new(registry()));
    let mut event_loop = EventLoop::new();
    let zone = zone(&scheduler, &event_loop, ZoneSettings::new());
    let result = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&result);
    zone.execute(
        &json!({ "function": "slow", "timeout": 20 }),
        move |decoded| *sink.borrow_mut() = Some(decoded),
    )
    .unwrap();

    tokio::time::timeout(Duration::from_secs(5), event_loop.tick())
        .await
        .unwrap();
    let decoded = result.borrow_mut().take().unwrap();
    assert_eq!(decoded.code, codes::TIMEOUT);
    assert!(decoded.error_message.contains("timed out"));
}
