//! Completion delivery from worker threads to the event loop

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use zone_bridge::{Delivery, EventLoop, ExecuteResponse, ResponseCode};

use crate::common::{SpyScheduler, bind};

#[test]
fn async_execute_runs_callback_on_loop_thread() {
    let spy = Arc::new(SpyScheduler::new(ExecuteResponse::failure(
        ResponseCode::new(1),
        "boom",
    )));
    let (mut event_loop, zone) = bind(&spy);
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    zone.execute(&json!({ "function": "foo" }), move |decoded| {
        sink.borrow_mut()
            .push((decoded.to_value(), thread::current().id()));
    })
    .unwrap();

    spy.join_workers();
    assert!(seen.borrow().is_empty(), "callback must wait for the loop");
    assert_eq!(event_loop.pending(), 1);

    assert_eq!(event_loop.run_until_idle(), 1);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].0,
        json!({ "code": 1, "errorMessage": "boom", "returnValue": "" })
    );
    assert_eq!(seen[0].1, thread::current().id());
    assert_eq!(event_loop.pending(), 0);
}

#[test]
fn async_broadcast_delivers_code() {
    let spy = Arc::new(
        SpyScheduler::new(ExecuteResponse::default()).with_broadcast_code(ResponseCode::new(3)),
    );
    let (mut event_loop, zone) = bind(&spy);
    let seen = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&seen);
    zone.broadcast("init()", move |result| {
        *sink.borrow_mut() = Some(result.code);
    });

    spy.join_workers();
    event_loop.run_until_idle();
    assert_eq!(*seen.borrow(), Some(ResponseCode::new(3)));
}

#[test]
fn many_completions_each_delivered_once() {
    let spy = Arc::new(SpyScheduler::new(ExecuteResponse::success("1")));
    let (mut event_loop, zone) = bind(&spy);
    let count = Rc::new(RefCell::new(0));

    for _ in 0..100 {
        let count = Rc::clone(&count);
        zone.execute(&json!({ "function": "foo" }), move |_| {
            *count.borrow_mut() += 1;
        })
        .unwrap();
    }

    spy.join_workers();
    assert_eq!(event_loop.run_until_idle(), 100);
    assert_eq!(*count.borrow(), 100);
    assert_eq!(event_loop.run_until_idle(), 0);
}

#[test]
fn lost_callback_is_released_without_running() {
    let spy = Arc::new(SpyScheduler::new(ExecuteResponse::default()).losing_callbacks());
    let (mut event_loop, zone) = bind(&spy);
    let ran = Rc::new(RefCell::new(false));

    let flag = Rc::clone(&ran);
    zone.execute(&json!({ "function": "foo" }), move |_| {
        *flag.borrow_mut() = true;
    })
    .unwrap();

    spy.join_workers();
    event_loop.run_until_idle();
    assert!(!*ran.borrow());
    assert_eq!(event_loop.pending(), 0);
}

#[test]
fn dispatch_after_loop_dropped_is_reported() {
    let event_loop = EventLoop::new();
    let handle = event_loop
        .bridge()
        .register(|_: u32| {}, |value: u32| value + 1);
    drop(event_loop);

    let worker = thread::spawn(move || handle.dispatch(1));
    assert_eq!(worker.join().unwrap(), Delivery::Dropped);
}

#[test]
fn second_dispatch_is_ignored() {
    let mut event_loop = EventLoop::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    let handle = event_loop
        .bridge()
        .register(move |v: String| sink.borrow_mut().push(v), |v: u32| v.to_string());

    let worker = handle.clone();
    let outcomes = thread::spawn(move || (worker.dispatch(1), worker.dispatch(2)))
        .join()
        .unwrap();
    assert_eq!(outcomes, (Delivery::Posted, Delivery::AlreadyDispatched));

    event_loop.run_until_idle();
    assert_eq!(*calls.borrow(), vec!["1".to_string()]);
}

#[tokio::test]
async fn tick_waits_for_worker_completion() {
    let mut event_loop = EventLoop::new();
    let got = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&got);
    let handle = event_loop
        .bridge()
        .register(move |v: u64| *sink.borrow_mut() = Some(v), |v: u64| v * 2);

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.dispatch(21);
    });

    tokio::time::timeout(Duration::from_secs(5), event_loop.tick())
        .await
        .unwrap();
    assert_eq!(*got.borrow(), Some(42));
}
