//! Completion bridge: one-shot delivery from a worker thread to the loop thread.
//!
//! [`CompletionBridge::register`] parks the user callback in a table owned by
//! the embedding thread and hands back a [`CompletionHandle`]. The handle is
//! `Send + Sync` and carries only an id, the conversion function and a post
//! handle to the loop's queue, so callbacks themselves never need to be `Send`.
//!
//! `dispatch` converts the value on the calling thread and posts the result.
//! The callback runs later, when the owning [`EventLoop`](crate::EventLoop)
//! drains its queue. It is never invoked inline on the worker.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

type Payload = Box<dyn Any + Send>;
type ParkedCallback = Box<dyn FnOnce(Payload)>;
type Converter<T> = Box<dyn Fn(T) -> Payload + Send + Sync>;

/// Work posted to the loop thread.
pub(crate) enum LoopTask {
    /// Invoke the parked callback with already-converted arguments.
    Complete { id: u64, args: Payload },
    /// Every handle for `id` was dropped without a dispatch.
    Abandon { id: u64 },
}

/// Result of [`CompletionHandle::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the loop thread.
    Posted,
    /// The loop is gone; the callback will never run.
    Dropped,
    /// This handle was already dispatched. Nothing was posted.
    AlreadyDispatched,
}

struct BridgeInner {
    poster: mpsc::UnboundedSender<LoopTask>,
    next_id: Cell<u64>,
    parked: RefCell<HashMap<u64, ParkedCallback>>,
    /// Set once the owning loop is dropped. Nothing parks after that.
    closed: Cell<bool>,
}

/// Registers callbacks that will run on the loop thread.
///
/// Obtained from [`EventLoop::bridge`](crate::EventLoop::bridge). Cloning is
/// cheap; all clones share one callback table. Not `Send`: registration and
/// invocation both happen on the loop thread.
#[derive(Clone)]
pub struct CompletionBridge {
    inner: Rc<BridgeInner>,
}

impl CompletionBridge {
    pub(crate) fn new(poster: mpsc::UnboundedSender<LoopTask>) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                poster,
                next_id: Cell::new(1),
                parked: RefCell::new(HashMap::new()),
                closed: Cell::new(false),
            }),
        }
    }

    /// Park `callback` and return the handle a worker uses to complete it.
    ///
    /// The callback stays alive until it has been invoked (or its handle is
    /// abandoned), independent of whoever called `register`.
    pub fn register<T, A, C, F>(&self, callback: C, convert: F) -> CompletionHandle<T>
    where
        T: 'static,
        A: Send + 'static,
        C: FnOnce(A) + 'static,
        F: Fn(T) -> A + Send + Sync + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let parked: ParkedCallback = Box::new(move |payload: Payload| {
            match payload.downcast::<A>() {
                Ok(args) => callback(*args),
                Err(_) => tracing::error!(id, "Completion payload had an unexpected type"),
            }
        });
        if self.inner.closed.get() {
            tracing::warn!(id, "Event loop closed; completion callback will not run");
        } else {
            self.inner.parked.borrow_mut().insert(id, parked);
        }

        CompletionHandle {
            inner: Arc::new(PendingCompletion {
                id,
                convert: Box::new(move |value| Box::new(convert(value)) as Payload),
                dispatched: AtomicBool::new(false),
                poster: self.inner.poster.clone(),
            }),
        }
    }

    /// Number of callbacks registered but not yet invoked or released.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.parked.borrow().len()
    }

    /// Release every parked callback without running it. Called when the
    /// owning loop is dropped; clones held elsewhere stay usable but inert.
    pub(crate) fn close(&self) {
        self.inner.closed.set(true);
        // Take the table first: dropping a callback may drop handles that post.
        let released = std::mem::take(&mut *self.inner.parked.borrow_mut());
        if !released.is_empty() {
            tracing::warn!(
                count = released.len(),
                "Event loop dropped; releasing pending callbacks"
            );
        }
        drop(released);
    }

    /// Run a task on the loop thread.
    pub(crate) fn run(&self, task: LoopTask) {
        match task {
            LoopTask::Complete { id, args } => {
                // Take the callback out before calling it: it may register more.
                let callback = self.inner.parked.borrow_mut().remove(&id);
                match callback {
                    Some(callback) => callback(args),
                    None => tracing::warn!(id, "Completion arrived for an unknown callback"),
                }
            }
            LoopTask::Abandon { id } => {
                let released = self.inner.parked.borrow_mut().remove(&id);
                if released.is_some() {
                    tracing::warn!(id, "Completion handle dropped without dispatch");
                }
            }
        }
    }
}

struct PendingCompletion<T> {
    id: u64,
    convert: Converter<T>,
    dispatched: AtomicBool,
    poster: mpsc::UnboundedSender<LoopTask>,
}

impl<T> Drop for PendingCompletion<T> {
    fn drop(&mut self) {
        if !self.dispatched.load(Ordering::Acquire) {
            // Loop may already be gone; then the table goes with it.
            let _ = self.poster.send(LoopTask::Abandon { id: self.id });
        }
    }
}

/// Worker-side end of a registered completion.
///
/// Clone it freely into scheduler closures; all clones share one delivery
/// slot. Exactly one `dispatch` per registration is the contract.
pub struct CompletionHandle<T> {
    inner: Arc<PendingCompletion<T>>,
}

impl<T> Clone for CompletionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for CompletionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("id", &self.inner.id)
            .field("dispatched", &self.inner.dispatched.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> CompletionHandle<T> {
    /// Convert `value` and post the callback invocation to the loop thread.
    ///
    /// Callable from any thread. A second call is a caller bug: it is logged
    /// and ignored, and the callback still runs only once.
    pub fn dispatch(&self, value: T) -> Delivery {
        let pending = &self.inner;
        if pending.dispatched.swap(true, Ordering::AcqRel) {
            tracing::error!(id = pending.id, "Completion dispatched more than once");
            return Delivery::AlreadyDispatched;
        }

        let args = (pending.convert)(value);
        match pending.poster.send(LoopTask::Complete {
            id: pending.id,
            args,
        }) {
            Ok(()) => Delivery::Posted,
            Err(_) => {
                tracing::warn!(
                    id = pending.id,
                    "Event loop closed; completion callback will not run"
                );
                Delivery::Dropped
            }
        }
    }
}
