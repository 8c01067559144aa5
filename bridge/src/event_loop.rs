//! The embedding thread's task queue.
//!
//! Workers never touch embedding-thread state directly; they post tasks here
//! through a [`CompletionHandle`](crate::CompletionHandle). The thread that
//! owns the [`EventLoop`] drains the queue with [`EventLoop::poll`] (non-blocking,
//! budgeted) or awaits the next task with [`EventLoop::tick`].

use tokio::sync::mpsc;

use crate::completion::{CompletionBridge, LoopTask};

/// Default number of tasks [`EventLoop::run_until_idle`] drains per pass.
pub const DEFAULT_POLL_BUDGET: usize = 64;

pub struct EventLoop {
    rx: mpsc::UnboundedReceiver<LoopTask>,
    bridge: CompletionBridge,
    budget: usize,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_POLL_BUDGET)
    }

    /// Create a loop whose `run_until_idle` drains `budget` tasks per pass.
    #[must_use]
    pub fn with_budget(budget: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            bridge: CompletionBridge::new(tx),
            budget: budget.max(1),
        }
    }

    /// Bridge whose callbacks run on this loop.
    #[must_use]
    pub fn bridge(&self) -> CompletionBridge {
        self.bridge.clone()
    }

    /// Drain pending tasks, up to `budget`.
    ///
    /// Non-blocking: returns immediately if nothing is queued.
    /// Returns the number of tasks run.
    pub fn poll(&mut self, budget: usize) -> usize {
        let mut count = 0;
        while count < budget {
            match self.rx.try_recv() {
                Ok(task) => {
                    self.bridge.run(task);
                    count += 1;
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        count
    }

    /// Poll until the queue is empty, including tasks posted by callbacks
    /// that ran during this call.
    pub fn run_until_idle(&mut self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.poll(self.budget);
            if ran == 0 {
                return total;
            }
            total += ran;
        }
    }

    /// Wait for the next task and run it.
    ///
    /// The queue never closes while the loop is alive: its own bridge holds a
    /// sender. With nothing in flight this waits forever; check
    /// [`pending`](Self::pending) first.
    pub async fn tick(&mut self) {
        if let Some(task) = self.rx.recv().await {
            self.bridge.run(task);
        }
    }

    /// Number of registered callbacks still waiting for their completion.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.bridge.pending()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.bridge.close();
    }
}
