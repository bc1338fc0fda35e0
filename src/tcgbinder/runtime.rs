//! # Main Context and Workers
//!
//! All binder state lives on one thread, the *main context*. It is never
//! preempted mid-mutation, so the store, layout, move and filter engines need
//! no locks.
//!
//! Anything slow (catalog queries, image downloads, the cache sweep, debounce
//! timers) runs on its own thread and never touches that state. When it is
//! done it *posts* a task back through a [`Poster`]; the main context runs
//! posted tasks in arrival order from [`MainContext::run_pending`] or
//! [`MainContext::run_until`].
//!
//! Two helpers sit on top of that:
//!
//! - [`RequestGuard`] issues a [`RequestToken`] per catalog request. A result
//!   is applied only if its token is still the latest one, so a slow stale
//!   response can never overwrite a newer one.
//! - [`Debouncer`] owns a [`TimerHandle`]. Each new schedule cancels the
//!   previous timer; only a timer that survives uncancelled runs its action.

use crate::error::{BinderError, Result};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A unit of work for the main context.
pub type Task<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// The queue of tasks waiting for the main context.
pub struct MainContext<T> {
    tx: Sender<Task<T>>,
    rx: Receiver<Task<T>>,
}

impl<T: 'static> Default for MainContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> MainContext<T> {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    pub fn poster(&self) -> Poster<T> {
        Poster {
            tx: self.tx.clone(),
        }
    }

    /// Runs every task already queued, without waiting. Returns how many ran.
    pub fn run_pending(&self, state: &mut T) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(state);
            ran += 1;
        }
        ran
    }

    /// Runs tasks as they arrive until `done` holds or `timeout` passes.
    /// Returns whether `done` was reached.
    pub fn run_until<F>(&self, state: &mut T, done: F, timeout: Duration) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let deadline = Instant::now() + timeout;
        self.run_pending(state);
        while !done(state) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.rx.recv_timeout(deadline - now) {
                Ok(task) => task(state),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return done(state)
                }
            }
        }
        true
    }
}

/// The sending half of the main context, handed to workers and timers.
pub struct Poster<T> {
    tx: Sender<Task<T>>,
}

impl<T> Clone for Poster<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: 'static> Poster<T> {
    /// Schedules `task` on the main context. Returns false if the main
    /// context is gone.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }
}

/// Runs `job` on a named thread and posts `apply` with its output back to the
/// main context.
pub fn spawn_worker<T, R, J, A>(poster: &Poster<T>, name: &str, job: J, apply: A) -> Result<()>
where
    T: 'static,
    R: Send + 'static,
    J: FnOnce() -> R + Send + 'static,
    A: FnOnce(&mut T, R) + Send + 'static,
{
    let poster = poster.clone();
    let label = name.to_string();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let output = job();
            if !poster.post(move |state| apply(state, output)) {
                debug!("Main context closed, dropping result of {}", label);
            }
        })
        .map(|_| ())
        .map_err(BinderError::Io)
}

/// Identifies one catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// Monotonic request generations for one context (e.g. the search pane).
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: u64,
}

impl RequestGuard {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

/// Cancellation flag of one scheduled timer.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Cancel-and-reschedule debounce owned by a filter context.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels the pending timer, if any, and starts a new one that runs
    /// `action` on the main context after the quiet period.
    pub fn schedule<T, F>(&mut self, poster: &Poster<T>, action: F) -> Result<()>
    where
        T: 'static,
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.cancel();
        let handle = TimerHandle::default();
        let timer = handle.clone();
        let poster = poster.clone();
        let delay = self.delay;

        thread::Builder::new()
            .name("filter-debounce".to_string())
            .spawn(move || {
                thread::sleep(delay);
                if timer.is_cancelled() {
                    return;
                }
                // Re-checked on the main context: a newer edit may have
                // cancelled this timer while the task sat in the queue.
                poster.post(move |state| {
                    if !timer.is_cancelled() {
                        action(state);
                    }
                });
            })
            .map_err(BinderError::Io)?;

        self.pending = Some(handle);
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
