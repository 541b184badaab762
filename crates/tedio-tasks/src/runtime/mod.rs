//! Single-threaded cooperative runtime.
//!
//! Every future runs on the thread calling [`Runtime::block_on`]. Tasks only
//! give up control at their own suspension points: timers ([`sleep`]) and
//! explicit yields ([`yield_now`]). One scheduler tick:
//!
//! 1. fires expired timers, waking their tasks in deadline order;
//! 2. wakes the tasks that yielded during the previous tick;
//! 3. polls the root future if it was woken;
//! 4. polls every task queued at that point, in wake order.
//!
//! A task woken by a timer therefore runs before a task that merely yielded.

mod executor;
mod join;
mod timer;

use std::cell::RefCell;
use std::future::Future;
use std::mem;
use std::panic::AssertUnwindSafe;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::task::waker;
use tracing::{debug, trace};

pub(crate) use executor::TaskId;
pub use join::{AbortHandle, JoinError, JoinHandle};
pub use timer::{Clock, Sleep, sleep};

use crate::waker::{RootWake, ThreadNotify};
use executor::Executor;
use timer::{ClockSource, Timers};

pub(crate) struct Inner {
    notify: Arc<ThreadNotify>,
    executor: Executor,
    timers: RefCell<Timers>,
    clock: ClockSource,
    deferred: RefCell<Vec<Waker>>,
}

impl Inner {
    fn fire_timers(&self) {
        let due = self.timers.borrow_mut().expired(self.clock.now());
        for waker in due {
            waker.wake();
        }
    }

    fn wake_deferred(&self) {
        let deferred = mem::take(&mut *self.deferred.borrow_mut());
        for waker in deferred {
            waker.wake();
        }
    }

    fn defer(&self, waker: Waker) {
        self.deferred.borrow_mut().push(waker);
    }

    /// Waits for work once nothing is runnable. A tick is `quiet` when it
    /// only ran tasks that had yielded; only then may virtual time jump
    /// while those tasks keep spinning.
    fn idle(&self, root: &RootWake, quiet: bool) {
        if root.is_woken() || self.notify.has_ready() {
            return;
        }
        let yielding = !self.deferred.borrow().is_empty();
        let next = self.timers.borrow().next_deadline();

        match (self.clock.kind(), next) {
            (Clock::Virtual, Some(deadline)) => {
                if !yielding || quiet {
                    trace!(?deadline, "advancing virtual clock");
                    self.clock.advance_to(deadline);
                }
            }
            (Clock::System, Some(deadline)) => {
                if !yielding {
                    let timeout = deadline.saturating_duration_since(Instant::now());
                    self.notify.park(Some(timeout));
                }
            }
            (_, None) => {
                if !yielding {
                    self.notify.park(None);
                }
            }
        }
    }
}

/// A single-threaded runtime driving a root future and the tasks it spawns.
pub struct Runtime {
    inner: Rc<Inner>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_clock(Clock::System)
    }

    pub fn with_clock(clock: Clock) -> Self {
        debug!(?clock, "creating runtime");
        Self {
            inner: Rc::new(Inner {
                notify: Arc::new(ThreadNotify::new()),
                executor: Executor::default(),
                timers: RefCell::new(Timers::default()),
                clock: ClockSource::new(clock),
                deferred: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn clock(&self) -> Clock {
        self.inner.clock.kind()
    }

    /// Current time of this runtime's clock.
    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    /// Number of spawned tasks that have neither finished nor been cancelled.
    pub fn pending_tasks(&self) -> usize {
        self.inner.executor.remaining()
    }

    /// Spawns a task that starts running on the next `block_on`.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        spawn_on(&self.inner, "task".to_string(), future)
    }

    /// Runs `future` to completion on the current thread, together with every
    /// spawned task, and returns its output. Tasks still pending at that
    /// point stay stored and resume on the next call.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let _enter = context::enter(self.inner.clone());
        let inner = &*self.inner;
        let mut future = pin!(future);

        let root = Arc::new(RootWake::new(inner.notify.clone()));
        let root_waker = waker(root.clone());
        let mut cx = Context::from_waker(&root_waker);

        loop {
            inner.fire_timers();
            let woken = inner.notify.has_ready();
            inner.wake_deferred();

            let polled_root = root.take_woken();
            if polled_root {
                if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                    return output;
                }
            }

            for id in inner.notify.take_ready() {
                inner.executor.poll(id);
            }

            inner.idle(&root, !woken && !polled_root);
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.inner.executor.clear();
    }
}

/// Spawns `future` onto the runtime currently inside `block_on`.
///
/// # Panics
///
/// Panics when called outside of [`Runtime::block_on`].
pub fn spawn_local<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    spawn_named("task", future)
}

/// Like [`spawn_local`], with a label used in logs.
pub fn spawn_named<F>(label: impl Into<String>, future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let runtime = context::expect_current("spawn_local");
    spawn_on(&runtime, label.into(), future)
}

fn spawn_on<F>(runtime: &Rc<Inner>, label: String, future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let (sender, receiver) = oneshot::channel();
    let task = async move {
        let output = AssertUnwindSafe(future)
            .catch_unwind()
            .await
            .map_err(|payload| JoinError::Panicked(join::panic_message(&*payload)));
        if sender.send(output).is_err() {
            trace!("join handle dropped, output discarded");
        }
    };
    let id = runtime
        .executor
        .spawn(&runtime.notify, label, task.boxed_local());
    JoinHandle::new(id, receiver, Rc::downgrade(runtime))
}

/// Yields control once, letting every other runnable task make progress.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        match context::current() {
            Some(runtime) => runtime.defer(cx.waker().clone()),
            None => cx.waker().wake_by_ref(),
        }
        Poll::Pending
    }
}

mod context {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Inner;

    thread_local! {
        static CURRENT: RefCell<Option<Rc<Inner>>> = const { RefCell::new(None) };
    }

    pub(super) struct EnterGuard {
        previous: Option<Rc<Inner>>,
    }

    impl Drop for EnterGuard {
        fn drop(&mut self) {
            let previous = self.previous.take();
            CURRENT.with(|current| *current.borrow_mut() = previous);
        }
    }

    pub(super) fn enter(runtime: Rc<Inner>) -> EnterGuard {
        let previous = CURRENT.with(|current| current.borrow_mut().replace(runtime));
        EnterGuard { previous }
    }

    pub(super) fn current() -> Option<Rc<Inner>> {
        CURRENT.with(|current| current.borrow().clone())
    }

    pub(super) fn expect_current(caller: &str) -> Rc<Inner> {
        match current() {
            Some(runtime) => runtime,
            None => panic!("`{caller}` called outside of `Runtime::block_on`"),
        }
    }
}
