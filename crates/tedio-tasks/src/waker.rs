//! Wake implementation for the executor.
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, Thread};
use std::time::Duration;

use futures::task::ArcWake;

use crate::runtime::TaskId;

pub(crate) struct ThreadNotify {
    /// The (single) executor thread.
    thread: Thread,
    /// A flag to ensure a wakeup (i.e. `unpark()`) is not "forgotten"
    /// before the next `park()`, which may otherwise happen if the code
    /// being executed as part of the future(s) being polled makes use of
    /// park / unpark calls of its own, i.e. we cannot assume that no other
    /// code uses park / unpark on the executing `thread`.
    unparked: AtomicBool,
    /// Spawned tasks waiting for their next poll, in wake order.
    ready: Mutex<VecDeque<TaskId>>,
}

impl ThreadNotify {
    pub fn new() -> ThreadNotify {
        ThreadNotify {
            thread: thread::current(),
            unparked: AtomicBool::new(false),
            ready: Mutex::new(VecDeque::new()),
        }
    }

    fn ready(&self) -> MutexGuard<'_, VecDeque<TaskId>> {
        // Nothing panics while holding the lock, the queue stays consistent.
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn schedule(&self, id: TaskId) {
        self.ready().push_back(id);
        self.unpark();
    }

    pub fn take_ready(&self) -> VecDeque<TaskId> {
        mem::take(&mut *self.ready())
    }

    pub fn has_ready(&self) -> bool {
        !self.ready().is_empty()
    }

    pub fn unpark(&self) {
        let unparked = self.unparked.swap(true, Ordering::Release);
        if !unparked {
            // If the thread has not been unparked yet, it must be done
            // now. If it was actually parked, it will run again,
            // otherwise the token made available by `unpark`
            // may be consumed before reaching `park()`, but `unparked`
            // ensures it is not forgotten.
            self.thread.unpark();
        }
    }

    /// Parks the executor thread until woken or until `timeout` elapses.
    pub fn park(&self, timeout: Option<Duration>) {
        if self.unparked.swap(false, Ordering::Acquire) {
            return;
        }
        match timeout {
            Some(timeout) => thread::park_timeout(timeout),
            None => thread::park(),
        }
        self.unparked.store(false, Ordering::Release);
    }
}

impl Default for ThreadNotify {
    fn default() -> Self {
        Self::new()
    }
}

/// Waker handed to the future passed to `block_on`.
pub(crate) struct RootWake {
    notify: Arc<ThreadNotify>,
    woken: AtomicBool,
}

impl RootWake {
    pub fn new(notify: Arc<ThreadNotify>) -> RootWake {
        RootWake {
            notify,
            // The root future is polled once before anything wakes it.
            woken: AtomicBool::new(true),
        }
    }

    pub fn take_woken(&self) -> bool {
        self.woken.swap(false, Ordering::AcqRel)
    }

    pub fn is_woken(&self) -> bool {
        self.woken.load(Ordering::Acquire)
    }
}

impl ArcWake for RootWake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::Release);
        arc_self.notify.unpark();
    }
}

/// Waker of a spawned task: pushes the task id onto the ready queue.
pub(crate) struct TaskWake {
    id: TaskId,
    notify: Arc<ThreadNotify>,
    queued: AtomicBool,
}

impl TaskWake {
    pub fn new(id: TaskId, notify: Arc<ThreadNotify>) -> TaskWake {
        TaskWake {
            id,
            notify,
            queued: AtomicBool::new(false),
        }
    }

    /// Called right before the task is polled so a wake during the poll
    /// queues it again.
    pub fn clear(&self) {
        self.queued.store(false, Ordering::Release);
    }
}

impl ArcWake for TaskWake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if !arc_self.queued.swap(true, Ordering::AcqRel) {
            arc_self.notify.schedule(arc_self.id);
        }
    }
}
