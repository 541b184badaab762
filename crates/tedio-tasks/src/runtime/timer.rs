//! Clock and timer queue driving `sleep`.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::rc::Weak;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use pin_project::{pin_project, pinned_drop};

use super::{Inner, context};

/// Time source of a [`Runtime`](super::Runtime).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall-clock time, timers park the thread until they are due.
    #[default]
    System,
    /// Time only moves when the runtime has nothing else to do; it then
    /// jumps straight to the next timer deadline.
    Virtual,
}

pub(crate) struct ClockSource {
    kind: Clock,
    virtual_now: Cell<Instant>,
}

impl ClockSource {
    pub fn new(kind: Clock) -> Self {
        Self {
            kind,
            virtual_now: Cell::new(Instant::now()),
        }
    }

    pub fn kind(&self) -> Clock {
        self.kind
    }

    pub fn now(&self) -> Instant {
        match self.kind {
            Clock::System => Instant::now(),
            Clock::Virtual => self.virtual_now.get(),
        }
    }

    pub fn advance_to(&self, deadline: Instant) {
        if self.kind == Clock::Virtual && deadline > self.virtual_now.get() {
            self.virtual_now.set(deadline);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerKey {
    deadline: Instant,
    seq: u64,
}

/// Pending timers ordered by deadline, ties broken by registration order.
#[derive(Default)]
pub(crate) struct Timers {
    entries: BTreeMap<TimerKey, Waker>,
    next_seq: u64,
}

impl Timers {
    pub fn register(&mut self, deadline: Instant, waker: Waker) -> TimerKey {
        let key = TimerKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, waker);
        key
    }

    pub fn update(&mut self, key: TimerKey, waker: &Waker) {
        if let Some(current) = self.entries.get_mut(&key) {
            if !current.will_wake(waker) {
                *current = waker.clone();
            }
        }
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.entries.remove(&key);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|key| key.deadline)
    }

    /// Removes every timer due at `now`, earliest first.
    pub fn expired(&mut self, now: Instant) -> Vec<Waker> {
        let later = self.entries.split_off(&TimerKey {
            deadline: now,
            seq: u64::MAX,
        });
        mem::replace(&mut self.entries, later).into_values().collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Future returned by [`sleep`].
#[pin_project(PinnedDrop)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Sleep {
    deadline: Instant,
    key: Option<TimerKey>,
    runtime: Weak<Inner>,
}

impl Sleep {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Suspends the current task for `duration` without blocking the thread.
///
/// # Panics
///
/// Panics when called outside of [`Runtime::block_on`](super::Runtime::block_on).
pub fn sleep(duration: Duration) -> Sleep {
    let runtime = context::expect_current("sleep");
    Sleep {
        deadline: runtime.clock.now() + duration,
        key: None,
        runtime: std::rc::Rc::downgrade(&runtime),
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let Some(runtime) = this.runtime.upgrade() else {
            // The runtime is gone, nothing will ever fire this timer.
            return Poll::Ready(());
        };

        let mut timers = runtime.timers.borrow_mut();
        if runtime.clock.now() >= *this.deadline {
            if let Some(key) = this.key.take() {
                timers.cancel(key);
            }
            return Poll::Ready(());
        }

        if let Some(key) = *this.key {
            timers.update(key, cx.waker());
        } else {
            *this.key = Some(timers.register(*this.deadline, cx.waker().clone()));
        }
        Poll::Pending
    }
}

#[pinned_drop]
impl PinnedDrop for Sleep {
    fn drop(self: Pin<&mut Self>) {
        let this = self.project();
        if let (Some(key), Some(runtime)) = (this.key.take(), this.runtime.upgrade()) {
            if let Ok(mut timers) = runtime.timers.try_borrow_mut() {
                timers.cancel(key);
            }
        }
    }
}
