//! Task storage and polling for the single-threaded runtime.

use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::task::Context;

use futures::future::LocalBoxFuture;
use futures::task::{ArcWake, waker_ref};
use tracing::{debug, trace};

use crate::waker::{TaskWake, ThreadNotify};

/// Index of a spawned task. Ids are never reused within one runtime, so a
/// stale wake for a finished task is simply ignored.
pub(crate) type TaskId = usize;

struct Leaf {
    fut: Option<LocalBoxFuture<'static, ()>>,
    label: String,
    wake: Arc<TaskWake>,
    cancelled: bool,
}

#[derive(Default)]
pub(crate) struct Executor {
    leafs: RefCell<Vec<Option<Leaf>>>,
    remaining: Cell<usize>,
}

impl Executor {
    pub fn spawn(
        &self,
        notify: &Arc<ThreadNotify>,
        label: String,
        fut: LocalBoxFuture<'static, ()>,
    ) -> TaskId {
        let (id, wake) = {
            let mut leafs = self.leafs.borrow_mut();
            let id = leafs.len();
            let wake = Arc::new(TaskWake::new(id, notify.clone()));
            debug!(id, label = %label, remaining = self.remaining.get() + 1, "spawning task");
            leafs.push(Some(Leaf {
                fut: Some(fut),
                label,
                wake: wake.clone(),
                cancelled: false,
            }));
            (id, wake)
        };
        self.remaining.set(self.remaining.get() + 1);

        ArcWake::wake_by_ref(&wake);
        id
    }

    /// Polls one task. The future is moved out of its slot for the duration
    /// of the poll so it may spawn or cancel other tasks.
    pub fn poll(&self, id: TaskId) {
        let (mut fut, wake) = {
            let mut leafs = self.leafs.borrow_mut();
            let Some(Some(leaf)) = leafs.get_mut(id) else {
                return;
            };
            let Some(fut) = leaf.fut.take() else {
                return;
            };
            leaf.wake.clear();
            (fut, leaf.wake.clone())
        };

        let waker = waker_ref(&wake);
        let mut cx = Context::from_waker(&waker);
        let finished = fut.as_mut().poll(&mut cx).is_ready();

        let mut leafs = self.leafs.borrow_mut();
        let Some(slot) = leafs.get_mut(id) else {
            return;
        };
        let cancelled = slot.as_ref().is_some_and(|leaf| leaf.cancelled);
        if finished || cancelled {
            if let Some(leaf) = slot.take() {
                trace!(id, label = %leaf.label, finished, "task retired");
            }
            self.remaining.set(self.remaining.get() - 1);
            drop(leafs);
            drop(fut);
        } else if let Some(leaf) = slot {
            leaf.fut = Some(fut);
        }
    }

    /// Requests cancellation. A task that is not being polled right now is
    /// dropped immediately, otherwise it is dropped once its poll returns.
    pub fn cancel(&self, id: TaskId) -> bool {
        let fut = {
            let mut leafs = self.leafs.borrow_mut();
            let Some(slot) = leafs.get_mut(id) else {
                return false;
            };
            let polling = match slot {
                Some(leaf) => leaf.fut.is_none(),
                None => return false,
            };
            if polling {
                if let Some(leaf) = slot.as_mut() {
                    leaf.cancelled = true;
                }
                debug!(id, "cancellation requested while task is running");
                return true;
            }
            let leaf = slot.take();
            self.remaining.set(self.remaining.get() - 1);
            if let Some(leaf) = &leaf {
                debug!(id, label = %leaf.label, "task cancelled");
            }
            leaf.and_then(|leaf| leaf.fut)
        };
        // Dropping may run arbitrary destructors, keep the borrow released.
        drop(fut);
        true
    }

    pub fn is_live(&self, id: TaskId) -> bool {
        self.leafs
            .borrow()
            .get(id)
            .is_some_and(|slot| slot.as_ref().is_some_and(|leaf| !leaf.cancelled))
    }

    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }

    /// Drops every task still stored, outside of the slot borrow.
    pub fn clear(&self) {
        let leafs = std::mem::take(&mut *self.leafs.borrow_mut());
        self.remaining.set(0);
        drop(leafs);
    }
}
