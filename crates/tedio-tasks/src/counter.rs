//! Count of tasks currently running, shared by one manager's tasks and its
//! monitor.

use std::cell::Cell;
use std::rc::Rc;

use tracing::warn;

#[derive(Debug, Default)]
struct State {
    running: Cell<usize>,
    peak: Cell<usize>,
}

/// Cheap to clone; every clone refers to the same count.
#[derive(Debug, Clone, Default)]
pub struct RunningCounter {
    state: Rc<State>,
}

impl RunningCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.state.running.get()
    }

    /// Highest value the count has reached.
    pub fn peak(&self) -> usize {
        self.state.peak.get()
    }

    /// Marks one task as running until the returned guard is dropped.
    pub fn enter(&self) -> RunningGuard {
        let running = self.state.running.get() + 1;
        self.state.running.set(running);
        self.state.peak.set(self.state.peak.get().max(running));
        RunningGuard {
            counter: self.clone(),
        }
    }
}

/// Decrements the counter on drop, whether the task finished, failed or was
/// cancelled.
#[must_use = "the task stops counting as running when the guard is dropped"]
#[derive(Debug)]
pub struct RunningGuard {
    counter: RunningCounter,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let running = &self.counter.state.running;
        match running.get().checked_sub(1) {
            Some(left) => running.set(left),
            None => warn!("running counter already at zero"),
        }
    }
}
