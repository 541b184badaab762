//! Background watcher reporting changes of the running count.

use std::rc::Rc;

use tracing::trace;

use crate::counter::RunningCounter;
use crate::observer::{Observation, Observer};
use crate::runtime::{JoinHandle, spawn_named, yield_now};

/// Reports the running count each time it differs from the last report,
/// yielding between checks. Never returns; it stops when its task is
/// aborted.
pub async fn watch(counter: RunningCounter, observer: Rc<dyn Observer>) {
    let mut last_running = None;

    loop {
        let running = counter.get();
        if last_running != Some(running) {
            trace!(running, "running tasks changed");
            observer.observe(Observation::Running(running));
            last_running = Some(running);
        }

        yield_now().await;
    }
}

/// Starts [`watch`] as a detached task on the current runtime.
pub fn spawn(counter: RunningCounter, observer: Rc<dyn Observer>) -> JoinHandle<()> {
    spawn_named("monitor", watch(counter, observer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Recorder;
    use crate::runtime::{JoinError, Runtime};

    #[test]
    fn reports_only_changes_until_aborted() {
        let runtime = Runtime::new();
        let counter = RunningCounter::new();
        let recorder = Recorder::new();

        let result = runtime.block_on({
            let counter = counter.clone();
            let observer: Rc<dyn Observer> = Rc::new(recorder.clone());
            async move {
                let monitor = spawn(counter.clone(), observer);
                yield_now().await;

                let first = counter.enter();
                let second = counter.enter();
                for _ in 0..3 {
                    yield_now().await;
                }
                drop(first);
                yield_now().await;
                yield_now().await;
                drop(second);
                yield_now().await;
                yield_now().await;

                monitor.abort();
                // Changes after the abort go unreported.
                let _late = counter.enter();
                yield_now().await;
                monitor.await
            }
        });

        assert_eq!(result, Err(JoinError::Cancelled));
        assert_eq!(recorder.running_counts(), [0, 2, 1, 0]);
    }

    #[test]
    fn aborting_before_first_poll_reports_nothing() {
        let runtime = Runtime::new();
        let recorder = Recorder::new();

        runtime.block_on({
            let observer: Rc<dyn Observer> = Rc::new(recorder.clone());
            async move {
                spawn(RunningCounter::new(), observer).abort();
            }
        });

        assert!(recorder.observations().is_empty());
        assert_eq!(runtime.pending_tasks(), 0);
    }
}
