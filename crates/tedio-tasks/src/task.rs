//! A single unit of background work.

use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::debug;

use crate::counter::RunningCounter;
use crate::error::TaskError;
use crate::observer::{Observation, Observer};
use crate::runtime::sleep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Submission index.
    pub id: usize,
    pub name: String,
    pub duration: Duration,
}

impl TaskSpec {
    pub fn new(id: usize, duration: Duration) -> Self {
        Self {
            id,
            name: format!("Task {id}"),
            duration,
        }
    }
}

/// What a task does once it is running.
pub trait Work {
    fn perform(&self, spec: &TaskSpec) -> LocalBoxFuture<'static, Result<(), TaskError>>;
}

/// Waits for the task's duration on the runtime timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedWork;

impl Work for SimulatedWork {
    fn perform(&self, spec: &TaskSpec) -> LocalBoxFuture<'static, Result<(), TaskError>> {
        let duration = spec.duration;
        async move {
            sleep(duration).await;
            Ok(())
        }
        .boxed_local()
    }
}

impl<F, Fut> Work for F
where
    F: Fn(&TaskSpec) -> Fut,
    Fut: Future<Output = Result<(), TaskError>> + 'static,
{
    fn perform(&self, spec: &TaskSpec) -> LocalBoxFuture<'static, Result<(), TaskError>> {
        self(spec).boxed_local()
    }
}

/// Result of one task, in the order tasks finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: usize,
    pub name: String,
    pub duration: Duration,
    pub outcome: Result<(), TaskError>,
}

impl Completion {
    pub(crate) fn failed(spec: TaskSpec, error: TaskError) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            duration: spec.duration,
            outcome: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.duration.as_secs_f64();
        match &self.outcome {
            Ok(()) => write!(f, "Done with {} after {seconds} seconds!", self.name),
            Err(error) => write!(f, "Failed {} after {seconds} seconds: {error}", self.name),
        }
    }
}

/// Runs one task: counts it as running before the first suspension point and
/// stops counting it once its work has resumed and returned.
pub async fn run(
    spec: TaskSpec,
    counter: RunningCounter,
    observer: Rc<dyn Observer>,
    work: Rc<dyn Work>,
) -> Completion {
    let running = counter.enter();
    observer.observe(Observation::Started {
        name: spec.name.clone(),
    });
    debug!(task = %spec.name, duration = ?spec.duration, "task started");

    let outcome = work.perform(&spec).await;
    drop(running);
    debug!(task = %spec.name, ok = outcome.is_ok(), "task finished");

    Completion {
        id: spec.id,
        name: spec.name,
        duration: spec.duration,
        outcome,
    }
}
