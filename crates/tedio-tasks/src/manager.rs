//! Runs a fixed set of tasks concurrently and reports them as they finish.

use std::mem;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, ready};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::stream::{FusedStream, FuturesUnordered, Stream, StreamExt};
use tracing::{debug, info};

use crate::config::ManagerConfig;
use crate::counter::RunningCounter;
use crate::error::Error;
use crate::monitor;
use crate::observer::{Discard, Observer, Stdout};
use crate::runtime::{AbortHandle, JoinHandle, Runtime, spawn_named};
use crate::task::{self, Completion, SimulatedWork, Work};

/// Owns the tasks of one run and the running counter they share.
pub struct TaskManager {
    config: ManagerConfig,
    counter: RunningCounter,
    observer: Rc<dyn Observer>,
    work: Rc<dyn Work>,
}

impl TaskManager {
    pub fn new(config: ManagerConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            config,
            counter: RunningCounter::new(),
            observer: Rc::new(Discard),
            work: Rc::new(SimulatedWork),
        })
    }

    /// `tasks` tasks with the default delays.
    pub fn with_tasks(tasks: usize) -> Self {
        Self {
            config: ManagerConfig::new(tasks),
            counter: RunningCounter::new(),
            observer: Rc::new(Discard),
            work: Rc::new(SimulatedWork),
        }
    }

    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Rc::new(observer);
        self
    }

    /// Replaces the simulated delay with real work.
    pub fn with_work(mut self, work: impl Work + 'static) -> Self {
        self.work = Rc::new(work);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn counter(&self) -> RunningCounter {
        self.counter.clone()
    }

    /// Starts every task together with the monitor on the first poll of the
    /// returned stream, which then yields completions in the order the
    /// tasks finish. The monitor is aborted once the last one is yielded.
    ///
    /// Must be polled from within [`Runtime::block_on`].
    pub fn run_all(self) -> RunAll {
        RunAll {
            state: State::Idle(self),
            completed: Vec::new(),
        }
    }

    fn launch(self) -> State {
        let monitor = monitor::spawn(self.counter.clone(), self.observer.clone());

        let mut tasks = Vec::new();
        let pending: FuturesUnordered<_> = self
            .config
            .task_specs()
            .into_iter()
            .map(|spec| {
                let handle: JoinHandle<Completion> = spawn_named(
                    spec.name.clone(),
                    task::run(
                        spec.clone(),
                        self.counter.clone(),
                        self.observer.clone(),
                        self.work.clone(),
                    ),
                );
                tasks.push(handle.abort_handle());
                async move {
                    handle
                        .await
                        .unwrap_or_else(|error| Completion::failed(spec, error.into()))
                }
                .boxed_local()
            })
            .collect();

        info!(tasks = pending.len(), "running tasks concurrently");
        State::Running {
            pending,
            tasks,
            monitor,
        }
    }
}

enum State {
    Idle(TaskManager),
    Running {
        pending: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
        tasks: Vec<AbortHandle>,
        monitor: JoinHandle<()>,
    },
    Done,
}

/// Stream of [`Completion`]s returned by [`TaskManager::run_all`].
#[must_use = "streams do nothing unless polled"]
pub struct RunAll {
    state: State,
    completed: Vec<usize>,
}

impl RunAll {
    /// Cancels the monitor once nothing is left to report. The request is not
    /// awaited.
    fn finish(&mut self) {
        if let State::Running { monitor, .. } = mem::replace(&mut self.state, State::Done) {
            monitor.abort();
            debug!(reported = self.completed.len(), "all tasks reported, monitor cancelled");
        }
    }

    /// Ids of the tasks reported so far, in submission order.
    pub fn completed_ids(&self) -> Vec<usize> {
        let mut ids = self.completed.clone();
        ids.sort_unstable();
        ids
    }
}

impl Stream for RunAll {
    type Item = Completion;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if matches!(this.state, State::Idle(_)) {
            if let State::Idle(manager) = mem::replace(&mut this.state, State::Done) {
                this.state = manager.launch();
            }
        }

        let State::Running { pending, .. } = &mut this.state else {
            return Poll::Ready(None);
        };

        let next = ready!(pending.poll_next_unpin(cx));
        if pending.is_empty() {
            this.finish();
        }

        let Some(completion) = next else {
            return Poll::Ready(None);
        };
        debug!(task = %completion.name, ok = completion.is_success(), "task reported");
        this.completed.push(completion.id);
        Poll::Ready(Some(completion))
    }
}

impl Drop for RunAll {
    fn drop(&mut self) {
        if let State::Running { tasks, monitor, .. } = &self.state {
            let unfinished = tasks.iter().filter(|task| !task.is_finished()).count();
            for task in tasks {
                task.abort();
            }
            monitor.abort();
            debug!(unfinished, "run dropped, tasks and monitor cancelled");
        }
    }
}

impl FusedStream for RunAll {
    fn is_terminated(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

/// Outcome of [`run_all_to_stdout`].
#[derive(Debug, Clone)]
pub struct RunReport {
    /// In completion order.
    pub completions: Vec<Completion>,
    /// See [`RunAll::completed_ids`].
    pub completed_ids: Vec<usize>,
}

/// Runs `config` on a fresh runtime, printing every observation and
/// completion to stdout in the order they happen.
pub fn run_all_to_stdout(config: ManagerConfig) -> Result<RunReport, Error> {
    let manager = TaskManager::new(config)?.with_observer(Stdout);
    let runtime = Runtime::new();

    let report = runtime.block_on(async move {
        let mut run = manager.run_all();
        let mut completions = Vec::new();
        while let Some(completion) = run.next().await {
            println!("{completion}");
            completions.push(completion);
        }
        RunReport {
            completions,
            completed_ids: run.completed_ids(),
        }
    });
    Ok(report)
}
