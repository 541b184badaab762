//! # Tedio Tasks
//!
//! A cooperative task manager running on a minimal single-threaded async runtime.
//!
//! ## Overview
//!
//! Tedio Tasks starts a fixed number of named tasks at once, reports each one as soon as it finishes (completion order, not submission order) and keeps a monitor task running alongside that reports how many tasks are in flight. Everything runs on one thread: tasks only give up control at their own suspension points, so the shared running counter needs no locks.
//!
//! ## Features
//!
//! - **🧵 Single-threaded runtime**: `block_on`, `spawn_local`, `sleep` and `yield_now` with no thread pool
//! - **⏱️ Virtual clock**: timers resolve instantly and deterministically for tests
//! - **📋 Completion order**: results stream out as tasks finish
//! - **🛑 Silent cancellation**: the monitor is aborted without surfacing an error
//! - **🧩 Pluggable work**: replace the simulated delay with real async work, failures stay per task
//!
//! ## Quick Start
//!
//! ```rust
//! use futures::StreamExt;
//! use tedio_tasks::{Clock, Recorder, Runtime, TaskManager};
//!
//! let runtime = Runtime::with_clock(Clock::Virtual);
//! let recorder = Recorder::new();
//! let manager = TaskManager::with_tasks(3).with_observer(recorder.clone());
//!
//! let messages: Vec<String> = runtime.block_on(
//!     manager.run_all().map(|completion| completion.message()).collect(),
//! );
//!
//! assert_eq!(messages, [
//!     "Done with Task 2 after 1 seconds!",
//!     "Done with Task 1 after 2 seconds!",
//!     "Done with Task 0 after 3 seconds!",
//! ]);
//! assert_eq!(recorder.running_counts(), [0, 3, 2, 1, 0]);
//! ```

pub mod config;
pub mod counter;
pub mod error;
pub mod logging;
pub mod manager;
pub mod monitor;
pub mod observer;
pub mod runtime;
pub mod summary;
pub mod task;
mod waker;

// Re-export commonly used items for convenience
pub use config::{DelayPolicy, ManagerConfig};
pub use counter::RunningCounter;
pub use error::{ConfigError, Error, TaskError};
pub use logging::{LoggerConfig, LoggerError, logger_init};
pub use manager::{RunAll, RunReport, TaskManager, run_all_to_stdout};
pub use observer::{Discard, Observation, Observer, Recorder, Stdout};
pub use runtime::{AbortHandle, Clock, JoinError, JoinHandle, Runtime, sleep, spawn_local, yield_now};
pub use task::{Completion, SimulatedWork, TaskSpec, Work};
