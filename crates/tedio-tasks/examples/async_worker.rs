//! Runs three tasks concurrently in the background and reports each one as
//! it finishes.
//!
//! ```text
//! $ cargo run --example async_worker
//! [0 running tasks]
//! Running "Task 0"
//! Running "Task 1"
//! Running "Task 2"
//! [3 running tasks]
//! [2 running tasks]
//! Done with Task 2 after 1 seconds!
//! [1 running tasks]
//! Done with Task 1 after 2 seconds!
//! [0 running tasks]
//! Done with Task 0 after 3 seconds!
//! ```

use tedio_tasks::{Error, LoggerConfig, ManagerConfig, logger_init, run_all_to_stdout};

fn main() -> Result<(), Error> {
    logger_init(&LoggerConfig::default())?;
    run_all_to_stdout(ManagerConfig::new(3))?;
    Ok(())
}
