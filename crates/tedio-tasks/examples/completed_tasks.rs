//! Same run as `async_worker`, then records the processed task ids in
//! `completed_tasks.log` and prints the file back.

use tedio_tasks::summary::{COMPLETED_TASKS_FILE, read_summary, write_summary};
use tedio_tasks::{Error, LoggerConfig, ManagerConfig, logger_init, run_all_to_stdout};

fn main() -> Result<(), Error> {
    logger_init(&LoggerConfig::default())?;

    let report = run_all_to_stdout(ManagerConfig::new(3))?;

    write_summary(COMPLETED_TASKS_FILE, &report.completed_ids)?;
    println!("{}", read_summary(COMPLETED_TASKS_FILE)?);
    Ok(())
}
