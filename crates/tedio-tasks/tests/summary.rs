use futures::StreamExt;
use tedio_tasks::summary::{COMPLETED_TASKS_FILE, read_summary, write_summary};
use tedio_tasks::{Clock, Error, Runtime, TaskManager};

#[test]
fn run_summary_round_trips_through_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(COMPLETED_TASKS_FILE);

    let ids = Runtime::with_clock(Clock::Virtual).block_on(async {
        let mut run = TaskManager::with_tasks(3).run_all();
        while run.next().await.is_some() {}
        run.completed_ids()
    });
    write_summary(&path, &ids).expect("write summary");

    assert_eq!(
        read_summary(&path).expect("read summary"),
        "IDs for tasks done: 0, 1, 2"
    );
}

#[test]
fn rewriting_replaces_previous_summary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(COMPLETED_TASKS_FILE);

    write_summary(&path, &[0, 1, 2, 3]).expect("first write");
    write_summary(&path, &[0]).expect("second write");

    assert_eq!(
        read_summary(&path).expect("read summary"),
        "IDs for tasks done: 0"
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent").join(COMPLETED_TASKS_FILE);

    let err = read_summary(&path).expect_err("file does not exist");
    assert!(matches!(err, Error::Summary { .. }));
    assert!(err.to_string().contains(COMPLETED_TASKS_FILE), "{err}");

    let err = write_summary(&path, &[1]).expect_err("parent directory is missing");
    assert!(matches!(err, Error::Summary { .. }));
}
