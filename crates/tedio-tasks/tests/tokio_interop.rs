use std::time::Duration;

use futures::StreamExt;
use tedio_tasks::{Clock, Recorder, Runtime, TaskManager, sleep};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runs_on_a_blocking_thread_without_stalling_tokio() {
    let ticker = tokio::spawn(async {
        let mut ticks = 0;
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            ticks += 1;
        }
        ticks
    });

    let (names, counts) = tokio::task::spawn_blocking(|| {
        let recorder = Recorder::new();
        let runtime = Runtime::new();
        let manager = TaskManager::new(
            tedio_tasks::ManagerConfig::new(3).with_unit(Duration::from_millis(5)),
        )
        .expect("valid config")
        .with_observer(recorder.clone());
        let names: Vec<String> =
            runtime.block_on(manager.run_all().map(|completion| completion.name).collect());
        (names, recorder.running_counts())
    })
    .await
    .expect("blocking task panicked");

    assert_eq!(names, ["Task 2", "Task 1", "Task 0"]);
    assert_eq!(counts.first(), Some(&0));
    assert_eq!(counts.last(), Some(&0));
    assert_eq!(ticker.await.expect("ticker panicked"), 5);
}

#[tokio::test]
async fn awaits_values_sent_from_tokio_tasks() {
    let (sender, receiver) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let _ = sender.send("from tokio");
    });

    let received = tokio::task::spawn_blocking(move || {
        let runtime = Runtime::with_clock(Clock::Virtual);
        runtime.block_on(async {
            sleep(Duration::from_secs(1)).await;
            receiver.await
        })
    })
    .await
    .expect("blocking task panicked");

    assert_eq!(received, Ok("from tokio"));
}
