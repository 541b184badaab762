//! Nested awaits run in place while a spawned task makes progress whenever
//! the awaiting code suspends.
//!
//! ```text
//! $ cargo run --example coroutine_order
//! Alpha started
//! Beta started
//! !!! Flash !!!
//! Beta finished
//! Alpha finished with something from Beta: gift
//! All done!
//! ```

use std::time::Duration;

use tedio_tasks::{Runtime, sleep, spawn_local};

async fn alpha() {
    println!("Alpha started");
    let gift = beta().await;
    println!("Alpha finished with something from Beta: {gift}");
}

async fn beta() -> &'static str {
    println!("Beta started");
    // Suspend so the flasher gets its turn.
    sleep(Duration::from_millis(2)).await;
    println!("Beta finished");
    "gift"
}

async fn flasher() {
    sleep(Duration::from_millis(1)).await;
    println!("!!! Flash !!!");
}

fn main() {
    let runtime = Runtime::new();
    runtime.block_on(async {
        // Nothing runs until awaited.
        let alpha = alpha();
        let _flasher = spawn_local(flasher());
        alpha.await;
        println!("All done!");
    });
}
