//! Turns `main` into an active object and hands work back and forth with a
//! spawned worker.
//!
//! Run with `cargo run -p activeobj --example main_thread`.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use activeobj::{ActiveObject, ActiveObjectConfig, CurrentThread, Dispatch};

fn main() -> activeobj::Result<()> {
    let main_thread = Arc::new(CurrentThread::new());
    let worker = ActiveObject::with_config(ActiveObjectConfig::builder().name("worker").build());
    worker.start()?;

    println!("main thread: {:?}", thread::current().id());

    for round in 0..3u32 {
        let reply_to = Arc::clone(&main_thread);
        worker.send(move || {
            let square = round * round;
            println!(
                "{} computed {round}^2 = {square}",
                thread::current().name().unwrap_or("?")
            );
            let _ = reply_to.send(move || {
                println!("main received {square} on {:?}", thread::current().id());
            });
        })?;
    }

    let stopper = Arc::clone(&main_thread);
    worker.send_delayed(
        move || {
            println!("worker asks main to quit");
            let _ = stopper.stop();
        },
        Duration::from_millis(100),
    )?;

    // Blocks until the delayed message above stops the loop.
    main_thread.start()?;

    worker.stop()?;
    worker.join()?;
    println!("done");
    Ok(())
}
