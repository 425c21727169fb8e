use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Error;
use crate::lifecycle::Lifecycle;
use crate::message::{BoxedMessage, Task};
use crate::scheduler::{Backlog, Scheduler};

fn task<F: FnOnce() + Send + 'static>(callable: F) -> BoxedMessage {
    Box::new(Task::new(callable))
}

fn running() -> Arc<Scheduler> {
    Arc::new(Scheduler::new(String::from("test"), Lifecycle::Running))
}

fn spawn_loop(scheduler: &Arc<Scheduler>) -> thread::JoinHandle<()> {
    let scheduler = Arc::clone(scheduler);
    thread::spawn(move || {
        scheduler.bind_worker(thread::current().id());
        scheduler.run();
    })
}

#[test]
fn idle_worker_wakes_on_stop() {
    let scheduler = running();
    let worker = spawn_loop(&scheduler);

    thread::sleep(Duration::from_millis(20));
    scheduler.request_stop();
    worker.join().unwrap();

    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
    assert!(!scheduler.is_accepting());
}

#[test]
fn ready_message_is_not_held_back_by_pending_delay() {
    let scheduler = running();
    let worker = spawn_loop(&scheduler);
    let (tx, rx) = mpsc::channel();

    scheduler
        .post_delayed(task(|| {}), Duration::from_secs(30))
        .unwrap();
    thread::sleep(Duration::from_millis(10));

    let sent = Instant::now();
    scheduler.post(task(move || tx.send(sent.elapsed()).unwrap())).unwrap();
    let latency = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(latency < Duration::from_secs(1), "ready message waited {latency:?}");

    scheduler.request_stop();
    worker.join().unwrap();
    assert_eq!(scheduler.backlog(), Backlog::default());
}

#[test]
fn sends_rejected_after_stop_leave_queues_untouched() {
    let scheduler = running();
    scheduler.request_stop();

    assert!(matches!(
        scheduler.post(task(|| {})),
        Err(Error::NotAcceptingMessages)
    ));
    assert!(matches!(
        scheduler.post_delayed(task(|| {}), Duration::ZERO),
        Err(Error::NotAcceptingMessages)
    ));
    assert!(matches!(
        scheduler.block_on(|| 1),
        Err(Error::NotAcceptingMessages)
    ));
    assert_eq!(scheduler.backlog(), Backlog::default());
}

#[test]
fn block_on_requires_running() {
    let scheduler = Scheduler::new(String::from("test"), Lifecycle::Created);

    assert!(matches!(scheduler.block_on(|| 1), Err(Error::NotStarted)));
    assert_eq!(scheduler.backlog(), Backlog::default());
}

#[test]
fn promised_message_runs_inline_on_worker() {
    let scheduler = running();
    scheduler.bind_worker(thread::current().id());

    let receiver = scheduler.post_promised(|| 11).unwrap();
    assert_eq!(receiver.try_take().unwrap(), Some(11));
    assert_eq!(scheduler.backlog().ready, 0);
}

#[test]
fn stop_before_run_only_drains_ready_messages() {
    let scheduler = running();
    let log = Arc::new(Mutex::new(Vec::new()));

    for value in 0..3 {
        let log = Arc::clone(&log);
        scheduler.post(task(move || log.lock().unwrap().push(value))).unwrap();
    }
    let delayed_log = Arc::clone(&log);
    scheduler
        .post_delayed(
            task(move || delayed_log.lock().unwrap().push(99)),
            Duration::from_secs(30),
        )
        .unwrap();

    scheduler.request_stop();
    scheduler.run();

    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(scheduler.backlog(), Backlog::default());
    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
}

#[test]
fn panicking_message_discards_pending_work() {
    let scheduler = running();
    let pending = {
        let (promise, receiver) = crate::promise::channel::<u32>();
        scheduler.post(task(|| panic!("boom"))).unwrap();
        scheduler
            .post(Box::new(crate::message::PromisedTask::new(|| 5, promise)))
            .unwrap();
        receiver
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scheduler.run()));

    assert!(outcome.is_err());
    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
    assert!(!scheduler.is_accepting());
    assert!(matches!(pending.wait(), Err(Error::BrokenPromise)));
}

#[test]
fn shutdown_of_unstarted_scheduler_drops_messages() {
    let scheduler = Scheduler::new(String::from("test"), Lifecycle::Created);
    let (tx, rx) = mpsc::channel::<()>();
    scheduler.post(task(move || tx.send(()).unwrap())).unwrap();

    scheduler.shutdown();

    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
    assert!(rx.recv().is_err());
}

#[test]
fn aborted_start_returns_to_created() {
    let scheduler = Scheduler::new(String::from("test"), Lifecycle::Created);
    scheduler.post(task(|| {})).unwrap();
    scheduler
        .transition(Lifecycle::Created, Lifecycle::Running)
        .unwrap();

    scheduler.abort_start();

    assert_eq!(scheduler.lifecycle(), Lifecycle::Created);
    assert!(scheduler.is_accepting());
    assert_eq!(scheduler.backlog().ready, 1);
}

#[test]
fn aborted_start_after_stop_ends_stopped() {
    let scheduler = Scheduler::new(String::from("test"), Lifecycle::Created);
    let (tx, rx) = mpsc::channel::<()>();
    scheduler.post(task(move || tx.send(()).unwrap())).unwrap();
    scheduler
        .transition(Lifecycle::Created, Lifecycle::Running)
        .unwrap();
    scheduler.request_stop();

    scheduler.abort_start();

    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
    assert!(!scheduler.is_accepting());
    assert_eq!(scheduler.backlog(), Backlog::default());
    assert!(rx.recv().is_err());
}

#[test]
fn abandoned_message_may_reenter_the_scheduler_when_dropped() {
    struct StopOnDrop(Arc<Scheduler>);

    impl Drop for StopOnDrop {
        fn drop(&mut self) {
            self.0.request_stop();
        }
    }

    let scheduler = running();
    let holder = StopOnDrop(Arc::clone(&scheduler));
    scheduler
        .post_delayed(
            task(move || {
                let _held = &holder;
            }),
            Duration::from_secs(30),
        )
        .unwrap();
    scheduler.request_stop();

    let worker = spawn_loop(&scheduler);
    worker.join().unwrap();

    assert_eq!(scheduler.lifecycle(), Lifecycle::Stopped);
    assert_eq!(Arc::strong_count(&scheduler), 1);
}

#[test]
fn panic_teardown_drops_messages_outside_the_lock() {
    struct InspectOnDrop(Arc<Scheduler>);

    impl Drop for InspectOnDrop {
        fn drop(&mut self) {
            let _ = self.0.backlog();
        }
    }

    let scheduler = running();
    let holder = InspectOnDrop(Arc::clone(&scheduler));
    scheduler.post(task(|| panic!("boom"))).unwrap();
    scheduler
        .post(task(move || {
            let _held = &holder;
        }))
        .unwrap();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| scheduler.run()));

    assert!(outcome.is_err());
    assert_eq!(scheduler.backlog(), Backlog::default());
    assert_eq!(Arc::strong_count(&scheduler), 1);
}
