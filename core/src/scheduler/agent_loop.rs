//! scheduler/agent_loop.rs
//! Timer-based scheduler on a single dedicated agent thread.
//!
//! All work (deferred tasks and idle slices) runs on the one `river-agent`
//! thread, so the pipeline keeps its single-logical-thread model even when the
//! host has no idle primitive of its own.
//!
//! Idle detection: an idle task runs once the job channel has been quiet for
//! `idle_after`, or as soon as its own timeout elapses (`did_timeout = true`),
//! whichever comes first.

use std::collections::VecDeque;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, warn};

use crate::constants::{DEFAULT_IDLE_AFTER, IDLE_PERIOD};
use crate::scheduler::{DeferredTask, IdleTask, Scheduler, SliceDeadline};
use crate::utils::{lock, panic_message};

enum Job {
    Deferred(DeferredTask),
    Idle { due: Instant, task: IdleTask },
    Shutdown,
}

struct DueIdle {
    due: Instant,
    task: IdleTask,
}

pub struct LoopScheduler {
    tx: Sender<Job>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl LoopScheduler {
    pub fn spawn() -> io::Result<Self> {
        Self::spawn_with(DEFAULT_IDLE_AFTER)
    }

    pub fn spawn_with(idle_after: Duration) -> io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let handle = thread::Builder::new()
            .name("river-agent".into())
            .spawn(move || run_loop(rx, idle_after))?;
        let thread_id = handle.thread().id();

        Ok(Self { tx, handle: Mutex::new(Some(handle)), thread_id })
    }

    /// Stop the loop. Pending idle work is discarded; queued deferred tasks
    /// sent before this call still run.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Job::Shutdown);
        let handle = lock(&self.handle).take();
        if let Some(handle) = handle {
            // Joining from inside the loop would wait on ourselves.
            if thread::current().id() != self.thread_id && handle.join().is_err() {
                warn!(target: "river::scheduler", "agent loop exited with a panic");
            }
        }
    }

    fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            debug!(target: "river::scheduler", "agent loop is shut down; task dropped");
        }
    }
}

impl Scheduler for LoopScheduler {
    fn request_idle(&self, timeout: Duration, task: IdleTask) {
        self.submit(Job::Idle { due: Instant::now() + timeout, task });
    }

    fn defer(&self, task: DeferredTask) {
        self.submit(Job::Deferred(task));
    }
}

impl Drop for LoopScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(rx: Receiver<Job>, idle_after: Duration) {
    let mut idle: VecDeque<DueIdle> = VecDeque::new();

    loop {
        let received = match idle.front() {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(front) => {
                let until_due = front.due.saturating_duration_since(Instant::now());
                rx.recv_timeout(idle_after.min(until_due))
            }
        };

        match received {
            Ok(Job::Deferred(task)) => guarded("deferred", task),
            Ok(Job::Idle { due, task }) => idle.push_back(DueIdle { due, task }),
            Ok(Job::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                // Quiet period (or the oldest request is due): grant one slice.
                if let Some(next) = idle.pop_front() {
                    run_idle(next);
                }
                continue;
            }
        }

        // A busy channel must not starve idle work past its timeout.
        if idle.front().is_some_and(|front| Instant::now() >= front.due) {
            if let Some(next) = idle.pop_front() {
                run_idle(next);
            }
        }
    }

    debug!(target: "river::scheduler", dropped_idle = idle.len(), "agent loop stopped");
}

fn run_idle(pending: DueIdle) {
    let timed_out = Instant::now() >= pending.due;
    let deadline = SliceDeadline::new(IDLE_PERIOD, timed_out);
    guarded("idle", move || (pending.task)(&deadline));
}

fn guarded<F: FnOnce()>(kind: &'static str, f: F) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        error!(target: "river::scheduler", kind, reason = %panic_message(panic.as_ref()), "scheduled task panicked");
    }
}
