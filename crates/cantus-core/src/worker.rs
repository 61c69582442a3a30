//! Background thread for work the audio thread must not do itself.
//!
//! Disk I/O, decoding and other blocking work runs here. Long-lived work is
//! registered as a [`WorkerJob`] that is polled whenever the thread is woken
//! and at least once per poll interval. Audio-thread code wakes the worker
//! through a [`WorkerWaker`], which never blocks or allocates.

use crate::{Error, Result};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thread_priority::ThreadPriority;
use tracing::{debug, info};

/// Work polled repeatedly by the [`WorkerThread`].
pub trait WorkerJob: Send + Sync {
    /// Does whatever work is pending. Returns `false` once the job is done and
    /// can be dropped.
    fn run(&self) -> bool;

    /// Called once when the worker shuts down while the job is still registered.
    fn finish(&self) {}
}

type WorkerTask = Box<dyn FnOnce() + Send>;

enum WorkerCommand {
    Task(WorkerTask),
    Register(Arc<dyn WorkerJob>),
    Shutdown,
}

/// Wakes a [`WorkerThread`]. Safe to call from the audio thread.
#[derive(Clone)]
pub struct WorkerWaker {
    wake_tx: Sender<()>,
}

impl WorkerWaker {
    #[inline]
    pub fn wake(&self) {
        // A full channel means a wake-up is already pending.
        let _ = self.wake_tx.try_send(());
    }
}

pub struct WorkerThread {
    command_tx: Sender<WorkerCommand>,
    wake_tx: Sender<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WorkerThread {
    /// Spawns a worker named `name` polling its jobs every `poll_interval`.
    pub fn spawn(name: &str, poll_interval: Duration) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let (wake_tx, wake_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                if thread_priority::set_current_thread_priority(ThreadPriority::Max).is_err() {
                    debug!("worker thread priority unchanged");
                }
                worker_loop(command_rx, wake_rx, poll_interval);
            })
            .map_err(|e| Error::Worker(format!("failed to spawn worker thread: {e}")))?;

        info!(name, "worker thread started");
        Ok(Self {
            command_tx,
            wake_tx,
            thread_handle: Some(handle),
        })
    }

    /// Runs `task` once on the worker thread.
    pub fn enqueue<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let _ = self.command_tx.send(WorkerCommand::Task(Box::new(task)));
        self.waker().wake();
    }

    pub fn register(&self, job: Arc<dyn WorkerJob>) {
        let _ = self.command_tx.send(WorkerCommand::Register(job));
        self.waker().wake();
    }

    pub fn waker(&self) -> WorkerWaker {
        WorkerWaker {
            wake_tx: self.wake_tx.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Finishes outstanding work and joins the thread.
    pub fn stop(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
            info!("worker thread stopped");
        }
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(commands: Receiver<WorkerCommand>, wake: Receiver<()>, poll_interval: Duration) {
    let mut jobs: Vec<Arc<dyn WorkerJob>> = Vec::new();
    let mut running = true;

    while running {
        select! {
            recv(commands) -> command => {
                running = command.is_ok_and(|command| handle_command(command, &mut jobs));
            }
            recv(wake) -> _ => {}
            default(poll_interval) => {}
        }

        // Commands queued behind the one that woke us run before the jobs.
        while running {
            match commands.try_recv() {
                Ok(command) => running = handle_command(command, &mut jobs),
                Err(_) => break,
            }
        }

        if running {
            jobs.retain(|job| job.run());
        }
    }

    shutdown_jobs(&mut jobs);
}

/// Returns `false` on shutdown.
fn handle_command(command: WorkerCommand, jobs: &mut Vec<Arc<dyn WorkerJob>>) -> bool {
    match command {
        WorkerCommand::Task(task) => task(),
        WorkerCommand::Register(job) => jobs.push(job),
        WorkerCommand::Shutdown => return false,
    }
    true
}

fn shutdown_jobs(jobs: &mut Vec<Arc<dyn WorkerJob>>) {
    for job in jobs.drain(..) {
        if job.run() {
            job.finish();
        }
    }
}
