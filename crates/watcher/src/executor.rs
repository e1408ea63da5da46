//! Execution contexts for coalesced work
//!
//! The coalescer never runs work on the producer's behalf unless told to:
//! it hands tasks to a [`TaskExecutor`]. A [`WorkerLane`] is a single named
//! thread draining a channel, which gives runs a stable home off the
//! producers' threads. [`InlineExecutor`] runs tasks on the caller and is
//! mostly useful for deterministic tests.

use crate::error::{Result, WatcherError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

/// Unit of work accepted by an executor
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks, now or later, on some thread
pub trait TaskExecutor: Send + Sync {
    /// Hand a task over for execution
    ///
    /// Must not block the caller for longer than it takes to enqueue.
    fn execute(&self, task: Task);
}

/// Runs every task immediately on the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl TaskExecutor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// A single dedicated thread executing tasks in submission order
///
/// A panicking task is logged and the lane keeps going. Dropping the lane
/// lets queued tasks finish and joins the thread.
pub struct WorkerLane {
    name: String,
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerLane {
    /// Spawn a new lane backed by a thread called `name`
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = unbounded::<Task>();

        let lane_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_lane(&lane_name, receiver))
            .map_err(|source| WatcherError::SpawnLane {
                name: name.clone(),
                source,
            })?;

        debug!("Spawned worker lane '{}'", name);

        Ok(Self {
            name,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Name of the lane thread
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop accepting tasks, finish the queued ones and join the thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Closing the channel ends the lane loop once the queue is drained
        self.sender.take();

        if let Some(handle) = self.handle.take() {
            // The last reference may be released by a task running on the lane
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Worker lane '{}' terminated abnormally", self.name);
            }
        }
    }
}

impl TaskExecutor for WorkerLane {
    fn execute(&self, task: Task) {
        match &self.sender {
            Some(sender) => {
                if sender.send(task).is_err() {
                    warn!("Worker lane '{}' is gone, dropping task", self.name);
                }
            }
            None => warn!("Worker lane '{}' is shut down, dropping task", self.name),
        }
    }
}

impl Drop for WorkerLane {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_lane(name: &str, receiver: Receiver<Task>) {
    for task in receiver.iter() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            error!("Task on worker lane '{}' panicked: {}", name, panic_message(payload.as_ref()));
        }
    }
    debug!("Worker lane '{}' stopped", name);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
