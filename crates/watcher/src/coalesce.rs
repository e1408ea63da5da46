//! Single-flight update coalescing
//!
//! An [`UpdateCoalescer`] turns an unbounded stream of "please recompute"
//! requests into a bounded sequence of runs of one update task:
//! - at most one run executes at any instant
//! - a request while idle schedules a run on the executor
//! - requests while a run executes collapse into exactly one follow-up run
//! - requests while a run is scheduled but not started are absorbed by it
//!
//! Intermediate states may be skipped, but the last request before producers
//! go quiet is always followed by a run that observes the state at that time.

use crate::executor::TaskExecutor;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The update task run by a coalescer
pub type UpdateTask = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// Where the coalescer is in its run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalescerState {
    /// Nothing running, nothing queued
    Idle,
    /// A run was handed to the executor but has not started yet
    Scheduled,
    /// A run is executing and nothing new was requested since it started
    Running,
    /// A run is executing and one more run must follow it
    RunningWithPending,
}

/// Coalescer tuning
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// Name used in log events
    pub name: String,
    /// Pause between picking up a run and executing it, absorbing burst tails
    pub settle_delay: Duration,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            name: "update-coalescer".to_string(),
            settle_delay: Duration::ZERO,
        }
    }
}

/// Counters describing how requests were handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Calls to [`UpdateCoalescer::schedule`]
    pub requested: u64,
    /// Requests absorbed by an already queued or pending run
    pub coalesced: u64,
    /// Task executions started
    pub runs: u64,
    /// Task executions that returned an error or panicked
    pub failures: u64,
}

/// Single-flight runner for one update task
///
/// Cloning yields another handle to the same coalescer.
#[derive(Clone)]
pub struct UpdateCoalescer {
    inner: Arc<Inner>,
}

struct Inner {
    config: CoalescerConfig,
    executor: Arc<dyn TaskExecutor>,
    task: Box<UpdateTask>,
    state: Mutex<CoalescerState>,
    idle: Condvar,
    requested: AtomicU64,
    coalesced: AtomicU64,
    runs: AtomicU64,
    failures: AtomicU64,
}

impl UpdateCoalescer {
    /// Create a coalescer with default configuration
    pub fn new<F>(executor: Arc<dyn TaskExecutor>, task: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_config(executor, CoalescerConfig::default(), task)
    }

    /// Create a coalescer with explicit configuration
    pub fn with_config<F>(executor: Arc<dyn TaskExecutor>, config: CoalescerConfig, task: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                config,
                executor,
                task: Box::new(task),
                state: Mutex::new(CoalescerState::Idle),
                idle: Condvar::new(),
                requested: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
                runs: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Request a run of the update task
    ///
    /// Never waits for the task. Only an idle coalescer submits work to the
    /// executor; every other state just records the request.
    pub fn schedule(&self) {
        self.inner.requested.fetch_add(1, Ordering::Relaxed);

        let submit = {
            let mut state = self.inner.state.lock();
            match *state {
                CoalescerState::Idle => {
                    *state = CoalescerState::Scheduled;
                    true
                }
                CoalescerState::Running => {
                    *state = CoalescerState::RunningWithPending;
                    false
                }
                CoalescerState::Scheduled | CoalescerState::RunningWithPending => {
                    self.inner.coalesced.fetch_add(1, Ordering::Relaxed);
                    false
                }
            }
        };

        if submit {
            self.inner.submit();
        }
    }

    /// Current state of the run cycle
    pub fn state(&self) -> CoalescerState {
        *self.inner.state.lock()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == CoalescerState::Idle
    }

    /// Snapshot of the request counters
    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            requested: self.inner.requested.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
            runs: self.inner.runs.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
        }
    }

    /// Block until no run is scheduled or executing
    ///
    /// Returns `false` if `timeout` elapsed first. Not meant for producers;
    /// shutdown paths and tests use it to wait for convergence.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();

        while *state != CoalescerState::Idle {
            if self.inner.idle.wait_until(&mut state, deadline).timed_out() {
                return *state == CoalescerState::Idle;
            }
        }
        true
    }
}

impl Inner {
    fn submit(self: &Arc<Self>) {
        let inner = Arc::clone(self);
        self.executor.execute(Box::new(move || inner.drain()));
    }

    /// Execute scheduled runs until no follow-up is requested
    fn drain(self: &Arc<Self>) {
        loop {
            if !self.config.settle_delay.is_zero() {
                thread::sleep(self.config.settle_delay);
            }

            *self.state.lock() = CoalescerState::Running;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.run_once())) {
                self.recover_from_panic();
                panic::resume_unwind(payload);
            }

            let mut state = self.state.lock();
            if *state == CoalescerState::RunningWithPending {
                // Requests made from now on are absorbed by the follow-up
                *state = CoalescerState::Scheduled;
                continue;
            }

            *state = CoalescerState::Idle;
            self.idle.notify_all();
            break;
        }
    }

    fn run_once(&self) {
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("{}: starting run #{}", self.config.name, run);

        if let Err(e) = (self.task)() {
            self.failures.fetch_add(1, Ordering::Relaxed);
            warn!("{}: run #{} failed: {:#}", self.config.name, run, e);
        }
    }

    /// Restore the state machine after the update task panicked
    ///
    /// Runs before the panic is resumed, outside any unwinding, so a
    /// follow-up requested during the failed run can be submitted again even
    /// on an inline executor.
    fn recover_from_panic(self: &Arc<Self>) {
        self.failures.fetch_add(1, Ordering::Relaxed);

        let resubmit = {
            let mut state = self.state.lock();
            warn!("{}: update task panicked in state {:?}", self.config.name, *state);
            if *state == CoalescerState::RunningWithPending {
                *state = CoalescerState::Scheduled;
                true
            } else {
                *state = CoalescerState::Idle;
                self.idle.notify_all();
                false
            }
        };

        if resubmit {
            self.submit();
        }
    }
}
