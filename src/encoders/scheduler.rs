//! # Cooperative Scheduler
//!
//! Registry of fixed-interval repeating tasks driven by a single run loop.
//!
//! Tasks run to completion, one after the other, in registration order.
//! A task first fires one interval after it was registered. When the loop
//! falls more than one interval behind, the missed ticks are skipped rather
//! than replayed back to back.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::clock::ClockRef;
use crate::transport::Transport;

/// Handle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

type TaskFn = Box<dyn FnMut(&mut dyn Transport)>;

struct RepeatTask {
    id: TaskId,
    interval: Duration,
    next_due: Instant,
    callback: TaskFn,
}

/// Fixed-interval task scheduler
pub struct Scheduler {
    clock: ClockRef,
    tasks: Vec<RepeatTask>,
    next_id: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new(clock: ClockRef) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// Clock the scheduler runs on
    pub fn clock(&self) -> &ClockRef {
        &self.clock
    }

    /// Register a task that runs every `interval`
    pub fn on_repeat<F>(&mut self, interval: Duration, callback: F) -> TaskId
    where
        F: FnMut(&mut dyn Transport) + 'static,
    {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        self.tasks.push(RepeatTask {
            id,
            interval,
            next_due: self.clock.now() + interval,
            callback: Box::new(callback),
        });
        debug!("Scheduled task {:?} every {:?}", id, interval);

        id
    }

    /// Remove a task. Returns `false` if it was not scheduled.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            debug!("Removed task {:?}", id);
        }
        removed
    }

    /// Whether a task is currently scheduled
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Number of scheduled tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is scheduled
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest instant at which a task is due
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    /// Run every task that is due. Returns the number of tasks run.
    pub fn run_due(&mut self, transport: &mut dyn Transport) -> usize {
        let now = self.clock.now();
        let mut ran = 0;

        for task in self.tasks.iter_mut() {
            if now < task.next_due {
                continue;
            }

            (task.callback)(&mut *transport);
            ran += 1;

            task.next_due += task.interval;
            if task.next_due <= now {
                trace!("Task {:?} fell behind, skipping missed ticks", task.id);
                task.next_due = now + task.interval;
            }
        }

        ran
    }
}
