//! Bounded worker pool with future-style result handles.
//!
//! A [`WorkerPool`] owns a fixed number of OS threads that consume a bounded
//! queue of tasks. Every accepted task is executed exactly once and its
//! outcome is written exactly once into the [`TaskFuture`] returned by
//! [`WorkerPool::submit`]. Submitting blocks while the queue is full, which is
//! the backpressure valve against unbounded fan-out.
//!
//! ```
//! use utils::worker_pool::{PendingTasks, WorkerPool};
//!
//! let pool = WorkerPool::<String>::new(2, 2).expect("pool");
//! let mut pending = PendingTasks::new();
//! pending.submit(&pool, || Ok(())).expect("submit");
//! pending.submit(&pool, || Err("boom".to_string())).expect("submit");
//!
//! let failed = pending.wait_all().expect_err("one task failed");
//! assert_eq!(failed.failed, 1);
//! assert_eq!(failed.total, 2);
//! ```

use std::any::Any;
use std::fmt;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::RwLock;
use std::thread;
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::debug;
use tracing::trace;

/// A zero-argument unit of work.
pub type Task<E> = Box<dyn FnOnce() -> Result<(), E> + Send + 'static>;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("worker pool needs at least one {0}")]
    InvalidSize(&'static str),

    #[error("failed to spawn worker thread: `{0}`")]
    Spawn(#[from] std::io::Error),

    #[error("worker pool is shut down")]
    ShutDown,
}

/// Terminal failure recorded in a [`TaskFuture`].
#[derive(Debug)]
pub enum TaskFailure<E> {
    /// The task returned an error.
    Error(Arc<E>),
    /// The task panicked; the payload message is kept for diagnostics.
    Panicked { message: Arc<str> },
}

impl<E> Clone for TaskFailure<E> {
    fn clone(&self) -> Self {
        match self {
            TaskFailure::Error(error) => TaskFailure::Error(Arc::clone(error)),
            TaskFailure::Panicked { message } => TaskFailure::Panicked {
                message: Arc::clone(message),
            },
        }
    }
}

impl<E: fmt::Display> fmt::Display for TaskFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Error(error) => write!(f, "task failed: {error}"),
            TaskFailure::Panicked { message } => write!(f, "task panicked: {message}"),
        }
    }
}

type Outcome<E> = Result<(), TaskFailure<E>>;

struct FutureState<E> {
    outcome: Mutex<Option<Outcome<E>>>,
    completed: Condvar,
}

/// Handle to the single outcome of a submitted task.
///
/// Cloning the handle shares the same outcome; any number of threads may
/// [`wait`](TaskFuture::wait) on it, any number of times.
pub struct TaskFuture<E> {
    state: Arc<FutureState<E>>,
}

impl<E> Clone for TaskFuture<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E> fmt::Debug for TaskFuture<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFuture")
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<E> TaskFuture<E> {
    fn pending() -> (Self, Completer<E>) {
        let state = Arc::new(FutureState {
            outcome: Mutex::new(None),
            completed: Condvar::new(),
        });
        (
            Self {
                state: Arc::clone(&state),
            },
            Completer { state },
        )
    }

    /// Blocks until the task has run and returns its outcome.
    ///
    /// There is no timeout: a future whose task is never executed never
    /// completes. The pool executes every accepted task.
    pub fn wait(&self) -> Result<(), TaskFailure<E>> {
        let mut outcome = self.state.outcome.lock().expect("poisoned");
        loop {
            if let Some(outcome) = outcome.as_ref() {
                return outcome.clone();
            }
            outcome = self.state.completed.wait(outcome).expect("poisoned");
        }
    }

    /// Whether the outcome has been recorded.
    pub fn is_completed(&self) -> bool {
        self.state.outcome.lock().expect("poisoned").is_some()
    }
}

/// Write side of a [`TaskFuture`]. Consumed by the single write.
struct Completer<E> {
    state: Arc<FutureState<E>>,
}

impl<E> Completer<E> {
    fn complete(self, result: Outcome<E>) {
        let mut outcome = self.state.outcome.lock().expect("poisoned");
        debug_assert!(outcome.is_none(), "future completed twice");
        *outcome = Some(result);
        self.state.completed.notify_all();
    }
}

struct Job<E> {
    task: Task<E>,
    completer: Completer<E>,
}

impl<E> Job<E> {
    fn run(self) {
        let Job { task, completer } = self;
        let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(TaskFailure::Error(Arc::new(error))),
            Err(payload) => Err(TaskFailure::Panicked {
                message: panic_message(payload.as_ref()).into(),
            }),
        };
        completer.complete(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Fixed-size pool of worker threads consuming a bounded task queue.
pub struct WorkerPool<E> {
    sender: RwLock<Option<SyncSender<Job<E>>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    queue_capacity: usize,
}

impl<E> WorkerPool<E>
where
    E: Send + Sync + 'static,
{
    /// Starts `worker_count` threads sharing a queue of `queue_capacity` slots.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::InvalidSize`] if either size is zero
    /// - [`SchedulerError::Spawn`] if a worker thread cannot be started
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self, SchedulerError> {
        if worker_count == 0 {
            return Err(SchedulerError::InvalidSize("worker"));
        }
        if queue_capacity == 0 {
            return Err(SchedulerError::InvalidSize("queue slot"));
        }

        let (sender, receiver) = mpsc::sync_channel::<Job<E>>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let pool = Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(worker_count)),
            worker_count,
            queue_capacity,
        };

        for index in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("nsone-worker-{index}"))
                .spawn(move || worker_loop(index, receiver));
            match handle {
                Ok(handle) => pool.workers.lock().expect("poisoned").push(handle),
                Err(error) => {
                    pool.shutdown();
                    return Err(SchedulerError::Spawn(error));
                }
            }
        }

        debug!(worker_count, queue_capacity, "Worker pool started");
        Ok(pool)
    }

    /// Enqueues `task` and returns the future of its outcome.
    ///
    /// Blocks while the queue is full.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::ShutDown`] if the pool no longer accepts tasks
    pub fn submit<F>(&self, task: F) -> Result<TaskFuture<E>, SchedulerError>
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        // Clone so a full queue does not block shutdown on the lock.
        let sender = self
            .sender
            .read()
            .expect("poisoned")
            .clone()
            .ok_or(SchedulerError::ShutDown)?;

        let (future, completer) = TaskFuture::pending();
        sender
            .send(Job {
                task: Box::new(task),
                completer,
            })
            .map_err(|_| SchedulerError::ShutDown)?;
        Ok(future)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }
}

impl<E> WorkerPool<E> {
    /// Stops accepting tasks, lets queued tasks drain and joins the workers.
    ///
    /// Calling it more than once is a no-op.
    pub fn shutdown(&self) {
        let sender = self.sender.write().expect("poisoned").take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock().expect("poisoned"));
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread terminated abnormally");
            }
        }
        debug!("Worker pool shut down");
    }
}

impl<E> Drop for WorkerPool<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<E>(index: usize, receiver: Arc<Mutex<Receiver<Job<E>>>>) {
    trace!(worker = index, "Worker started");
    loop {
        let job = {
            let receiver = receiver.lock().expect("poisoned");
            receiver.recv()
        };
        match job {
            Ok(job) => job.run(),
            // all senders dropped and the queue is drained
            Err(_) => break,
        }
    }
    trace!(worker = index, "Worker stopped");
}

/// Failure summary of [`PendingTasks::wait_all`].
#[derive(Debug)]
pub struct FailedTasks<E> {
    /// First failure in submission order.
    pub first: TaskFailure<E>,
    pub failed: usize,
    pub total: usize,
}

/// Futures of one fan-out, awaited together.
pub struct PendingTasks<E> {
    futures: Vec<TaskFuture<E>>,
}

impl<E> Default for PendingTasks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> PendingTasks<E> {
    pub fn new() -> Self {
        Self {
            futures: Vec::new(),
        }
    }

    pub fn push(&mut self, future: TaskFuture<E>) {
        self.futures.push(future);
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }

    /// Waits for every future, then reports the first failure in submission
    /// order, if any.
    pub fn wait_all(&self) -> Result<(), FailedTasks<E>> {
        let mut first = None;
        let mut failed = 0;
        for future in &self.futures {
            if let Err(failure) = future.wait() {
                failed += 1;
                first.get_or_insert(failure);
            }
        }
        match first {
            None => Ok(()),
            Some(first) => Err(FailedTasks {
                first,
                failed,
                total: self.futures.len(),
            }),
        }
    }
}

impl<E> PendingTasks<E>
where
    E: Send + Sync + 'static,
{
    /// Submits `task` to `pool` and tracks its future.
    pub fn submit<F>(&mut self, pool: &WorkerPool<E>, task: F) -> Result<(), SchedulerError>
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
    {
        let future = pool.submit(task)?;
        self.push(future);
        Ok(())
    }
}
