//! Bounded worker pool for search tasks
//!
//! Owns a bounded task queue and a fixed number of worker tasks that pull
//! queued requests, run the cache-aside resolver, and answer each caller on a
//! private oneshot channel. Constructed explicitly with its resolver so tests
//! can wire in store and provider doubles.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::resolver::Resolver;
use crate::task::{SearchRequest, TaskError, TaskResult};

/// One unit of work queued for the pool
struct Task {
    request: SearchRequest,
    cancel: CancellationToken,
    respond: oneshot::Sender<TaskResult>,
}

/// Awaitable handle to one submitted task's result
///
/// The caller owns the receiving end of the task's private response channel;
/// awaiting the handle blocks until the worker delivers exactly one result.
#[derive(Debug)]
pub struct TaskHandle {
    receiver: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    /// Waits for the task's single result
    pub async fn wait(self) -> TaskResult {
        // A worker never drops a dequeued task; the sender only disappears if
        // the pool is torn down before the task ran.
        self.receiver.await.unwrap_or(Err(TaskError::Shutdown))
    }
}

/// Fixed-size pool of workers sharing one bounded FIFO queue
///
/// Any idle worker may claim the next queued task; fairness across workers is
/// not guaranteed. Each worker handles one task at a time and writes exactly
/// one result per task.
pub struct Dispatcher {
    queue: mpsc::Sender<Task>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns `workers` worker tasks sharing a queue of `queue_capacity`
    pub fn spawn(resolver: Resolver, workers: usize, queue_capacity: usize) -> Self {
        let (queue, receiver) = mpsc::channel(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let resolver = Arc::new(resolver);

        let workers = (0..workers)
            .map(|id| tokio::spawn(worker_loop(id, receiver.clone(), resolver.clone())))
            .collect();

        Self { queue, workers }
    }

    /// Submits one request to the pool without blocking
    ///
    /// # Returns
    /// * `Ok(TaskHandle)` once the task is enqueued
    /// * `Err(TaskError::InvalidRequest)` if the request fails validation
    /// * `Err(TaskError::QueueFull)` if the bounded queue is at capacity;
    ///   retrying (bounded by the task's own deadline) is the caller's call
    /// * `Err(TaskError::Shutdown)` if the pool no longer accepts tasks
    pub fn submit(
        &self,
        request: SearchRequest,
        cancel: CancellationToken,
    ) -> Result<TaskHandle, TaskError> {
        request.validate()?;

        let (respond, receiver) = oneshot::channel();
        let task = Task {
            request,
            cancel,
            respond,
        };
        self.queue.try_send(task).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => TaskError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TaskError::Shutdown,
        })?;

        Ok(TaskHandle { receiver })
    }

    /// Closes the queue and waits for every worker to finish
    ///
    /// Already-queued and in-flight tasks still complete; new submissions are
    /// rejected the moment the queue closes.
    pub async fn shutdown(self) {
        drop(self.queue);
        for worker in self.workers {
            if worker.await.is_err() {
                warn!("worker panicked during shutdown");
            }
        }
    }
}

/// Runs until the queue is closed and drained
async fn worker_loop(id: usize, queue: Arc<Mutex<mpsc::Receiver<Task>>>, resolver: Arc<Resolver>) {
    loop {
        // Hold the lock only while waiting for one task; resolution happens
        // outside it so other workers can dequeue concurrently.
        let task = queue.lock().await.recv().await;
        let Some(task) = task else {
            break;
        };

        debug!(worker = id, topic = %task.request.topic, "task dequeued");
        let result = resolver.resolve(&task.request, &task.cancel).await;
        if task.respond.send(result).is_err() {
            debug!(worker = id, topic = %task.request.topic, "caller gave up before delivery");
        }
    }
    debug!(worker = id, "worker terminated");
}
