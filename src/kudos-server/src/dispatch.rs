//! Bounded job queue and worker pool.
//!
//! The webhook handler hands jobs off with [`Dispatcher::enqueue`], which
//! never waits: when the queue is full the job is dropped and logged, and the
//! request is still acknowledged. A fixed set of workers drains the queue.

use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::handlers::{EventHandlers, Job};

/// Result of handing a job to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The job is queued.
    Queued,
    /// The queue was full and the job was dropped.
    Dropped,
    /// The pool is shutting down and the job was dropped.
    Closed,
}

/// Owns the job queue and its workers.
pub struct Dispatcher {
    tx: Sender<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queued", &self.tx.len())
            .field("capacity", &self.tx.capacity())
            .field("workers", &self.workers.lock().len())
            .finish()
    }
}

impl Dispatcher {
    /// Spawn the worker pool. Must be called inside a tokio runtime.
    pub fn start(config: &DispatchConfig, handlers: Arc<EventHandlers>) -> Self {
        let (tx, rx) = async_channel::bounded(config.queue_capacity.max(1));

        let workers = (0..config.workers.max(1))
            .map(|id| tokio::spawn(worker_loop(id, rx.clone(), Arc::clone(&handlers))))
            .collect();

        info!(
            workers = config.workers,
            capacity = config.queue_capacity,
            "Dispatch pool started"
        );

        Self {
            tx,
            workers: Mutex::new(workers),
        }
    }

    /// Queue a job without waiting.
    pub fn enqueue(&self, job: Job) -> EnqueueOutcome {
        let kind = job.event.kind();
        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(kind, queued = self.tx.len(), "Job queued");
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                warn!(kind, capacity = ?self.tx.capacity(), "Job queue full, dropping event");
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                warn!(kind, "Job queue closed, dropping event");
                EnqueueOutcome::Closed
            }
        }
    }

    /// Number of jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.tx.len()
    }

    /// Stop accepting jobs, let workers drain the queue, and wait for them.
    ///
    /// Workers still running after `timeout` are aborted.
    pub async fn shutdown(&self, timeout: Duration) {
        self.tx.close();
        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return;
        }

        info!(pending = self.tx.len(), "Draining job queue");
        let aborts: Vec<_> = workers.iter().map(|w| w.abort_handle()).collect();
        let drain = futures::future::join_all(workers);

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!(?timeout, "Workers did not finish in time, aborting");
            for abort in aborts {
                abort.abort();
            }
        }
        info!("Dispatch pool stopped");
    }
}

async fn worker_loop(id: usize, rx: Receiver<Job>, handlers: Arc<EventHandlers>) {
    debug!(worker = id, "Worker started");
    while let Ok(job) = rx.recv().await {
        handlers.handle(job).await;
    }
    debug!(worker = id, "Worker finished");
}
