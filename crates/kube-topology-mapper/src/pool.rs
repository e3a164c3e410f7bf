//! Sharded dispatch workers.
//!
//! Every key hashes to exactly one worker, and each worker runs its jobs one
//! at a time in queue order. Jobs for one key therefore never overlap and
//! never reorder, while distinct keys spread across workers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use kube_topology_core::TopologyKey;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, Job, JobRouter};
use crate::{Result, TopologyError};

/// A fixed set of dispatch workers with bounded per-worker queues.
#[derive(Debug)]
pub struct WorkerPool {
    senders: Vec<mpsc::Sender<Job>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    token: CancellationToken,
}

impl WorkerPool {
    /// Spawn `workers` workers (minimum one), each with a queue of
    /// `queue_depth` jobs (minimum one).
    ///
    /// When `token` is cancelled, workers stop taking new jobs, finish the
    /// jobs already queued, and exit.
    #[must_use]
    pub fn spawn(
        dispatcher: Arc<Dispatcher>,
        workers: usize,
        queue_depth: usize,
        token: CancellationToken,
    ) -> Self {
        let workers = workers.max(1);
        let queue_depth = queue_depth.max(1);
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let (tx, rx) = mpsc::channel(queue_depth);
            senders.push(tx);
            handles.push(tokio::spawn(run_worker(
                id,
                Arc::clone(&dispatcher),
                rx,
                token.clone(),
            )));
        }

        info!(workers, queue_depth, "Dispatch workers started");
        Self {
            senders,
            handles: Mutex::new(handles),
            token,
        }
    }

    /// Spawn workers sized from the dispatcher's configuration.
    #[must_use]
    pub fn from_config(dispatcher: Arc<Dispatcher>, token: CancellationToken) -> Self {
        let workers = dispatcher.config().workers;
        let queue_depth = dispatcher.config().queue_depth;
        Self::spawn(dispatcher, workers, queue_depth, token)
    }

    /// Index of the worker that owns `key`.
    #[must_use]
    pub fn shard_for(&self, key: &TopologyKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let shards = self.senders.len() as u64;
        // The remainder is below the worker count, which fits in usize.
        usize::try_from(hasher.finish() % shards).unwrap_or_default()
    }

    /// Number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Wait for every worker to exit.
    ///
    /// Workers only exit after the cancellation token fires.
    pub async fn join(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Dispatch worker panicked");
            }
        }
    }
}

#[async_trait]
impl JobRouter for WorkerPool {
    async fn submit(&self, job: Job) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(TopologyError::ShuttingDown);
        }
        let shard = self.shard_for(&job.key());
        self.senders[shard]
            .send(job)
            .await
            .map_err(|_| TopologyError::ShuttingDown)
    }
}

async fn run_worker(
    id: usize,
    dispatcher: Arc<Dispatcher>,
    mut rx: mpsc::Receiver<Job>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => {
                    dispatcher.process(job).await;
                }
                None => break,
            },
        }
    }

    // Refuse new jobs, then finish what is already queued.
    rx.close();
    let mut drained = 0usize;
    while let Some(job) = rx.recv().await {
        dispatcher.process(job).await;
        drained += 1;
    }
    debug!(worker = id, drained, "Dispatch worker drained");
    info!(worker = id, "Dispatch worker stopped");
}
