//! Downstream record sinks.
//!
//! [`BufferedSink`] is the bounded buffer between the dispatch workers and
//! whatever ships records out of the process. When it is full, the declared
//! [`BackpressurePolicy`] decides whether producers wait, the oldest record is
//! evicted, or the emission fails.

use std::collections::VecDeque;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use kube_topology_core::GenericRecord;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::warn;

use crate::config::{BackpressurePolicy, TopologyConfig};
use crate::{Result, TopologyError};

/// Receives finished records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Hand one record downstream.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::SinkUnavailable` if the sink is closed, or full
    /// and not allowed to block.
    async fn emit(&self, record: GenericRecord) -> Result<()>;
}

#[derive(Debug, Default)]
struct Buffer {
    records: VecDeque<GenericRecord>,
    closed: bool,
}

/// A bounded in-memory record buffer with a backpressure policy.
#[derive(Debug)]
pub struct BufferedSink {
    buffer: Mutex<Buffer>,
    capacity: usize,
    policy: BackpressurePolicy,
    readable: Notify,
    writable: Notify,
    dropped: AtomicU64,
}

impl BufferedSink {
    /// Create a sink holding at most `capacity` records (minimum one).
    #[must_use]
    pub fn new(capacity: usize, policy: BackpressurePolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Mutex::new(Buffer {
                records: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            policy,
            readable: Notify::new(),
            writable: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Create a sink sized and configured from `config`.
    #[must_use]
    pub fn from_config(config: &TopologyConfig) -> Self {
        Self::new(config.sink_capacity, config.backpressure)
    }

    /// Wait for the next record.
    ///
    /// Returns `None` once the sink is closed and drained.
    pub async fn recv(&self) -> Option<GenericRecord> {
        loop {
            let mut notified = pin!(self.readable.notified());
            notified.as_mut().enable();
            {
                let mut buffer = self.buffer.lock();
                if let Some(record) = buffer.records.pop_front() {
                    drop(buffer);
                    self.writable.notify_one();
                    return Some(record);
                }
                if buffer.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Take the next record without waiting.
    pub fn try_recv(&self) -> Option<GenericRecord> {
        let record = self.buffer.lock().records.pop_front();
        if record.is_some() {
            self.writable.notify_one();
        }
        record
    }

    /// Stop accepting records. Buffered records can still be received.
    pub fn close(&self) {
        self.buffer.lock().closed = true;
        self.readable.notify_waiters();
        self.writable.notify_waiters();
    }

    /// Check if the sink has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }

    /// Number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().records.len()
    }

    /// Check if no records are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().records.is_empty()
    }

    /// Buffer capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records evicted under `drop-oldest` so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RecordSink for BufferedSink {
    async fn emit(&self, record: GenericRecord) -> Result<()> {
        let mut record = Some(record);
        loop {
            let mut notified = pin!(self.writable.notified());
            notified.as_mut().enable();
            {
                let mut buffer = self.buffer.lock();
                if buffer.closed {
                    return Err(TopologyError::SinkUnavailable("sink is closed".to_string()));
                }
                if buffer.records.len() >= self.capacity {
                    match self.policy {
                        BackpressurePolicy::Block => {}
                        BackpressurePolicy::DropOldest => {
                            buffer.records.pop_front();
                            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                            warn!(capacity = self.capacity, dropped, "Sink full, evicted oldest record");
                        }
                        BackpressurePolicy::Reject => {
                            return Err(TopologyError::SinkUnavailable(format!(
                                "buffer full ({} records)",
                                self.capacity
                            )));
                        }
                    }
                }
                if buffer.records.len() < self.capacity {
                    if let Some(record) = record.take() {
                        buffer.records.push_back(record);
                    }
                    drop(buffer);
                    self.readable.notify_one();
                    return Ok(());
                }
            }
            notified.await;
        }
    }
}

/// A sink that keeps every record in memory.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<GenericRecord>>,
    unavailable: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record received so far.
    #[must_use]
    pub fn records(&self) -> Vec<GenericRecord> {
        self.records.lock().clone()
    }

    /// Take every record received so far.
    pub fn take(&self) -> Vec<GenericRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Number of records received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if no records were received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Make every following emission fail with `SinkUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RecordSink for MemorySink {
    async fn emit(&self, record: GenericRecord) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TopologyError::SinkUnavailable("memory sink unavailable".to_string()));
        }
        self.records.lock().push(record);
        Ok(())
    }
}
