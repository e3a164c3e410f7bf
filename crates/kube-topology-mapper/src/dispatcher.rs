//! Routing of notifications to mappers and of records to the sink.
//!
//! The dispatcher owns the watch-driven side of the pipeline: it keeps the
//! key set current, runs the matching mapper, and forwards every record to
//! the sink. Failures are contained to the key that caused them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use kube_topology_core::{GenericRecord, Method, ObservedWindow, TopologyKey};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CachedObject, TopologyCache};
use crate::clock::{Clock, SystemClock};
use crate::config::TopologyConfig;
use crate::envelope::MapContext;
use crate::object::{LinkWrapper, ObjectWrapper, TopologyObject};
use crate::registry::MapperRegistry;
use crate::sink::RecordSink;
use crate::{Result, TopologyError};

/// A unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub enum Job {
    /// An entity notification.
    Entity {
        /// The resource and its window.
        wrapper: ObjectWrapper,
        /// Upsert or delete.
        method: Method,
    },
    /// A link notification.
    Link {
        /// The joined pair and its window.
        wrapper: LinkWrapper,
        /// Upsert or delete.
        method: Method,
    },
    /// Re-emit a cached key as an upsert.
    Refresh(TopologyKey),
    /// Emit a delete for a cached key whose object is gone.
    Retire(TopologyKey),
}

impl Job {
    /// Key the job concerns. Jobs with equal keys must run in order.
    #[must_use]
    pub fn key(&self) -> TopologyKey {
        match self {
            Self::Entity { wrapper, .. } => wrapper.key().into(),
            Self::Link { wrapper, .. } => wrapper.key().into(),
            Self::Refresh(key) | Self::Retire(key) => key.clone(),
        }
    }
}

/// Accepts jobs for processing.
#[async_trait]
pub trait JobRouter: Send + Sync {
    /// Submit a job.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::ShuttingDown` once the router no longer
    /// accepts work.
    async fn submit(&self, job: Job) -> Result<()>;
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Records accepted by the sink.
    pub emitted: usize,
    /// Records the sink refused.
    pub dropped: usize,
    /// Mapping failed; no records were produced.
    pub failed: bool,
    /// The notification was skipped (unknown kind or disabled relation).
    pub skipped: bool,
}

impl DispatchReport {
    fn failed() -> Self {
        Self {
            failed: true,
            ..Self::default()
        }
    }

    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Running totals across all dispatches.
#[derive(Debug, Default)]
pub struct DispatchStats {
    emitted: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Records accepted by the sink.
    pub emitted: u64,
    /// Records the sink refused.
    pub dropped: u64,
    /// Notifications whose mapping failed.
    pub failed: u64,
    /// Notifications skipped.
    pub skipped: u64,
}

impl DispatchStats {
    fn record(&self, report: &DispatchReport) {
        self.emitted
            .fetch_add(report.emitted as u64, Ordering::Relaxed);
        self.dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);
        if report.failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if report.skipped {
            self.skipped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current totals.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            emitted: self.emitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Routes notifications to mappers and records to the sink.
pub struct Dispatcher {
    config: Arc<TopologyConfig>,
    registry: MapperRegistry,
    cache: Arc<TopologyCache>,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
    stats: DispatchStats,
    unknown_kinds: Mutex<HashSet<String>>,
}

impl Dispatcher {
    /// Create a dispatcher from its collaborators.
    #[must_use]
    pub fn new(
        config: Arc<TopologyConfig>,
        registry: MapperRegistry,
        cache: Arc<TopologyCache>,
        sink: Arc<dyn RecordSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            registry,
            cache,
            sink,
            clock,
            stats: DispatchStats::default(),
            unknown_kinds: Mutex::new(HashSet::new()),
        }
    }

    /// Create a dispatcher with the standard mappers, an empty cache and the
    /// system clock.
    #[must_use]
    pub fn with_defaults(config: Arc<TopologyConfig>, sink: Arc<dyn RecordSink>) -> Self {
        Self::new(
            config,
            MapperRegistry::standard(),
            Arc::new(TopologyCache::new()),
            sink,
            Arc::new(SystemClock),
        )
    }

    /// The injected configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<TopologyConfig> {
        &self.config
    }

    /// The live key set.
    #[must_use]
    pub fn cache(&self) -> &Arc<TopologyCache> {
        &self.cache
    }

    /// The clock used for record timestamps.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle an entity notification.
    ///
    /// An upsert replaces the key's cache entry; a delete removes it before
    /// the delete record is emitted, so the key drops out of later
    /// keepalive ticks.
    pub async fn dispatch(&self, wrapper: ObjectWrapper, method: Method) -> DispatchReport {
        let key = TopologyKey::from(wrapper.key());
        match method {
            Method::Upsert => self.cache.insert(CachedObject::Entity(wrapper.clone())),
            Method::Delete => {
                self.cache.remove(&key);
            }
        }
        self.finish(self.emit_entity(&key, &wrapper, method).await)
    }

    /// Handle a link notification.
    ///
    /// Links of a disabled relation are skipped and never cached.
    pub async fn dispatch_link(&self, wrapper: LinkWrapper, method: Method) -> DispatchReport {
        let relation = wrapper.pair.relation();
        if !self.config.relation_enabled(relation) {
            debug!(relation = %relation, "Relation disabled, skipping link");
            return self.finish(DispatchReport::skipped());
        }
        let key = TopologyKey::from(wrapper.key());
        match method {
            Method::Upsert => self.cache.insert(CachedObject::Link(wrapper.clone())),
            Method::Delete => {
                self.cache.remove(&key);
            }
        }
        self.finish(self.emit_link(&key, &wrapper, method).await)
    }

    /// Narrow an untyped object into a wrapper.
    ///
    /// Unsupported kinds are logged once per kind name; decode failures are
    /// logged every time.
    ///
    /// # Errors
    ///
    /// Returns the already counted report when the object cannot be
    /// narrowed: skipped for an unsupported kind, failed for a decode error.
    pub fn narrow(
        &self,
        kind: &str,
        raw: serde_json::Value,
        window: ObservedWindow,
    ) -> std::result::Result<ObjectWrapper, DispatchReport> {
        match TopologyObject::from_dynamic(kind, raw) {
            Ok(object) => Ok(ObjectWrapper::new(object, window)),
            Err(TopologyError::UnsupportedKind(kind)) => {
                if self.unknown_kinds.lock().insert(kind.clone()) {
                    warn!(kind = %kind, "Unsupported kind, skipping its notifications");
                }
                Err(self.finish(DispatchReport::skipped()))
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to decode object");
                Err(self.finish(DispatchReport::failed()))
            }
        }
    }

    /// Handle an untyped entity notification.
    pub async fn dispatch_raw(
        &self,
        kind: &str,
        raw: serde_json::Value,
        window: ObservedWindow,
        method: Method,
    ) -> DispatchReport {
        match self.narrow(kind, raw, window) {
            Ok(wrapper) => self.dispatch(wrapper, method).await,
            Err(report) => report,
        }
    }

    /// Re-emit a cached key as an upsert with its window extended to now.
    ///
    /// A key that is no longer cached (deleted since the tick started) is
    /// skipped silently.
    pub async fn refresh(&self, key: &TopologyKey) -> DispatchReport {
        let Some(entry) = self.cache.get(key) else {
            return DispatchReport::default();
        };
        let refreshed = entry.refreshed(self.clock.now());
        self.cache.insert(refreshed.clone());
        let report = match &refreshed {
            CachedObject::Entity(wrapper) => self.emit_entity(key, wrapper, Method::Upsert).await,
            CachedObject::Link(wrapper) => self.emit_link(key, wrapper, Method::Upsert).await,
        };
        self.finish(report)
    }

    /// Uncache a key and emit a delete from its last cached state, with the
    /// window closed at now.
    ///
    /// Used when the object vanished without a delete notification. A key
    /// that is not cached is skipped silently.
    pub async fn retire(&self, key: &TopologyKey) -> DispatchReport {
        let Some(entry) = self.cache.remove(key) else {
            return DispatchReport::default();
        };
        let report = match entry.refreshed(self.clock.now()) {
            CachedObject::Entity(wrapper) => self.emit_entity(key, &wrapper, Method::Delete).await,
            CachedObject::Link(wrapper) => self.emit_link(key, &wrapper, Method::Delete).await,
        };
        self.finish(report)
    }

    /// Run one job to completion.
    pub async fn process(&self, job: Job) -> DispatchReport {
        match job {
            Job::Entity { wrapper, method } => self.dispatch(wrapper, method).await,
            Job::Link { wrapper, method } => self.dispatch_link(wrapper, method).await,
            Job::Refresh(key) => self.refresh(&key).await,
            Job::Retire(key) => self.retire(&key).await,
        }
    }

    async fn emit_entity(
        &self,
        key: &TopologyKey,
        wrapper: &ObjectWrapper,
        method: Method,
    ) -> DispatchReport {
        let kind = wrapper.object.kind();
        let Some(mapper) = self.registry.entity(kind) else {
            debug!(kind = %kind, "No mapper registered, skipping");
            return DispatchReport::skipped();
        };
        let ctx = MapContext::new(&self.config, method, wrapper.window, self.clock.now());
        match mapper.map(&wrapper.object, &ctx) {
            Ok(records) => self.emit_all(key, records).await,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to map entity");
                DispatchReport::failed()
            }
        }
    }

    async fn emit_link(
        &self,
        key: &TopologyKey,
        wrapper: &LinkWrapper,
        method: Method,
    ) -> DispatchReport {
        let relation = wrapper.pair.relation();
        let Some(mapper) = self.registry.link(relation) else {
            debug!(relation = %relation, "No mapper registered, skipping");
            return DispatchReport::skipped();
        };
        let ctx = MapContext::new(&self.config, method, wrapper.window, self.clock.now());
        match mapper.map(&wrapper.pair, &ctx) {
            Some(record) => self.emit_all(key, vec![record]).await,
            None => DispatchReport::skipped(),
        }
    }

    async fn emit_all(&self, key: &TopologyKey, records: Vec<GenericRecord>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for record in records {
            match self.sink.emit(record).await {
                Ok(()) => report.emitted += 1,
                Err(e) => {
                    report.dropped += 1;
                    warn!(key = %key, error = %e, "Sink refused record");
                }
            }
        }
        debug!(key = %key, emitted = report.emitted, dropped = report.dropped, "Dispatched");
        report
    }

    fn finish(&self, report: DispatchReport) -> DispatchReport {
        self.stats.record(&report);
        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("keys", &self.cache.len())
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Processes each job inline, in submission order.
#[async_trait]
impl JobRouter for Dispatcher {
    async fn submit(&self, job: Job) -> Result<()> {
        self.process(job).await;
        Ok(())
    }
}
