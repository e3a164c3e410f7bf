//! Cluster watch ingestion.
//!
//! Runs one `kube` watcher per supported kind and turns its events into
//! dispatch jobs: applies become upserts, deletes become deletes. When a
//! relist completes, objects it no longer returned are retired, since their
//! deletes happened while the watch was down. This layer only feeds
//! entities; relationship discovery happens elsewhere and submits link jobs
//! through the same router.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use kube::api::Api;
use kube::runtime::watcher::{self, watcher, Config as WatcherConfig};
use kube::{Client, Resource};
use kube_topology_core::{EntityKey, Method, ObservedWindow};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::dispatcher::{Job, JobRouter};
use crate::object::{ObjectWrapper, TopologyObject};
use crate::TopologyError;

/// Remembers when each object of one kind was first observed, and which
/// objects the current relist has returned.
#[derive(Debug, Default)]
pub struct ObservedTracker {
    first_seen: HashMap<EntityKey, i64>,
    relisted: Option<HashSet<EntityKey>>,
}

impl ObservedTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation at `now` and return the object's window.
    pub fn observe(&mut self, key: EntityKey, now: i64) -> ObservedWindow {
        if let Some(relisted) = self.relisted.as_mut() {
            relisted.insert(key.clone());
        }
        let first = *self.first_seen.entry(key).or_insert(now);
        ObservedWindow::new(first, now)
    }

    /// Forget an object at `now` and return its final window.
    pub fn forget(&mut self, key: &EntityKey, now: i64) -> ObservedWindow {
        if let Some(relisted) = self.relisted.as_mut() {
            relisted.remove(key);
        }
        let first = self.first_seen.remove(key).unwrap_or(now);
        ObservedWindow::new(first, now)
    }

    /// Start a relist. Objects not observed again before
    /// [`finish_relist`](Self::finish_relist) are stale.
    pub fn begin_relist(&mut self) {
        self.relisted = Some(HashSet::new());
    }

    /// End the relist, forgetting every object it did not return.
    ///
    /// Returns the forgotten keys in order. Without a relist in progress
    /// nothing is forgotten.
    pub fn finish_relist(&mut self) -> Vec<EntityKey> {
        let Some(relisted) = self.relisted.take() else {
            return Vec::new();
        };
        let mut stale: Vec<EntityKey> = self
            .first_seen
            .keys()
            .filter(|key| !relisted.contains(*key))
            .cloned()
            .collect();
        stale.sort_unstable();
        for key in &stale {
            self.first_seen.remove(key);
        }
        stale
    }

    /// Number of tracked objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    /// Check if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}

/// Turn one watch event into dispatch jobs.
///
/// `Init` starts a relist and `InitDone` retires every tracked object the
/// relist did not return.
pub fn jobs_for_event<K>(
    event: watcher::Event<K>,
    tracker: &mut ObservedTracker,
    now: i64,
) -> Vec<Job>
where
    TopologyObject: From<K>,
{
    match event {
        watcher::Event::Apply(object) | watcher::Event::InitApply(object) => {
            let object = TopologyObject::from(object);
            let window = tracker.observe(object.key(), now);
            vec![Job::Entity {
                wrapper: ObjectWrapper::new(object, window),
                method: Method::Upsert,
            }]
        }
        watcher::Event::Delete(object) => {
            let object = TopologyObject::from(object);
            let window = tracker.forget(&object.key(), now);
            vec![Job::Entity {
                wrapper: ObjectWrapper::new(object, window),
                method: Method::Delete,
            }]
        }
        watcher::Event::Init => {
            tracker.begin_relist();
            Vec::new()
        }
        watcher::Event::InitDone => tracker
            .finish_relist()
            .into_iter()
            .map(|key| Job::Retire(key.into()))
            .collect(),
    }
}

/// Watch every object of kind `K` and submit a job per event until `token`
/// is cancelled or the router shuts down.
pub async fn watch_kind<K>(
    api: Api<K>,
    router: Arc<dyn JobRouter>,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
) where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + 'static,
    TopologyObject: From<K>,
{
    let kind = K::kind(&()).to_string();
    let stream = watcher(api, WatcherConfig::default());
    futures::pin_mut!(stream);

    let mut tracker = ObservedTracker::new();
    info!(kind = %kind, "Starting watcher");

    'events: loop {
        let event = tokio::select! {
            biased;
            () = token.cancelled() => break,
            event = stream.next() => event,
        };
        let Some(event) = event else {
            warn!(kind = %kind, "Watch stream ended unexpectedly");
            break;
        };

        let event = match event {
            Ok(event) => event,
            Err(e) => {
                error!(kind = %kind, error = %e, "Watcher error, will retry");
                // The watcher will automatically reconnect
                continue;
            }
        };
        let init_done = matches!(event, watcher::Event::InitDone);
        if matches!(event, watcher::Event::Init) {
            info!(kind = %kind, "Listing started");
        }

        let jobs = jobs_for_event(event, &mut tracker, clock.now());
        if init_done {
            info!(
                kind = %kind,
                tracked = tracker.len(),
                retired = jobs.len(),
                "Listing complete"
            );
        }

        for job in jobs {
            match router.submit(job).await {
                Ok(()) => {}
                Err(TopologyError::ShuttingDown) => break 'events,
                Err(e) => warn!(kind = %kind, error = %e, "Failed to submit watch event"),
            }
        }
    }

    info!(kind = %kind, "Watcher stopped");
}

/// Watch every supported kind cluster-wide until `token` is cancelled.
pub async fn watch_cluster(
    client: Client,
    router: Arc<dyn JobRouter>,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
) {
    tokio::join!(
        watch_kind(
            Api::<Pod>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<Node>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<Service>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<ConfigMap>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<Namespace>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<PersistentVolume>::all(client.clone()),
            Arc::clone(&router),
            Arc::clone(&clock),
            token.clone(),
        ),
        watch_kind(
            Api::<PersistentVolumeClaim>::all(client),
            router,
            clock,
            token,
        ),
    );
}
