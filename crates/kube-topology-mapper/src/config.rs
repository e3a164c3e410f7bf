//! Configuration for topology mapping and dispatch.

use std::collections::BTreeMap;
use std::time::Duration;

use kube_topology_core::{EntityKind, RelationKind};
use serde::{Deserialize, Serialize};

use crate::{Result, TopologyError};

/// What the sink does when its buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackpressurePolicy {
    /// Block the producing worker until space frees up.
    #[default]
    Block,
    /// Evict the oldest buffered record to make room.
    DropOldest,
    /// Fail the emission with `SinkUnavailable`.
    Reject,
}

impl BackpressurePolicy {
    /// Parse a policy name (`block`, `drop-oldest`, `reject`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "block" => Some(Self::Block),
            "drop-oldest" | "drop_oldest" => Some(Self::DropOldest),
            "reject" | "non-blocking" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Per-relation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Whether links of this relation are emitted at all.
    pub enabled: bool,
    /// Value of the relation type tag on emitted links.
    pub tag: String,
}

impl RelationConfig {
    fn default_for(relation: RelationKind) -> Self {
        Self {
            enabled: true,
            tag: relation.default_tag().to_string(),
        }
    }
}

/// Configuration for the topology pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Tenant/deployment scope label attached to every record.
    pub domain: String,
    /// Cluster identifier attached to every record and mixed into ids.
    pub cluster_id: String,
    /// Collection interval in seconds. Drives the keepalive period.
    pub interval_seconds: u64,
    /// Whether pods fan out into container sub-entities.
    pub emit_containers: bool,
    /// Per-relation enable flags and type tags.
    pub relations: BTreeMap<RelationKind, RelationConfig>,
    /// Number of dispatch workers.
    pub workers: usize,
    /// Queue depth per dispatch worker.
    pub queue_depth: usize,
    /// Number of records the sink buffers.
    pub sink_capacity: usize,
    /// Behaviour of the sink when its buffer is full.
    pub backpressure: BackpressurePolicy,
    /// Listen address for health endpoints.
    pub listen_addr: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            domain: "k8s".to_string(),
            cluster_id: "default".to_string(),
            interval_seconds: 60,
            emit_containers: true,
            relations: RelationKind::ALL
                .into_iter()
                .map(|relation| (relation, RelationConfig::default_for(relation)))
                .collect(),
            workers: 4,
            queue_depth: 1024,
            sink_capacity: 4096,
            backpressure: BackpressurePolicy::Block,
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl TopologyConfig {
    /// Create a config for the given domain and cluster.
    #[must_use]
    pub fn with_cluster(domain: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            cluster_id: cluster_id.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `TOPOLOGY_DOMAIN`: Domain label for every record
    /// - `TOPOLOGY_CLUSTER_ID`: Cluster identifier
    /// - `TOPOLOGY_INTERVAL_SECONDS`: Collection interval
    /// - `TOPOLOGY_EMIT_CONTAINERS`: Emit container sub-entities (`true`/`false`)
    /// - `TOPOLOGY_WORKERS`: Number of dispatch workers
    /// - `TOPOLOGY_QUEUE_DEPTH`: Queue depth per worker
    /// - `TOPOLOGY_SINK_CAPACITY`: Sink buffer capacity
    /// - `TOPOLOGY_BACKPRESSURE`: `block`, `drop-oldest` or `reject`
    /// - `TOPOLOGY_RELATION_<NAME>_ENABLED`: Per-relation enable flag, e.g.
    ///   `TOPOLOGY_RELATION_SERVICE_POD_ENABLED`
    /// - `TOPOLOGY_RELATION_<NAME>_TAG`: Per-relation type tag
    /// - `LISTEN_ADDR`: Health endpoint listen address
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TOPOLOGY_DOMAIN") {
            config.domain = val;
        }
        if let Ok(val) = std::env::var("TOPOLOGY_CLUSTER_ID") {
            config.cluster_id = val;
        }
        if let Some(n) = env_parse("TOPOLOGY_INTERVAL_SECONDS") {
            config.interval_seconds = n;
        }
        if let Some(flag) = env_flag("TOPOLOGY_EMIT_CONTAINERS") {
            config.emit_containers = flag;
        }
        if let Some(n) = env_parse("TOPOLOGY_WORKERS") {
            config.workers = n;
        }
        if let Some(n) = env_parse("TOPOLOGY_QUEUE_DEPTH") {
            config.queue_depth = n;
        }
        if let Some(n) = env_parse("TOPOLOGY_SINK_CAPACITY") {
            config.sink_capacity = n;
        }
        if let Ok(val) = std::env::var("TOPOLOGY_BACKPRESSURE") {
            if let Some(policy) = BackpressurePolicy::parse(&val) {
                config.backpressure = policy;
            }
        }
        if let Ok(val) = std::env::var("LISTEN_ADDR") {
            config.listen_addr = val;
        }

        for relation in RelationKind::ALL {
            let prefix = relation_env_prefix(relation);
            let entry = config
                .relations
                .entry(relation)
                .or_insert_with(|| RelationConfig::default_for(relation));
            if let Some(flag) = env_flag(&format!("{prefix}_ENABLED")) {
                entry.enabled = flag;
            }
            if let Ok(val) = std::env::var(format!("{prefix}_TAG")) {
                entry.tag = val;
            }
        }

        config
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain is empty, the interval is zero, or a
    /// pool/buffer size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(TopologyError::Config("domain must not be empty".to_string()));
        }
        if self.interval_seconds == 0 {
            return Err(TopologyError::Config(
                "collection interval must be at least one second".to_string(),
            ));
        }
        if self.workers == 0 || self.queue_depth == 0 || self.sink_capacity == 0 {
            return Err(TopologyError::Config(format!(
                "workers ({}), queue depth ({}) and sink capacity ({}) must be non-zero",
                self.workers, self.queue_depth, self.sink_capacity
            )));
        }
        Ok(())
    }

    /// The collection interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Seconds a record stays alive downstream without a refresh.
    ///
    /// Twice the interval, so a record survives one missed refresh.
    #[must_use]
    pub fn keepalive_seconds(&self) -> u64 {
        self.interval_seconds.saturating_mul(2)
    }

    /// Whether links of `relation` are emitted.
    #[must_use]
    pub fn relation_enabled(&self, relation: RelationKind) -> bool {
        self.relations.get(&relation).map_or(true, |r| r.enabled)
    }

    /// Relation type tag for `relation`.
    #[must_use]
    pub fn relation_tag(&self, relation: RelationKind) -> &str {
        self.relations
            .get(&relation)
            .map_or(relation.default_tag(), |r| r.tag.as_str())
    }

    /// Prefix of entity type keys for the configured domain.
    #[must_use]
    pub fn entity_type_prefix(&self) -> String {
        match self.domain.as_str() {
            "acs" | "infra" => format!("{}.k8s.", self.domain),
            domain => format!("{domain}."),
        }
    }

    /// Entity type key for `kind` (e.g. `infra.k8s.pod`).
    #[must_use]
    pub fn type_key(&self, kind: EntityKind) -> String {
        format!("{}{}", self.entity_type_prefix(), kind.type_name())
    }
}

fn relation_env_prefix(relation: RelationKind) -> String {
    format!(
        "TOPOLOGY_RELATION_{}",
        relation.as_str().replace('-', "_").to_uppercase()
    )
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_config_defaults() {
        let config = TopologyConfig::default();
        assert_eq!(config.domain, "k8s");
        assert_eq!(config.interval_seconds, 60);
        assert_eq!(config.keepalive_seconds(), 120);
        assert!(config.emit_containers);
        assert_eq!(config.relations.len(), RelationKind::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn keepalive_is_twice_interval() {
        let config = TopologyConfig {
            interval_seconds: 15,
            ..Default::default()
        };
        assert_eq!(config.keepalive_seconds(), 30);
        assert_eq!(config.interval(), Duration::from_secs(15));
    }

    #[test]
    fn type_key_prefixes() {
        assert_eq!(
            TopologyConfig::with_cluster("infra", "c1").type_key(EntityKind::Pod),
            "infra.k8s.pod"
        );
        assert_eq!(
            TopologyConfig::with_cluster("acs", "c1").type_key(EntityKind::PersistentVolumeClaim),
            "acs.k8s.persistentvolumeclaim"
        );
        assert_eq!(
            TopologyConfig::with_cluster("custom", "c1").type_key(EntityKind::Container),
            "custom.container"
        );
    }

    #[test]
    fn relation_settings() {
        let mut config = TopologyConfig::default();
        assert!(config.relation_enabled(RelationKind::ServicePod));
        assert_eq!(config.relation_tag(RelationKind::ServicePod), "related_to");
        assert_eq!(config.relation_tag(RelationKind::PodNamespace), "contains");

        config.relations.insert(
            RelationKind::ServicePod,
            RelationConfig {
                enabled: false,
                tag: "selects".to_string(),
            },
        );
        assert!(!config.relation_enabled(RelationKind::ServicePod));
        assert_eq!(config.relation_tag(RelationKind::ServicePod), "selects");

        config.relations.clear();
        assert!(config.relation_enabled(RelationKind::PodNode));
        assert_eq!(config.relation_tag(RelationKind::PodNode), "related_to");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = TopologyConfig {
            interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TopologyConfig {
            domain: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TopologyConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn relation_env_names() {
        assert_eq!(
            relation_env_prefix(RelationKind::PersistentVolumeClaimNamespace),
            "TOPOLOGY_RELATION_PERSISTENTVOLUMECLAIM_NAMESPACE"
        );
        assert_eq!(
            relation_env_prefix(RelationKind::ServicePod),
            "TOPOLOGY_RELATION_SERVICE_POD"
        );
    }

    #[test]
    fn backpressure_parse() {
        assert_eq!(BackpressurePolicy::parse("Block"), Some(BackpressurePolicy::Block));
        assert_eq!(
            BackpressurePolicy::parse("drop-oldest"),
            Some(BackpressurePolicy::DropOldest)
        );
        assert_eq!(BackpressurePolicy::parse("reject"), Some(BackpressurePolicy::Reject));
        assert_eq!(BackpressurePolicy::parse("spill"), None);
    }
}
