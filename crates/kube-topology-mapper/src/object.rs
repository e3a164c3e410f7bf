//! Typed resources and joined pairs at the ingestion boundary.
//!
//! Raw resources are narrowed into [`TopologyObject`] once, when they enter
//! the pipeline. Mappers only ever see already-typed values.

use std::str::FromStr;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_topology_core::{EntityKey, EntityKind, LinkKey, ObservedWindow, RelationKind};
use serde::de::DeserializeOwned;

use crate::{Result, TopologyError};

/// A resource of one of the supported kinds.
#[derive(Debug, Clone)]
pub enum TopologyObject {
    /// A pod.
    Pod(Arc<Pod>),
    /// A node.
    Node(Arc<Node>),
    /// A service.
    Service(Arc<Service>),
    /// A config map.
    ConfigMap(Arc<ConfigMap>),
    /// A namespace.
    Namespace(Arc<Namespace>),
    /// A persistent volume.
    PersistentVolume(Arc<PersistentVolume>),
    /// A persistent volume claim.
    PersistentVolumeClaim(Arc<PersistentVolumeClaim>),
}

impl TopologyObject {
    /// Kind of the wrapped resource.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Pod(_) => EntityKind::Pod,
            Self::Node(_) => EntityKind::Node,
            Self::Service(_) => EntityKind::Service,
            Self::ConfigMap(_) => EntityKind::ConfigMap,
            Self::Namespace(_) => EntityKind::Namespace,
            Self::PersistentVolume(_) => EntityKind::PersistentVolume,
            Self::PersistentVolumeClaim(_) => EntityKind::PersistentVolumeClaim,
        }
    }

    /// Object metadata of the wrapped resource.
    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Pod(o) => &o.metadata,
            Self::Node(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::ConfigMap(o) => &o.metadata,
            Self::Namespace(o) => &o.metadata,
            Self::PersistentVolume(o) => &o.metadata,
            Self::PersistentVolumeClaim(o) => &o.metadata,
        }
    }

    /// Entity key of the wrapped resource.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        entity_key(self.kind(), self.meta())
    }

    /// Narrow an untyped JSON object into a typed resource.
    ///
    /// `kind` accepts either the resource kind (`PersistentVolumeClaim`) or
    /// its lowercase type name (`persistentvolumeclaim`).
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::UnsupportedKind` for kinds the topology does not
    /// track (the synthetic `Container` included), and `TopologyError::Decode`
    /// when the JSON does not deserialize as that kind.
    pub fn from_dynamic(kind: &str, raw: serde_json::Value) -> Result<Self> {
        let parsed = EntityKind::from_str(kind)
            .map_err(|_| TopologyError::UnsupportedKind(kind.to_string()))?;
        Ok(match parsed {
            EntityKind::Pod => Self::Pod(decode(parsed, raw)?),
            EntityKind::Node => Self::Node(decode(parsed, raw)?),
            EntityKind::Service => Self::Service(decode(parsed, raw)?),
            EntityKind::ConfigMap => Self::ConfigMap(decode(parsed, raw)?),
            EntityKind::Namespace => Self::Namespace(decode(parsed, raw)?),
            EntityKind::PersistentVolume => Self::PersistentVolume(decode(parsed, raw)?),
            EntityKind::PersistentVolumeClaim => {
                Self::PersistentVolumeClaim(decode(parsed, raw)?)
            }
            EntityKind::Container => {
                return Err(TopologyError::UnsupportedKind(kind.to_string()));
            }
        })
    }
}

fn decode<K: DeserializeOwned>(kind: EntityKind, raw: serde_json::Value) -> Result<Arc<K>> {
    serde_json::from_value(raw)
        .map(Arc::new)
        .map_err(|e| TopologyError::Decode {
            kind: kind.kind_name().to_string(),
            reason: e.to_string(),
        })
}

macro_rules! impl_from_resource {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for TopologyObject {
                fn from(object: $variant) -> Self {
                    Self::$variant(Arc::new(object))
                }
            }

            impl From<Arc<$variant>> for TopologyObject {
                fn from(object: Arc<$variant>) -> Self {
                    Self::$variant(object)
                }
            }
        )*
    };
}

impl_from_resource!(
    Pod,
    Node,
    Service,
    ConfigMap,
    Namespace,
    PersistentVolume,
    PersistentVolumeClaim,
);

/// Entity key for a resource of `kind` with the given metadata.
///
/// Cluster-scoped kinds never carry a namespace, even if the metadata does.
#[must_use]
pub fn entity_key(kind: EntityKind, meta: &ObjectMeta) -> EntityKey {
    let namespace = if kind.is_namespaced() {
        meta.namespace.clone()
    } else {
        None
    };
    EntityKey::new(kind, namespace, meta.name.clone().unwrap_or_default())
}

/// A resource plus its observed-time window.
#[derive(Debug, Clone)]
pub struct ObjectWrapper {
    /// The typed resource.
    pub object: TopologyObject,
    /// First and last observed instants.
    pub window: ObservedWindow,
}

impl ObjectWrapper {
    /// Wrap a resource.
    pub fn new(object: impl Into<TopologyObject>, window: ObservedWindow) -> Self {
        Self {
            object: object.into(),
            window,
        }
    }

    /// Entity key of the wrapped resource.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        self.object.key()
    }

    /// The same resource with its window extended to `now`.
    #[must_use]
    pub fn refreshed(&self, now: i64) -> Self {
        Self {
            object: self.object.clone(),
            window: self.window.refreshed(now),
        }
    }
}

/// A pre-matched pair of resources, with roles fixed by the relation.
///
/// Each variant names its members by role, so which side is the source and
/// which is the target is decided by the variant alone and never by the order
/// in which the members were observed.
#[derive(Debug, Clone)]
pub enum JoinedPair {
    /// A pod scheduled on a node. Source: node.
    PodNode {
        /// The scheduled pod.
        pod: Arc<Pod>,
        /// The node it runs on.
        node: Arc<Node>,
    },
    /// A pod mounting a claim. Source: pod.
    PodPersistentVolumeClaim {
        /// The mounting pod.
        pod: Arc<Pod>,
        /// The mounted claim.
        claim: Arc<PersistentVolumeClaim>,
    },
    /// A pod referencing a config map. Source: pod.
    PodConfigMap {
        /// The referencing pod.
        pod: Arc<Pod>,
        /// The referenced config map.
        config_map: Arc<ConfigMap>,
    },
    /// A service selecting a pod. Source: service.
    ServicePod {
        /// The selecting service.
        service: Arc<Service>,
        /// The selected pod.
        pod: Arc<Pod>,
    },
    /// A container of a pod. Source: pod.
    PodContainer {
        /// The owning pod.
        pod: Arc<Pod>,
        /// Container name within the pod.
        container: String,
    },
    /// A pod in a namespace. Source: namespace.
    PodNamespace {
        /// The namespaced pod.
        pod: Arc<Pod>,
        /// Its namespace.
        namespace: Arc<Namespace>,
    },
    /// A service in a namespace. Source: namespace.
    ServiceNamespace {
        /// The namespaced service.
        service: Arc<Service>,
        /// Its namespace.
        namespace: Arc<Namespace>,
    },
    /// A config map in a namespace. Source: namespace.
    ConfigMapNamespace {
        /// The namespaced config map.
        config_map: Arc<ConfigMap>,
        /// Its namespace.
        namespace: Arc<Namespace>,
    },
    /// A claim in a namespace. Source: namespace.
    PersistentVolumeClaimNamespace {
        /// The namespaced claim.
        claim: Arc<PersistentVolumeClaim>,
        /// Its namespace.
        namespace: Arc<Namespace>,
    },
}

impl JoinedPair {
    /// Relation kind of this pair.
    #[must_use]
    pub const fn relation(&self) -> RelationKind {
        match self {
            Self::PodNode { .. } => RelationKind::PodNode,
            Self::PodPersistentVolumeClaim { .. } => RelationKind::PodPersistentVolumeClaim,
            Self::PodConfigMap { .. } => RelationKind::PodConfigMap,
            Self::ServicePod { .. } => RelationKind::ServicePod,
            Self::PodContainer { .. } => RelationKind::PodContainer,
            Self::PodNamespace { .. } => RelationKind::PodNamespace,
            Self::ServiceNamespace { .. } => RelationKind::ServiceNamespace,
            Self::ConfigMapNamespace { .. } => RelationKind::ConfigMapNamespace,
            Self::PersistentVolumeClaimNamespace { .. } => {
                RelationKind::PersistentVolumeClaimNamespace
            }
        }
    }

    /// Key of the source entity.
    #[must_use]
    pub fn source(&self) -> EntityKey {
        match self {
            Self::PodNode { node, .. } => entity_key(EntityKind::Node, &node.metadata),
            Self::PodPersistentVolumeClaim { pod, .. }
            | Self::PodConfigMap { pod, .. }
            | Self::PodContainer { pod, .. } => entity_key(EntityKind::Pod, &pod.metadata),
            Self::ServicePod { service, .. } => {
                entity_key(EntityKind::Service, &service.metadata)
            }
            Self::PodNamespace { namespace, .. }
            | Self::ServiceNamespace { namespace, .. }
            | Self::ConfigMapNamespace { namespace, .. }
            | Self::PersistentVolumeClaimNamespace { namespace, .. } => {
                entity_key(EntityKind::Namespace, &namespace.metadata)
            }
        }
    }

    /// Key of the target entity.
    #[must_use]
    pub fn target(&self) -> EntityKey {
        match self {
            Self::PodNode { pod, .. }
            | Self::ServicePod { pod, .. }
            | Self::PodNamespace { pod, .. } => entity_key(EntityKind::Pod, &pod.metadata),
            Self::PodPersistentVolumeClaim { claim, .. }
            | Self::PersistentVolumeClaimNamespace { claim, .. } => {
                entity_key(EntityKind::PersistentVolumeClaim, &claim.metadata)
            }
            Self::PodConfigMap { config_map, .. } | Self::ConfigMapNamespace { config_map, .. } => {
                entity_key(EntityKind::ConfigMap, &config_map.metadata)
            }
            Self::PodContainer { pod, container } => EntityKey::container(
                pod.metadata.namespace.as_deref(),
                pod.metadata.name.as_deref().unwrap_or_default(),
                container,
            ),
            Self::ServiceNamespace { service, .. } => {
                entity_key(EntityKind::Service, &service.metadata)
            }
        }
    }

    /// Link key of this pair.
    #[must_use]
    pub fn link_key(&self) -> LinkKey {
        LinkKey::new(self.relation(), self.source(), self.target())
    }
}

/// A joined pair plus its observed-time window.
#[derive(Debug, Clone)]
pub struct LinkWrapper {
    /// The joined pair.
    pub pair: JoinedPair,
    /// First and last observed instants of the link.
    pub window: ObservedWindow,
}

impl LinkWrapper {
    /// Wrap a joined pair.
    #[must_use]
    pub const fn new(pair: JoinedPair, window: ObservedWindow) -> Self {
        Self { pair, window }
    }

    /// Link key of the wrapped pair.
    #[must_use]
    pub fn key(&self) -> LinkKey {
        self.pair.link_key()
    }

    /// The same pair with its window extended to `now`.
    #[must_use]
    pub fn refreshed(&self, now: i64) -> Self {
        Self {
            pair: self.pair.clone(),
            window: self.window.refreshed(now),
        }
    }
}
