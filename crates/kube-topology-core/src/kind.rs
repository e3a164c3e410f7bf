//! Entity and relation kinds tracked by the topology.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Kind of a topology entity.
///
/// Every variant except [`EntityKind::Container`] corresponds to a core/v1
/// Kubernetes resource. Containers are synthetic sub-entities derived from
/// the container specs of a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A pod.
    Pod,
    /// A cluster node.
    Node,
    /// A service.
    Service,
    /// A config map.
    ConfigMap,
    /// A namespace.
    Namespace,
    /// A persistent volume.
    PersistentVolume,
    /// A persistent volume claim.
    PersistentVolumeClaim,
    /// A container inside a pod.
    Container,
}

impl EntityKind {
    /// All entity kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Pod,
        Self::Node,
        Self::Service,
        Self::ConfigMap,
        Self::Namespace,
        Self::PersistentVolume,
        Self::PersistentVolumeClaim,
        Self::Container,
    ];

    /// The Kubernetes `kind` name (e.g. `PersistentVolumeClaim`).
    #[must_use]
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::Pod => "Pod",
            Self::Node => "Node",
            Self::Service => "Service",
            Self::ConfigMap => "ConfigMap",
            Self::Namespace => "Namespace",
            Self::PersistentVolume => "PersistentVolume",
            Self::PersistentVolumeClaim => "PersistentVolumeClaim",
            Self::Container => "Container",
        }
    }

    /// The lowercase type name used in entity type keys and ids.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Node => "node",
            Self::Service => "service",
            Self::ConfigMap => "configmap",
            Self::Namespace => "namespace",
            Self::PersistentVolume => "persistentvolume",
            Self::PersistentVolumeClaim => "persistentvolumeclaim",
            Self::Container => "container",
        }
    }

    /// Whether entities of this kind live inside a namespace.
    #[must_use]
    pub const fn is_namespaced(self) -> bool {
        !matches!(self, Self::Node | Self::Namespace | Self::PersistentVolume)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    /// Parse a kind from either its `kind` name or its lowercase type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.kind_name() == s || kind.type_name() == s)
            .ok_or_else(|| CoreError::UnsupportedKind(s.to_string()))
    }
}

/// Kind of a directed relationship between two entities.
///
/// The source and target roles are fixed per relation. They never depend on
/// which member of the pair was observed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Node → Pod.
    #[serde(rename = "pod-node")]
    PodNode,
    /// Pod → `PersistentVolumeClaim`.
    #[serde(rename = "pod-persistentvolumeclaim")]
    PodPersistentVolumeClaim,
    /// Pod → `ConfigMap`.
    #[serde(rename = "pod-configmap")]
    PodConfigMap,
    /// Service → Pod.
    #[serde(rename = "service-pod")]
    ServicePod,
    /// Pod → Container.
    #[serde(rename = "pod-container")]
    PodContainer,
    /// Namespace → Pod.
    #[serde(rename = "pod-namespace")]
    PodNamespace,
    /// Namespace → Service.
    #[serde(rename = "service-namespace")]
    ServiceNamespace,
    /// Namespace → `ConfigMap`.
    #[serde(rename = "configmap-namespace")]
    ConfigMapNamespace,
    /// Namespace → `PersistentVolumeClaim`.
    #[serde(rename = "persistentvolumeclaim-namespace")]
    PersistentVolumeClaimNamespace,
}

impl RelationKind {
    /// All relation kinds, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::PodNode,
        Self::PodPersistentVolumeClaim,
        Self::PodConfigMap,
        Self::ServicePod,
        Self::PodContainer,
        Self::PodNamespace,
        Self::ServiceNamespace,
        Self::ConfigMapNamespace,
        Self::PersistentVolumeClaimNamespace,
    ];

    /// The relation name (e.g. `service-pod`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PodNode => "pod-node",
            Self::PodPersistentVolumeClaim => "pod-persistentvolumeclaim",
            Self::PodConfigMap => "pod-configmap",
            Self::ServicePod => "service-pod",
            Self::PodContainer => "pod-container",
            Self::PodNamespace => "pod-namespace",
            Self::ServiceNamespace => "service-namespace",
            Self::ConfigMapNamespace => "configmap-namespace",
            Self::PersistentVolumeClaimNamespace => "persistentvolumeclaim-namespace",
        }
    }

    /// Kind of the source entity.
    #[must_use]
    pub const fn source_kind(self) -> EntityKind {
        match self {
            Self::PodNode => EntityKind::Node,
            Self::PodPersistentVolumeClaim | Self::PodConfigMap | Self::PodContainer => {
                EntityKind::Pod
            }
            Self::ServicePod => EntityKind::Service,
            Self::PodNamespace
            | Self::ServiceNamespace
            | Self::ConfigMapNamespace
            | Self::PersistentVolumeClaimNamespace => EntityKind::Namespace,
        }
    }

    /// Kind of the target entity.
    #[must_use]
    pub const fn target_kind(self) -> EntityKind {
        match self {
            Self::PodNode | Self::ServicePod | Self::PodNamespace => EntityKind::Pod,
            Self::PodPersistentVolumeClaim | Self::PersistentVolumeClaimNamespace => {
                EntityKind::PersistentVolumeClaim
            }
            Self::PodConfigMap | Self::ConfigMapNamespace => EntityKind::ConfigMap,
            Self::PodContainer => EntityKind::Container,
            Self::ServiceNamespace => EntityKind::Service,
        }
    }

    /// The relation type tag used when no tag is configured.
    #[must_use]
    pub const fn default_tag(self) -> &'static str {
        match self {
            Self::PodNode | Self::PodPersistentVolumeClaim | Self::PodConfigMap | Self::ServicePod => {
                "related_to"
            }
            Self::PodContainer
            | Self::PodNamespace
            | Self::ServiceNamespace
            | Self::ConfigMapNamespace
            | Self::PersistentVolumeClaimNamespace => "contains",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|relation| relation.as_str() == s)
            .ok_or_else(|| CoreError::UnknownRelation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_both_spellings() {
        assert_eq!("Pod".parse::<EntityKind>().unwrap(), EntityKind::Pod);
        assert_eq!(
            "persistentvolumeclaim".parse::<EntityKind>().unwrap(),
            EntityKind::PersistentVolumeClaim
        );
        assert!(matches!(
            "Deployment".parse::<EntityKind>(),
            Err(CoreError::UnsupportedKind(kind)) if kind == "Deployment"
        ));
    }

    #[test]
    fn cluster_scoped_kinds() {
        assert!(!EntityKind::Node.is_namespaced());
        assert!(!EntityKind::Namespace.is_namespaced());
        assert!(!EntityKind::PersistentVolume.is_namespaced());
        assert!(EntityKind::Pod.is_namespaced());
        assert!(EntityKind::Container.is_namespaced());
    }

    #[test]
    fn relation_directions() {
        assert_eq!(RelationKind::PodNode.source_kind(), EntityKind::Node);
        assert_eq!(RelationKind::PodNode.target_kind(), EntityKind::Pod);
        assert_eq!(RelationKind::ServicePod.source_kind(), EntityKind::Service);
        assert_eq!(RelationKind::PodContainer.target_kind(), EntityKind::Container);
        assert_eq!(
            RelationKind::PersistentVolumeClaimNamespace.source_kind(),
            EntityKind::Namespace
        );
    }

    #[test]
    fn relation_name_roundtrip() {
        for relation in RelationKind::ALL {
            assert_eq!(relation.as_str().parse::<RelationKind>().unwrap(), relation);
        }
        assert!("node-pod".parse::<RelationKind>().is_err());
    }

    #[test]
    fn relation_serde_uses_names() {
        let json = serde_json::to_string(&RelationKind::ConfigMapNamespace).unwrap();
        assert_eq!(json, "\"configmap-namespace\"");
    }
}
