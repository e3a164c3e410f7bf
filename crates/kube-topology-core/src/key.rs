//! Identity keys for entities and links.
//!
//! Keys name a logical topology member independent of its current state. The
//! record for a key is replaced on every event; the key itself never changes.

use std::fmt;

use crate::kind::{EntityKind, RelationKind};

/// Identity of one entity within a cluster scope.
///
/// The domain component of the key is fixed by the dispatcher that owns it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    kind: EntityKind,
    namespace: Option<String>,
    name: String,
}

impl EntityKey {
    /// Create a key. An empty namespace is treated as no namespace.
    #[must_use]
    pub fn new(kind: EntityKind, namespace: Option<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.filter(|ns| !ns.is_empty()),
            name: name.into(),
        }
    }

    /// Key of the synthetic container entity for `container` inside a pod.
    ///
    /// The entity name is the pod name concatenated with the container name.
    #[must_use]
    pub fn container(pod_namespace: Option<&str>, pod_name: &str, container: &str) -> Self {
        Self::new(
            EntityKind::Container,
            pod_namespace.map(str::to_string),
            format!("{pod_name}{container}"),
        )
    }

    /// Entity kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Namespace, if the entity is namespaced.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// Identity of one directed relationship.
///
/// Source and target are ordered by the relation's declared direction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkKey {
    relation: RelationKind,
    source: EntityKey,
    target: EntityKey,
}

impl LinkKey {
    /// Create a link key.
    ///
    /// Callers pass the endpoints in the relation's declared order; the
    /// entity kinds must match [`RelationKind::source_kind`] and
    /// [`RelationKind::target_kind`].
    #[must_use]
    pub fn new(relation: RelationKind, source: EntityKey, target: EntityKey) -> Self {
        debug_assert_eq!(source.kind(), relation.source_kind());
        debug_assert_eq!(target.kind(), relation.target_kind());
        Self {
            relation,
            source,
            target,
        }
    }

    /// Relation kind.
    #[must_use]
    pub const fn relation(&self) -> RelationKind {
        self.relation
    }

    /// Source entity.
    #[must_use]
    pub const fn source(&self) -> &EntityKey {
        &self.source
    }

    /// Target entity.
    #[must_use]
    pub const fn target(&self) -> &EntityKey {
        &self.target
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({} -> {})", self.relation, self.source, self.target)
    }
}

/// Any key tracked in the live key set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopologyKey {
    /// An entity key.
    Entity(EntityKey),
    /// A link key.
    Link(LinkKey),
}

impl From<EntityKey> for TopologyKey {
    fn from(key: EntityKey) -> Self {
        Self::Entity(key)
    }
}

impl From<LinkKey> for TopologyKey {
    fn from(key: LinkKey) -> Self {
        Self::Link(key)
    }
}

impl fmt::Display for TopologyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(key) => key.fmt(f),
            Self::Link(key) => key.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_namespace_is_none() {
        let key = EntityKey::new(EntityKind::Node, Some(String::new()), "node-1");
        assert_eq!(key.namespace(), None);
        assert_eq!(key.to_string(), "Node/node-1");
    }

    #[test]
    fn container_key_concatenates_names() {
        let key = EntityKey::container(Some("default"), "web-0", "nginx");
        assert_eq!(key.kind(), EntityKind::Container);
        assert_eq!(key.name(), "web-0nginx");
        assert_eq!(key.namespace(), Some("default"));
    }

    #[test]
    fn link_key_display() {
        let node = EntityKey::new(EntityKind::Node, None, "node-1");
        let pod = EntityKey::new(EntityKind::Pod, Some("default".into()), "web-0");
        let link = LinkKey::new(RelationKind::PodNode, node, pod);
        assert_eq!(link.to_string(), "pod-node(Node/node-1 -> Pod/default/web-0)");
    }
}
