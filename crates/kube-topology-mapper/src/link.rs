//! Link mappers: one per relation kind.

use kube_topology_core::{GenericRecord, RelationKind};

use crate::envelope::MapContext;
use crate::object::JoinedPair;

/// Maps an already-joined pair into one link record.
pub trait LinkMapper: Send + Sync {
    /// Relation kind of the records this mapper builds.
    fn relation(&self) -> RelationKind;

    /// Map `pair` into a link record.
    ///
    /// Returns `None` if the pair is of another relation kind.
    fn map(&self, pair: &JoinedPair, ctx: &MapContext<'_>) -> Option<GenericRecord>;
}

/// Flattens a joined pair plus the configured relation tag into the link
/// envelope.
///
/// Source and target come from the pair's roles, so the record is the same
/// whichever member was observed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationMapper {
    relation: RelationKind,
}

impl RelationMapper {
    /// Create a mapper for `relation`.
    #[must_use]
    pub const fn new(relation: RelationKind) -> Self {
        Self { relation }
    }
}

impl LinkMapper for RelationMapper {
    fn relation(&self) -> RelationKind {
        self.relation
    }

    fn map(&self, pair: &JoinedPair, ctx: &MapContext<'_>) -> Option<GenericRecord> {
        if pair.relation() != self.relation {
            return None;
        }
        let tag = ctx.config.relation_tag(self.relation);
        Some(ctx.envelope().link(&pair.link_key(), tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RelationConfig, TopologyConfig};
    use crate::fields;
    use crate::object::fixtures::{namespace, node, pod, service};
    use kube_topology_core::{EntityId, Method, ObservedWindow};

    fn ctx(config: &TopologyConfig) -> MapContext<'_> {
        MapContext::new(config, Method::Upsert, ObservedWindow::new(10, 20), 30)
    }

    #[test]
    fn pod_node_points_from_node_to_pod() {
        let config = TopologyConfig::default();
        let web = pod("default", "web-0");
        let pair = JoinedPair::PodNode {
            pod: web.clone(),
            node: node("node-1"),
        };
        let record = RelationMapper::new(RelationKind::PodNode)
            .map(&pair, &ctx(&config))
            .unwrap();

        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            fields::LINK_ENVELOPE.to_vec()
        );
        assert_eq!(record.get(fields::SRC_ENTITY_TYPE), Some("k8s.node"));
        assert_eq!(record.get(fields::DEST_ENTITY_TYPE), Some("k8s.pod"));
        assert_eq!(
            record.get(fields::DEST_ENTITY_ID),
            Some(EntityId::derive(&config.cluster_id, &pair.target()).to_hex().as_str())
        );
        assert_eq!(record.get(fields::RELATION_TYPE), Some("related_to"));
        assert_eq!(record.get(fields::FIRST_OBSERVED_TIME), Some("10"));
        assert_eq!(record.timestamp(), 30);
    }

    #[test]
    fn service_pod_direction_is_fixed() {
        let config = TopologyConfig::default();
        let mapper = RelationMapper::new(RelationKind::ServicePod);
        let web = pod("default", "web-0");
        let svc = service("default", "web");

        // Same members, built in either order, give the same record.
        let a = JoinedPair::ServicePod {
            service: svc.clone(),
            pod: web.clone(),
        };
        let b = JoinedPair::ServicePod { pod: web, service: svc };
        let first = mapper.map(&a, &ctx(&config)).unwrap();
        let second = mapper.map(&b, &ctx(&config)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.get(fields::SRC_ENTITY_TYPE), Some("k8s.service"));
    }

    #[test]
    fn namespace_relations_use_contains() {
        let config = TopologyConfig::default();
        let pair = JoinedPair::PodNamespace {
            pod: pod("default", "web-0"),
            namespace: namespace("default"),
        };
        let record = RelationMapper::new(RelationKind::PodNamespace)
            .map(&pair, &ctx(&config))
            .unwrap();
        assert_eq!(record.get(fields::RELATION_TYPE), Some("contains"));
        assert_eq!(record.get(fields::SRC_ENTITY_TYPE), Some("k8s.namespace"));
    }

    #[test]
    fn configured_tag_is_used() {
        let mut config = TopologyConfig::default();
        config.relations.insert(
            RelationKind::PodContainer,
            RelationConfig {
                enabled: true,
                tag: "runs".to_string(),
            },
        );
        let pair = JoinedPair::PodContainer {
            pod: pod("default", "web-0"),
            container: "app".to_string(),
        };
        let record = RelationMapper::new(RelationKind::PodContainer)
            .map(&pair, &ctx(&config))
            .unwrap();
        assert_eq!(record.get(fields::RELATION_TYPE), Some("runs"));
        assert_eq!(record.get(fields::DEST_ENTITY_TYPE), Some("k8s.container"));
    }

    #[test]
    fn mismatched_relation_yields_nothing() {
        let config = TopologyConfig::default();
        let pair = JoinedPair::PodNode {
            pod: pod("default", "web-0"),
            node: node("node-1"),
        };
        assert!(RelationMapper::new(RelationKind::ServicePod)
            .map(&pair, &ctx(&config))
            .is_none());
    }
}
