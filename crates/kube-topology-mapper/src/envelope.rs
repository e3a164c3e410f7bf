//! The envelope shared by every entity and link record.

use kube_topology_core::{
    EntityId, EntityKey, EntityKind, GenericRecord, LinkId, LinkKey, Method, ObservedWindow,
};

use crate::config::TopologyConfig;
use crate::fields;

/// Everything a mapper needs besides the resource itself.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    /// Injected configuration.
    pub config: &'a TopologyConfig,
    /// Method of the records being built.
    pub method: Method,
    /// Observed-time window of the mapped object.
    pub window: ObservedWindow,
    /// Current Unix time in seconds.
    pub now: i64,
}

impl<'a> MapContext<'a> {
    /// Create a mapping context.
    #[must_use]
    pub const fn new(
        config: &'a TopologyConfig,
        method: Method,
        window: ObservedWindow,
        now: i64,
    ) -> Self {
        Self {
            config,
            method,
            window,
            now,
        }
    }

    /// Timestamp of records built in this context.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.window.record_timestamp(self.now)
    }

    /// Envelope builder bound to this context.
    #[must_use]
    pub const fn envelope(&self) -> CommonFieldBuilder<'_> {
        CommonFieldBuilder { ctx: self }
    }
}

/// Builds the fixed envelope fields of entity and link records.
#[derive(Debug, Clone, Copy)]
pub struct CommonFieldBuilder<'a> {
    ctx: &'a MapContext<'a>,
}

impl CommonFieldBuilder<'_> {
    /// Entity type key for `kind` in the configured domain.
    #[must_use]
    pub fn type_key(&self, kind: EntityKind) -> String {
        self.ctx.config.type_key(kind)
    }

    /// Deterministic id of `key` within the configured cluster.
    #[must_use]
    pub fn entity_id(&self, key: &EntityKey) -> EntityId {
        EntityId::derive(&self.ctx.config.cluster_id, key)
    }

    /// Start an entity record with its envelope filled in.
    ///
    /// `name` is the display name, which differs from the key name only for
    /// containers. `created` is the creation instant in Unix seconds.
    /// `extra` is the number of kind-specific fields that will follow.
    #[must_use]
    pub fn entity(
        &self,
        key: &EntityKey,
        name: &str,
        created: Option<i64>,
        extra: usize,
    ) -> GenericRecord {
        let ctx = self.ctx;
        let mut record =
            GenericRecord::with_capacity(ctx.timestamp(), fields::ENTITY_ENVELOPE.len() + extra);
        record.set(fields::DOMAIN, ctx.config.domain.as_str());
        record.set(fields::ENTITY_TYPE, self.type_key(key.kind()));
        record.set(fields::ENTITY_ID, self.entity_id(key).to_hex());
        self.set_lifecycle(&mut record);
        record.set(fields::CATEGORY, fields::CATEGORY_ENTITY);
        record.set(fields::CLUSTER_ID, ctx.config.cluster_id.as_str());
        record.set(fields::KIND, key.kind().kind_name());
        record.set(fields::NAME, name);
        record.set(
            fields::CREATE_TIME,
            created.map(|t| t.to_string()).unwrap_or_default(),
        );
        record
    }

    /// Build a complete link record.
    #[must_use]
    pub fn link(&self, key: &LinkKey, tag: &str) -> GenericRecord {
        let ctx = self.ctx;
        let domain = ctx.config.domain.as_str();
        let mut record =
            GenericRecord::with_capacity(ctx.timestamp(), fields::LINK_ENVELOPE.len());
        record.set(fields::SRC_DOMAIN, domain);
        record.set(fields::SRC_ENTITY_TYPE, self.type_key(key.source().kind()));
        record.set(fields::SRC_ENTITY_ID, self.entity_id(key.source()).to_hex());
        record.set(fields::DEST_DOMAIN, domain);
        record.set(fields::DEST_ENTITY_TYPE, self.type_key(key.target().kind()));
        record.set(fields::DEST_ENTITY_ID, self.entity_id(key.target()).to_hex());
        record.set(
            fields::LINK_ID,
            LinkId::derive(&ctx.config.cluster_id, key).to_hex(),
        );
        self.set_lifecycle(&mut record);
        record.set(fields::CATEGORY, fields::CATEGORY_LINK);
        record.set(fields::CLUSTER_ID, ctx.config.cluster_id.as_str());
        record.set(fields::RELATION_TYPE, tag);
        record
    }

    fn set_lifecycle(&self, record: &mut GenericRecord) {
        let ctx = self.ctx;
        record.set(fields::METHOD, ctx.method.as_str());
        record.set(fields::FIRST_OBSERVED_TIME, ctx.window.first().to_string());
        record.set(fields::LAST_OBSERVED_TIME, ctx.window.last().to_string());
        record.set(
            fields::KEEP_ALIVE_SECONDS,
            ctx.config.keepalive_seconds().to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube_topology_core::RelationKind;

    fn config() -> TopologyConfig {
        TopologyConfig {
            interval_seconds: 30,
            ..TopologyConfig::with_cluster("infra", "c-1")
        }
    }

    #[test]
    fn entity_envelope_fields_in_order() {
        let config = config();
        let ctx = MapContext::new(&config, Method::Upsert, ObservedWindow::new(100, 200), 250);
        let key = EntityKey::new(EntityKind::Pod, Some("default".into()), "web-0");
        let record = ctx.envelope().entity(&key, "web-0", Some(50), 0);

        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            fields::ENTITY_ENVELOPE.to_vec()
        );
        assert_eq!(record.timestamp(), 250);
        assert_eq!(record.get(fields::DOMAIN), Some("infra"));
        assert_eq!(record.get(fields::ENTITY_TYPE), Some("infra.k8s.pod"));
        assert_eq!(
            record.get(fields::ENTITY_ID),
            Some(EntityId::derive("c-1", &key).to_hex().as_str())
        );
        assert_eq!(record.get(fields::METHOD), Some("upsert"));
        assert_eq!(record.get(fields::FIRST_OBSERVED_TIME), Some("100"));
        assert_eq!(record.get(fields::LAST_OBSERVED_TIME), Some("200"));
        assert_eq!(record.get(fields::KEEP_ALIVE_SECONDS), Some("60"));
        assert_eq!(record.get(fields::CATEGORY), Some("entity"));
        assert_eq!(record.get(fields::KIND), Some("Pod"));
        assert_eq!(record.get(fields::CREATE_TIME), Some("50"));
    }

    #[test]
    fn missing_create_time_is_empty() {
        let config = config();
        let ctx = MapContext::new(&config, Method::Delete, ObservedWindow::at(10), 10);
        let key = EntityKey::new(EntityKind::Node, None, "node-1");
        let record = ctx.envelope().entity(&key, "node-1", None, 0);
        assert_eq!(record.get(fields::CREATE_TIME), Some(""));
        assert_eq!(record.get(fields::METHOD), Some("delete"));
    }

    #[test]
    fn record_timestamp_never_precedes_last_observed() {
        let config = config();
        let ctx = MapContext::new(&config, Method::Upsert, ObservedWindow::new(100, 300), 200);
        assert_eq!(ctx.timestamp(), 300);
    }

    #[test]
    fn link_envelope_fields_in_order() {
        let config = config();
        let ctx = MapContext::new(&config, Method::Upsert, ObservedWindow::new(1, 2), 3);
        let node = EntityKey::new(EntityKind::Node, None, "node-1");
        let pod = EntityKey::new(EntityKind::Pod, Some("default".into()), "web-0");
        let key = LinkKey::new(RelationKind::PodNode, node.clone(), pod.clone());
        let record = ctx.envelope().link(&key, "related_to");

        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            fields::LINK_ENVELOPE.to_vec()
        );
        assert_eq!(record.get(fields::SRC_ENTITY_TYPE), Some("infra.k8s.node"));
        assert_eq!(record.get(fields::DEST_ENTITY_TYPE), Some("infra.k8s.pod"));
        assert_eq!(
            record.get(fields::SRC_ENTITY_ID),
            Some(EntityId::derive("c-1", &node).to_hex().as_str())
        );
        assert_eq!(
            record.get(fields::DEST_ENTITY_ID),
            Some(EntityId::derive("c-1", &pod).to_hex().as_str())
        );
        assert_eq!(record.get(fields::CATEGORY), Some("entity_link"));
        assert_eq!(record.get(fields::RELATION_TYPE), Some("related_to"));
    }
}
