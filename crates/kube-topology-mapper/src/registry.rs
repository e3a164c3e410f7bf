//! Mapper lookup by entity kind and relation kind.

use std::collections::HashMap;

use kube_topology_core::{EntityKind, RelationKind};

use crate::entity::{
    ConfigMapMapper, ContainerMapper, EntityMapper, NamespaceMapper, NodeMapper,
    PersistentVolumeClaimMapper, PersistentVolumeMapper, PodMapper, ServiceMapper,
};
use crate::link::{LinkMapper, RelationMapper};

/// The set of mappers a dispatcher routes to.
///
/// Injected at construction, so tests can register their own mappers.
pub struct MapperRegistry {
    entities: HashMap<EntityKind, Box<dyn EntityMapper>>,
    links: HashMap<RelationKind, Box<dyn LinkMapper>>,
}

impl MapperRegistry {
    /// A registry with no mappers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entities: HashMap::new(),
            links: HashMap::new(),
        }
    }

    /// A registry with a mapper for every supported kind and relation.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_entity(PodMapper::default());
        registry.register_entity(ContainerMapper);
        registry.register_entity(NodeMapper);
        registry.register_entity(ServiceMapper);
        registry.register_entity(ConfigMapMapper);
        registry.register_entity(NamespaceMapper);
        registry.register_entity(PersistentVolumeMapper);
        registry.register_entity(PersistentVolumeClaimMapper);
        for relation in RelationKind::ALL {
            registry.register_link(RelationMapper::new(relation));
        }
        registry
    }

    /// Register an entity mapper, replacing any mapper for the same kind.
    pub fn register_entity(&mut self, mapper: impl EntityMapper + 'static) {
        self.entities.insert(mapper.kind(), Box::new(mapper));
    }

    /// Register a link mapper, replacing any mapper for the same relation.
    pub fn register_link(&mut self, mapper: impl LinkMapper + 'static) {
        self.links.insert(mapper.relation(), Box::new(mapper));
    }

    /// Mapper for `kind`, if registered.
    #[must_use]
    pub fn entity(&self, kind: EntityKind) -> Option<&dyn EntityMapper> {
        self.entities.get(&kind).map(AsRef::as_ref)
    }

    /// Mapper for `relation`, if registered.
    #[must_use]
    pub fn link(&self, relation: RelationKind) -> Option<&dyn LinkMapper> {
        self.links.get(&relation).map(AsRef::as_ref)
    }
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.entities.keys().collect();
        kinds.sort();
        let mut relations: Vec<_> = self.links.keys().collect();
        relations.sort();
        f.debug_struct("MapperRegistry")
            .field("entities", &kinds)
            .field("links", &relations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_everything() {
        let registry = MapperRegistry::standard();
        for kind in EntityKind::ALL {
            let mapper = registry.entity(kind).unwrap();
            assert_eq!(mapper.kind(), kind);
        }
        for relation in RelationKind::ALL {
            assert_eq!(registry.link(relation).unwrap().relation(), relation);
        }
    }

    #[test]
    fn empty_registry_has_nothing() {
        let registry = MapperRegistry::empty();
        assert!(registry.entity(EntityKind::Pod).is_none());
        assert!(registry.link(RelationKind::PodNode).is_none());
    }
}
