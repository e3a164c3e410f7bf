//! Deterministic identifiers for topology entities and links.
//!
//! Ids are blake3 digests over the identifying fields only. The same logical
//! resource maps to the same id on every process, so downstream stores can
//! key on them across restarts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::key::{EntityKey, LinkKey};

/// Feed one length-prefixed field into the hasher.
///
/// The prefix keeps `("ab", "c")` and `("a", "bc")` distinct.
fn update_field(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn decode_hex(s: &str) -> Result<[u8; 32], IdError> {
    let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
    bytes.try_into().map_err(|_| IdError::InvalidLength {
        expected: 32,
        got: s.len() / 2,
    })
}

/// A 32-byte entity identifier, hex-encoded for display.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId([u8; 32]);

impl EntityId {
    /// Create a new `EntityId` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the id of an entity within a cluster.
    ///
    /// Only the cluster id, kind, namespace and name participate; an absent
    /// namespace hashes the same as an empty one.
    #[must_use]
    pub fn derive(cluster_id: &str, key: &EntityKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        update_field(&mut hasher, cluster_id);
        update_field(&mut hasher, key.kind().type_name());
        update_field(&mut hasher, key.namespace().unwrap_or_default());
        update_field(&mut hasher, key.name());
        Self(*hasher.finalize().as_bytes())
    }

    /// Parse an `EntityId` from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not exactly 64 characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        decode_hex(s).map(Self)
    }

    /// Return the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the hex-encoded string representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.to_hex())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_hex()
    }
}

/// A 32-byte link identifier derived from the ordered endpoint ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkId([u8; 32]);

impl LinkId {
    /// Derive the id of a link within a cluster.
    ///
    /// Endpoint order is significant: the source id is hashed first.
    #[must_use]
    pub fn derive(cluster_id: &str, key: &LinkKey) -> Self {
        let source = EntityId::derive(cluster_id, key.source());
        let target = EntityId::derive(cluster_id, key.target());

        let mut hasher = blake3::Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(target.as_bytes());
        update_field(&mut hasher, key.relation().as_str());
        Self(*hasher.finalize().as_bytes())
    }

    /// Parse a `LinkId` from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not exactly 64 characters.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        decode_hex(s).map(Self)
    }

    /// Return the hex-encoded string representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkId({})", self.to_hex())
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for LinkId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<LinkId> for String {
    fn from(id: LinkId) -> Self {
        id.to_hex()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input string contains invalid hexadecimal characters.
    #[error("invalid hex encoding")]
    InvalidHex,

    /// The input has an incorrect length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        got: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{EntityKind, RelationKind};

    fn pod(name: &str) -> EntityKey {
        EntityKey::new(EntityKind::Pod, Some("default".into()), name)
    }

    #[test]
    fn entity_id_is_deterministic() {
        let a = EntityId::derive("cluster-a", &pod("web-0"));
        let b = EntityId::derive("cluster-a", &pod("web-0"));
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
    }

    #[test]
    fn entity_id_depends_on_identifying_fields() {
        let base = EntityId::derive("cluster-a", &pod("web-0"));
        assert_ne!(base, EntityId::derive("cluster-b", &pod("web-0")));
        assert_ne!(base, EntityId::derive("cluster-a", &pod("web-1")));

        let other_ns = EntityKey::new(EntityKind::Pod, Some("kube-system".into()), "web-0");
        assert_ne!(base, EntityId::derive("cluster-a", &other_ns));

        let other_kind = EntityKey::new(EntityKind::Service, Some("default".into()), "web-0");
        assert_ne!(base, EntityId::derive("cluster-a", &other_kind));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        let a = EntityKey::new(EntityKind::Pod, Some("ab".into()), "c");
        let b = EntityKey::new(EntityKind::Pod, Some("a".into()), "bc");
        assert_ne!(EntityId::derive("x", &a), EntityId::derive("x", &b));
    }

    #[test]
    fn link_id_depends_on_endpoints_and_relation() {
        let ns = EntityKey::new(EntityKind::Namespace, None, "default");
        let link = LinkKey::new(RelationKind::PodNamespace, ns, pod("web-0"));
        let id = LinkId::derive("cluster-a", &link);
        assert_eq!(id, LinkId::derive("cluster-a", &link));

        let node = EntityKey::new(EntityKind::Node, None, "default");
        let other = LinkKey::new(RelationKind::PodNode, node, pod("web-0"));
        assert_ne!(id, LinkId::derive("cluster-a", &other));
    }

    #[test]
    fn entity_id_hex_roundtrip() {
        let id = EntityId::derive("cluster-a", &pod("web-0"));
        assert_eq!(EntityId::from_hex(&id.to_hex()).unwrap(), id);
        assert!(matches!(EntityId::from_hex("zz"), Err(IdError::InvalidHex)));
        assert!(matches!(
            EntityId::from_hex("deadbeef"),
            Err(IdError::InvalidLength { .. })
        ));
    }

    #[test]
    fn entity_id_serde_json() {
        let id = EntityId::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
