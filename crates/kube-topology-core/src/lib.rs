//! Core types and utilities for kube-topology.
//!
//! This crate provides the foundational types used throughout the topology pipeline:
//!
//! - **Kinds**: the entity kinds and directed relation kinds the topology tracks
//! - **Keys**: identity of entities and links, independent of their state
//! - **Identifiers**: deterministic blake3 ids derived from keys
//! - **Records**: flat, schema-complete records with their observed-time window
//!
//! # Example
//!
//! ```
//! use kube_topology_core::{EntityId, EntityKey, EntityKind};
//!
//! let key = EntityKey::new(EntityKind::Pod, Some("default".to_string()), "web-0");
//! let id = EntityId::derive("cluster-a", &key);
//!
//! // The same key always yields the same id.
//! assert_eq!(id, EntityId::derive("cluster-a", &key));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod key;
pub mod kind;
pub mod record;

pub use error::{CoreError, Result};
pub use ids::{EntityId, IdError, LinkId};
pub use key::{EntityKey, LinkKey, TopologyKey};
pub use kind::{EntityKind, RelationKind};
pub use record::{GenericRecord, Method, ObservedWindow};
