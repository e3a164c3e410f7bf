//! Kubernetes topology mapping, dispatch and keepalive.
//!
//! This crate turns cluster resources and pre-matched resource pairs into a
//! stream of flat, schema-complete records, and keeps every live record
//! refreshed so a TTL-based index downstream never expires it while the
//! resource still exists.
//!
//! - **Mapping**: one [`EntityMapper`] per kind and one [`LinkMapper`] per
//!   relation, sharing the envelope built by [`CommonFieldBuilder`]
//! - **Dispatch**: the [`Dispatcher`] keeps the live key set and routes
//!   notifications to mappers and records to a [`RecordSink`]
//! - **Concurrency**: the [`WorkerPool`] serializes jobs per key across a
//!   fixed set of workers
//! - **Keepalive**: the [`KeepaliveScheduler`] re-emits every live key once
//!   per collection interval
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   jobs    ┌────────────┐  per-key   ┌──────────────┐
//! │ watch / join │ ────────▶ │ WorkerPool │ ─────────▶ │  Dispatcher  │
//! └──────────────┘           └────────────┘            └──────────────┘
//!                                  ▲                     │        │
//!                          refresh │          ┌──────────┘        │ records
//!                                  │          ▼                   ▼
//!                      ┌────────────────┐  ┌───────────────┐  ┌──────────────┐
//!                      │   Keepalive    │◀─│ TopologyCache │  │ BufferedSink │
//!                      │   Scheduler    │  └───────────────┘  └──────────────┘
//!                      └────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use k8s_openapi::api::core::v1::Pod;
//! use kube_topology_core::{Method, ObservedWindow};
//! use kube_topology_mapper::{
//!     BackpressurePolicy, BufferedSink, Dispatcher, ObjectWrapper, TopologyConfig,
//! };
//!
//! # async fn example() {
//! let config = Arc::new(TopologyConfig::with_cluster("infra", "cluster-a"));
//! let sink = Arc::new(BufferedSink::new(128, BackpressurePolicy::Block));
//! let dispatcher = Dispatcher::with_defaults(config, sink.clone());
//!
//! let wrapper = ObjectWrapper::new(Pod::default(), ObservedWindow::at(1_700_000_000));
//! dispatcher.dispatch(wrapper, Method::Upsert).await;
//!
//! let record = sink.recv().await;
//! assert!(record.is_some());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod keepalive;
pub mod link;
pub mod object;
pub mod pool;
pub mod quantity;
pub mod registry;
pub mod sink;
pub mod watch;

pub use cache::{CachedObject, TopologyCache};
#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::{BackpressurePolicy, RelationConfig, TopologyConfig};
pub use dispatcher::{DispatchReport, DispatchStats, Dispatcher, Job, JobRouter, StatsSnapshot};
pub use entity::EntityMapper;
pub use envelope::{CommonFieldBuilder, MapContext};
pub use error::{Result, TopologyError};
pub use keepalive::{KeepaliveScheduler, KeepaliveState, TickReport};
pub use link::{LinkMapper, RelationMapper};
pub use object::{JoinedPair, LinkWrapper, ObjectWrapper, TopologyObject};
pub use pool::WorkerPool;
pub use registry::MapperRegistry;
#[cfg(any(test, feature = "test-utils"))]
pub use sink::MemorySink;
pub use sink::{BufferedSink, RecordSink};
pub use watch::{jobs_for_event, watch_cluster, watch_kind, ObservedTracker};
