//! Entity mappers: one per kind.
//!
//! A mapper turns one typed resource into flat records. Every record of a
//! kind carries the same field set: the entity envelope followed by the
//! kind's fields from [`fields`]. Absent values render as empty text, never as
//! a missing field.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMap, Container, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube_topology_core::{EntityKey, EntityKind, GenericRecord};
use serde::Serialize;

use crate::canonical;
use crate::envelope::MapContext;
use crate::fields;
use crate::object::{entity_key, TopologyObject};
use crate::quantity;
use crate::Result;

/// Maps a typed resource into zero or more entity records.
pub trait EntityMapper: Send + Sync {
    /// Kind of the records this mapper builds.
    fn kind(&self) -> EntityKind;

    /// Kind-specific fields, in record order, following the envelope.
    fn fields(&self) -> &'static [&'static str];

    /// Map `object` into records.
    ///
    /// An object of another kind yields no records.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::Serialization` if a nested field cannot be
    /// encoded. No partial output is returned in that case.
    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>>;
}

fn created(meta: &ObjectMeta) -> Option<i64> {
    meta.creation_timestamp.as_ref().map(|t| t.0.timestamp())
}

fn start(ctx: &MapContext<'_>, kind: EntityKind, meta: &ObjectMeta, extra: usize) -> GenericRecord {
    let key = entity_key(kind, meta);
    ctx.envelope()
        .entity(&key, key.name(), created(meta), extra)
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn set_metadata(record: &mut GenericRecord, meta: &ObjectMeta) -> Result<()> {
    record.set(fields::LABELS, canonical::encode_object(meta.labels.as_ref())?);
    record.set(
        fields::ANNOTATIONS,
        canonical::encode_object(meta.annotations.as_ref())?,
    );
    Ok(())
}

fn api_version<K: k8s_openapi::Resource>() -> &'static str {
    K::API_VERSION
}

/// Pod records, plus one container record per container when enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct PodMapper {
    containers: ContainerMapper,
}

#[derive(Serialize)]
struct ContainerSummary<'a> {
    image: &'a str,
    name: &'a str,
}

impl PodMapper {
    fn pod_record(pod: &Pod, ctx: &MapContext<'_>) -> Result<GenericRecord> {
        let meta = &pod.metadata;
        let spec = pod.spec.as_ref();
        let status = pod.status.as_ref();
        let mut record = start(ctx, EntityKind::Pod, meta, fields::POD_FIELDS.len());

        record.set(fields::API_VERSION, api_version::<Pod>());
        record.set(fields::NAMESPACE, text(meta.namespace.as_ref()));
        set_metadata(&mut record, meta)?;
        record.set(fields::STATUS, text(status.and_then(|s| s.phase.as_ref())));
        record.set(fields::INSTANCE_IP, text(status.and_then(|s| s.pod_ip.as_ref())));
        record.set(fields::HOST_IP, text(status.and_then(|s| s.host_ip.as_ref())));
        record.set(fields::NODE_NAME, text(spec.and_then(|s| s.node_name.as_ref())));

        let owner = meta.owner_references.as_ref().and_then(|owners| {
            owners
                .iter()
                .find(|o| o.controller == Some(true))
                .or_else(|| owners.first())
        });
        record.set(
            fields::WORKLOAD_KIND,
            owner.map(|o| o.kind.clone()).unwrap_or_default(),
        );
        record.set(
            fields::WORKLOAD_NAME,
            owner.map(|o| o.name.clone()).unwrap_or_default(),
        );

        let containers: Vec<ContainerSummary<'_>> = spec
            .map(|s| s.containers.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|c| ContainerSummary {
                image: c.image.as_deref().unwrap_or_default(),
                name: &c.name,
            })
            .collect();
        record.set(fields::CONTAINERS, canonical::encode(&containers)?);
        Ok(record)
    }
}

impl EntityMapper for PodMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::Pod
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::POD_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::Pod(pod) = object else {
            return Ok(Vec::new());
        };
        let mut records = vec![Self::pod_record(pod, ctx)?];
        if ctx.config.emit_containers {
            records.extend(self.containers.map(object, ctx)?);
        }
        Ok(records)
    }
}

/// Container sub-entity records, one per container spec of a pod.
///
/// The container name is the record name; the entity key name is the pod
/// name concatenated with the container name.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerMapper;

#[derive(Serialize)]
struct VolumeSummary<'a> {
    #[serde(rename = "volumeMountName")]
    name: &'a str,
    #[serde(rename = "volumeMountPath")]
    path: &'a str,
}

impl ContainerMapper {
    fn container_record(
        pod: &Pod,
        container: &Container,
        ctx: &MapContext<'_>,
    ) -> Result<GenericRecord> {
        let meta = &pod.metadata;
        let pod_name = meta.name.as_deref().unwrap_or_default();
        let pod_namespace = meta.namespace.as_deref().unwrap_or_default();
        let key = EntityKey::container(meta.namespace.as_deref(), pod_name, &container.name);
        let mut record = ctx.envelope().entity(
            &key,
            &container.name,
            created(meta),
            fields::CONTAINER_FIELDS.len(),
        );

        record.set(fields::POD_NAME, pod_name);
        record.set(fields::POD_NAMESPACE, pod_namespace);
        record.set(fields::IMAGE, text(container.image.as_ref()));

        let resources = container.resources.as_ref();
        let requests = resources.and_then(|r| r.requests.as_ref());
        let limits = resources.and_then(|r| r.limits.as_ref());
        record.set(
            fields::CPU_REQUEST,
            quantity::render(requests.and_then(|r| r.get("cpu"))),
        );
        record.set(
            fields::CPU_LIMIT,
            quantity::render(limits.and_then(|l| l.get("cpu"))),
        );
        record.set(
            fields::MEMORY_REQUEST,
            quantity::render(requests.and_then(|r| r.get("memory"))),
        );
        record.set(
            fields::MEMORY_LIMIT,
            quantity::render(limits.and_then(|l| l.get("memory"))),
        );

        let ports: Vec<i32> = container
            .ports
            .iter()
            .flatten()
            .map(|p| p.container_port)
            .collect();
        record.set(fields::CONTAINER_PORTS, canonical::encode(&ports)?);

        let volumes: Vec<VolumeSummary<'_>> = container
            .volume_mounts
            .iter()
            .flatten()
            .map(|v| VolumeSummary {
                name: &v.name,
                path: &v.mount_path,
            })
            .collect();
        record.set(fields::VOLUMES, canonical::encode(&volumes)?);
        Ok(record)
    }
}

impl EntityMapper for ContainerMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::Container
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::CONTAINER_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::Pod(pod) = object else {
            return Ok(Vec::new());
        };
        pod.spec
            .iter()
            .flat_map(|spec| spec.containers.iter())
            .map(|container| Self::container_record(pod, container, ctx))
            .collect()
    }
}

/// Node records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeMapper;

#[derive(Serialize)]
struct ConditionSummary<'a> {
    status: &'a str,
    #[serde(rename = "type")]
    type_: &'a str,
}

#[derive(Serialize)]
struct AddressSummary<'a> {
    address: &'a str,
    #[serde(rename = "type")]
    type_: &'a str,
}

impl EntityMapper for NodeMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::Node
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::NODE_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::Node(node) = object else {
            return Ok(Vec::new());
        };
        let node: &Node = node;
        let meta = &node.metadata;
        let status = node.status.as_ref();
        let mut record = start(ctx, EntityKind::Node, meta, fields::NODE_FIELDS.len());

        set_metadata(&mut record, meta)?;

        let conditions: Vec<ConditionSummary<'_>> = status
            .and_then(|s| s.conditions.as_ref())
            .into_iter()
            .flatten()
            .map(|c| ConditionSummary {
                status: &c.status,
                type_: &c.type_,
            })
            .collect();
        record.set(fields::STATUS, canonical::encode(&conditions)?);

        let addresses = status.and_then(|s| s.addresses.as_deref()).unwrap_or_default();
        let address_of = |kind: &str| {
            addresses
                .iter()
                .find(|a| a.type_ == kind)
                .map(|a| a.address.clone())
                .unwrap_or_default()
        };
        record.set(fields::INTERNAL_IP, address_of("InternalIP"));
        record.set(fields::HOST_NAME, address_of("Hostname"));

        record.set(
            fields::CAPACITY,
            canonical::encode(&quantity::render_map(status.and_then(|s| s.capacity.as_ref())))?,
        );
        record.set(
            fields::ALLOCATABLE,
            canonical::encode(&quantity::render_map(
                status.and_then(|s| s.allocatable.as_ref()),
            ))?,
        );

        let summaries: Vec<AddressSummary<'_>> = addresses
            .iter()
            .map(|a| AddressSummary {
                address: &a.address,
                type_: &a.type_,
            })
            .collect();
        record.set(fields::ADDRESSES, canonical::encode(&summaries)?);
        record.set(
            fields::PROVIDER_ID,
            text(node.spec.as_ref().and_then(|s| s.provider_id.as_ref())),
        );
        Ok(vec![record])
    }
}

/// Service records.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceMapper;

#[derive(Serialize)]
struct PortSummary {
    port: String,
    protocol: String,
    #[serde(rename = "targetPort")]
    target_port: String,
}

fn target_port(port: Option<&IntOrString>) -> String {
    match port {
        Some(IntOrString::Int(n)) => n.to_string(),
        Some(IntOrString::String(name)) => name.clone(),
        None => String::new(),
    }
}

impl EntityMapper for ServiceMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::Service
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::SERVICE_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::Service(service) = object else {
            return Ok(Vec::new());
        };
        let service: &Service = service;
        let meta = &service.metadata;
        let spec = service.spec.as_ref();
        let mut record = start(ctx, EntityKind::Service, meta, fields::SERVICE_FIELDS.len());

        record.set(fields::API_VERSION, api_version::<Service>());
        record.set(fields::NAMESPACE, text(meta.namespace.as_ref()));
        set_metadata(&mut record, meta)?;
        record.set(
            fields::SELECTOR,
            canonical::encode_object(spec.and_then(|s| s.selector.as_ref()))?,
        );
        record.set(fields::TYPE, text(spec.and_then(|s| s.type_.as_ref())));
        record.set(fields::CLUSTER_IP, text(spec.and_then(|s| s.cluster_ip.as_ref())));

        let ports: Vec<PortSummary> = spec
            .and_then(|s| s.ports.as_ref())
            .into_iter()
            .flatten()
            .map(|p| PortSummary {
                port: p.port.to_string(),
                protocol: text(p.protocol.as_ref()),
                target_port: target_port(p.target_port.as_ref()),
            })
            .collect();
        record.set(fields::PORTS, canonical::encode(&ports)?);
        Ok(vec![record])
    }
}

/// Config map records.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigMapMapper;

impl EntityMapper for ConfigMapMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::ConfigMap
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::CONFIG_MAP_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::ConfigMap(config_map) = object else {
            return Ok(Vec::new());
        };
        let meta = &config_map.metadata;
        let mut record = start(
            ctx,
            EntityKind::ConfigMap,
            meta,
            fields::CONFIG_MAP_FIELDS.len(),
        );
        record.set(fields::API_VERSION, api_version::<ConfigMap>());
        record.set(fields::NAMESPACE, text(meta.namespace.as_ref()));
        set_metadata(&mut record, meta)?;
        Ok(vec![record])
    }
}

/// Namespace records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamespaceMapper;

impl EntityMapper for NamespaceMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::Namespace
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::NAMESPACE_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::Namespace(namespace) = object else {
            return Ok(Vec::new());
        };
        let meta = &namespace.metadata;
        let mut record = start(
            ctx,
            EntityKind::Namespace,
            meta,
            fields::NAMESPACE_FIELDS.len(),
        );
        record.set(fields::API_VERSION, api_version::<Namespace>());
        set_metadata(&mut record, meta)?;
        record.set(
            fields::STATUS,
            text(namespace.status.as_ref().and_then(|s| s.phase.as_ref())),
        );
        Ok(vec![record])
    }
}

/// Persistent volume records.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersistentVolumeMapper;

impl EntityMapper for PersistentVolumeMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::PersistentVolume
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::PERSISTENT_VOLUME_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::PersistentVolume(volume) = object else {
            return Ok(Vec::new());
        };
        let volume: &PersistentVolume = volume;
        let meta = &volume.metadata;
        let spec = volume.spec.as_ref();
        let mut record = start(
            ctx,
            EntityKind::PersistentVolume,
            meta,
            fields::PERSISTENT_VOLUME_FIELDS.len(),
        );

        record.set(fields::API_VERSION, api_version::<PersistentVolume>());
        record.set(fields::NAMESPACE, text(meta.namespace.as_ref()));
        set_metadata(&mut record, meta)?;
        record.set(
            fields::STATUS,
            text(volume.status.as_ref().and_then(|s| s.phase.as_ref())),
        );
        record.set(
            fields::STORAGE_CLASS_NAME,
            text(spec.and_then(|s| s.storage_class_name.as_ref())),
        );
        record.set(
            fields::RECLAIM_POLICY,
            text(spec.and_then(|s| s.persistent_volume_reclaim_policy.as_ref())),
        );
        record.set(
            fields::VOLUME_MODE,
            text(spec.and_then(|s| s.volume_mode.as_ref())),
        );
        record.set(
            fields::CAPACITY,
            quantity::render(
                spec.and_then(|s| s.capacity.as_ref())
                    .and_then(|c| c.get("storage")),
            ),
        );
        record.set(
            fields::FS_TYPE,
            text(
                spec.and_then(|s| s.csi.as_ref())
                    .and_then(|csi| csi.fs_type.as_ref()),
            ),
        );
        Ok(vec![record])
    }
}

/// Persistent volume claim records.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersistentVolumeClaimMapper;

impl EntityMapper for PersistentVolumeClaimMapper {
    fn kind(&self) -> EntityKind {
        EntityKind::PersistentVolumeClaim
    }

    fn fields(&self) -> &'static [&'static str] {
        fields::PERSISTENT_VOLUME_CLAIM_FIELDS
    }

    fn map(&self, object: &TopologyObject, ctx: &MapContext<'_>) -> Result<Vec<GenericRecord>> {
        let TopologyObject::PersistentVolumeClaim(claim) = object else {
            return Ok(Vec::new());
        };
        let claim: &PersistentVolumeClaim = claim;
        let meta = &claim.metadata;
        let spec = claim.spec.as_ref();
        let mut record = start(
            ctx,
            EntityKind::PersistentVolumeClaim,
            meta,
            fields::PERSISTENT_VOLUME_CLAIM_FIELDS.len(),
        );

        record.set(fields::API_VERSION, api_version::<PersistentVolumeClaim>());
        record.set(fields::NAMESPACE, text(meta.namespace.as_ref()));
        set_metadata(&mut record, meta)?;
        record.set(
            fields::STATUS,
            text(claim.status.as_ref().and_then(|s| s.phase.as_ref())),
        );
        let requests: Option<&BTreeMap<_, _>> = spec
            .and_then(|s| s.resources.as_ref())
            .and_then(|r| r.requests.as_ref());
        record.set(
            fields::STORAGE_REQUESTS,
            quantity::render(requests.and_then(|r| r.get("storage"))),
        );
        record.set(
            fields::STORAGE_CLASS_NAME,
            text(spec.and_then(|s| s.storage_class_name.as_ref())),
        );
        record.set(
            fields::VOLUME_NAME,
            text(spec.and_then(|s| s.volume_name.as_ref())),
        );
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyConfig;
    use k8s_openapi::api::core::v1::{
        ContainerPort, NodeAddress, NodeStatus, PersistentVolumeClaimSpec, PodSpec, PodStatus,
        ResourceRequirements, ServicePort, ServiceSpec, VolumeMount,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
    use kube_topology_core::{Method, ObservedWindow};

    fn meta(namespace: Option<&str>, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            creation_timestamp: chrono::DateTime::from_timestamp(1_700_000_000, 0).map(Time),
            ..Default::default()
        }
    }

    fn container(name: &str, cpu: Option<&str>) -> Container {
        Container {
            name: name.to_string(),
            image: Some(format!("registry/{name}:1")),
            ports: Some(vec![ContainerPort {
                container_port: 8080,
                ..Default::default()
            }]),
            resources: cpu.map(|cpu| ResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "cpu".to_string(),
                    Quantity(cpu.to_string()),
                )])),
                ..Default::default()
            }),
            volume_mounts: Some(vec![VolumeMount {
                name: "config".to_string(),
                mount_path: "/etc/app".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    fn pod(containers: Vec<Container>) -> TopologyObject {
        let mut meta = meta(Some("default"), "web-0");
        meta.labels = Some(BTreeMap::from([
            ("tier".to_string(), "frontend".to_string()),
            ("app".to_string(), "web".to_string()),
        ]));
        meta.owner_references = Some(vec![
            OwnerReference {
                kind: "Node".to_string(),
                name: "unrelated".to_string(),
                ..Default::default()
            },
            OwnerReference {
                kind: "ReplicaSet".to_string(),
                name: "web-7d9f".to_string(),
                controller: Some(true),
                ..Default::default()
            },
        ]);
        Pod {
            metadata: meta,
            spec: Some(PodSpec {
                containers,
                node_name: Some("node-1".to_string()),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                pod_ip: Some("10.0.0.7".to_string()),
                ..Default::default()
            }),
        }
        .into()
    }

    fn ctx(config: &TopologyConfig) -> MapContext<'_> {
        MapContext::new(config, Method::Upsert, ObservedWindow::new(100, 200), 300)
    }

    fn assert_schema(mapper: &dyn EntityMapper, record: &GenericRecord) {
        let expected: Vec<&str> = fields::ENTITY_ENVELOPE
            .iter()
            .chain(mapper.fields())
            .copied()
            .collect();
        assert_eq!(record.field_names().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn pod_fans_out_containers() {
        let config = TopologyConfig::default();
        let object = pod(vec![container("app", Some("0.5")), container("sidecar", None)]);
        let records = PodMapper::default().map(&object, &ctx(&config)).unwrap();

        assert_eq!(records.len(), 3);
        assert_schema(&PodMapper::default(), &records[0]);
        assert_schema(&ContainerMapper, &records[1]);
        assert_schema(&ContainerMapper, &records[2]);

        let pod = &records[0];
        assert_eq!(pod.get(fields::KIND), Some("Pod"));
        assert_eq!(pod.get(fields::API_VERSION), Some("v1"));
        assert_eq!(pod.get(fields::STATUS), Some("Running"));
        assert_eq!(pod.get(fields::INSTANCE_IP), Some("10.0.0.7"));
        assert_eq!(pod.get(fields::HOST_IP), Some(""));
        assert_eq!(pod.get(fields::NODE_NAME), Some("node-1"));
        assert_eq!(pod.get(fields::WORKLOAD_KIND), Some("ReplicaSet"));
        assert_eq!(pod.get(fields::WORKLOAD_NAME), Some("web-7d9f"));
        assert_eq!(pod.get(fields::CREATE_TIME), Some("1700000000"));
        assert_eq!(
            pod.get(fields::LABELS),
            Some(r#"{"app":"web","tier":"frontend"}"#)
        );
        assert_eq!(pod.get(fields::ANNOTATIONS), Some("{}"));
        assert_eq!(
            pod.get(fields::CONTAINERS),
            Some(r#"[{"image":"registry/app:1","name":"app"},{"image":"registry/sidecar:1","name":"sidecar"}]"#)
        );

        let app = &records[1];
        assert_eq!(app.get(fields::KIND), Some("Container"));
        assert_eq!(app.get(fields::NAME), Some("app"));
        assert_eq!(app.get(fields::POD_NAME), Some("web-0"));
        assert_eq!(app.get(fields::POD_NAMESPACE), Some("default"));
        assert_eq!(app.get(fields::CREATE_TIME), Some("1700000000"));
        assert_eq!(app.get(fields::CPU_REQUEST), Some("500m"));
        assert_eq!(app.get(fields::CPU_LIMIT), Some(""));
        assert_eq!(app.get(fields::CONTAINER_PORTS), Some("[8080]"));
        assert_eq!(
            app.get(fields::VOLUMES),
            Some(r#"[{"volumeMountName":"config","volumeMountPath":"/etc/app"}]"#)
        );
        let key = EntityKey::container(Some("default"), "web-0", "app");
        assert_eq!(
            app.get(fields::ENTITY_ID),
            Some(
                kube_topology_core::EntityId::derive(&config.cluster_id, &key)
                    .to_hex()
                    .as_str()
            )
        );

        assert_eq!(records[2].get(fields::MEMORY_REQUEST), Some(""));
    }

    #[test]
    fn container_emission_can_be_disabled() {
        let config = TopologyConfig {
            emit_containers: false,
            ..Default::default()
        };
        let object = pod(vec![container("app", None)]);
        let records = PodMapper::default().map(&object, &ctx(&config)).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn container_without_ports_renders_empty_list() {
        let config = TopologyConfig::default();
        let bare = Container {
            name: "bare".to_string(),
            ..Default::default()
        };
        let records = ContainerMapper.map(&pod(vec![bare]), &ctx(&config)).unwrap();
        assert_eq!(records[0].get(fields::CONTAINER_PORTS), Some("[]"));
        assert_eq!(records[0].get(fields::VOLUMES), Some("[]"));
        assert_eq!(records[0].get(fields::IMAGE), Some(""));
    }

    #[test]
    fn mapping_is_idempotent() {
        let config = TopologyConfig::default();
        let object = pod(vec![container("app", Some("1"))]);
        let first = PodMapper::default().map(&object, &ctx(&config)).unwrap();
        let second = PodMapper::default().map(&object, &ctx(&config)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn type_mismatch_yields_nothing() {
        let config = TopologyConfig::default();
        let object = pod(Vec::new());
        assert!(NodeMapper.map(&object, &ctx(&config)).unwrap().is_empty());
        assert!(ServiceMapper.map(&object, &ctx(&config)).unwrap().is_empty());
        assert!(PersistentVolumeClaimMapper
            .map(&object, &ctx(&config))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn service_target_ports() {
        let config = TopologyConfig::default();
        let service = Service {
            metadata: meta(Some("default"), "web"),
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                cluster_ip: Some("10.96.0.10".to_string()),
                selector: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
                ports: Some(vec![
                    ServicePort {
                        port: 80,
                        protocol: Some("TCP".to_string()),
                        target_port: Some(IntOrString::String("http".to_string())),
                        ..Default::default()
                    },
                    ServicePort {
                        port: 443,
                        protocol: Some("TCP".to_string()),
                        target_port: Some(IntOrString::Int(8443)),
                        ..Default::default()
                    },
                    ServicePort {
                        port: 9090,
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let records = ServiceMapper.map(&service.into(), &ctx(&config)).unwrap();
        let record = &records[0];
        assert_schema(&ServiceMapper, record);
        assert_eq!(record.get(fields::TYPE), Some("ClusterIP"));
        assert_eq!(record.get(fields::SELECTOR), Some(r#"{"app":"web"}"#));
        assert_eq!(
            record.get(fields::PORTS),
            Some(concat!(
                r#"[{"port":"80","protocol":"TCP","targetPort":"http"},"#,
                r#"{"port":"443","protocol":"TCP","targetPort":"8443"},"#,
                r#"{"port":"9090","protocol":"","targetPort":""}]"#
            ))
        );
    }

    #[test]
    fn claim_without_storage_class_renders_empty() {
        let config = TopologyConfig::default();
        let claim = PersistentVolumeClaim {
            metadata: meta(Some("default"), "data"),
            spec: Some(PersistentVolumeClaimSpec::default()),
            ..Default::default()
        };
        let records = PersistentVolumeClaimMapper
            .map(&claim.into(), &ctx(&config))
            .unwrap();
        assert_schema(&PersistentVolumeClaimMapper, &records[0]);
        assert_eq!(records[0].get(fields::STORAGE_CLASS_NAME), Some(""));
        assert_eq!(records[0].get(fields::STORAGE_REQUESTS), Some(""));
        assert_eq!(records[0].get(fields::STATUS), Some(""));
    }

    #[test]
    fn node_addresses_and_quantities() {
        let config = TopologyConfig::default();
        let node = Node {
            metadata: meta(None, "node-1"),
            status: Some(NodeStatus {
                addresses: Some(vec![
                    NodeAddress {
                        address: "192.168.1.10".to_string(),
                        type_: "InternalIP".to_string(),
                    },
                    NodeAddress {
                        address: "node-1".to_string(),
                        type_: "Hostname".to_string(),
                    },
                ]),
                capacity: Some(BTreeMap::from([
                    ("cpu".to_string(), Quantity("4".to_string())),
                    ("memory".to_string(), Quantity("16777216Ki".to_string())),
                ])),
                ..Default::default()
            }),
            ..Default::default()
        };
        let records = NodeMapper.map(&node.into(), &ctx(&config)).unwrap();
        let record = &records[0];
        assert_schema(&NodeMapper, record);
        assert_eq!(record.get(fields::INTERNAL_IP), Some("192.168.1.10"));
        assert_eq!(record.get(fields::HOST_NAME), Some("node-1"));
        assert_eq!(
            record.get(fields::CAPACITY),
            Some(r#"{"cpu":"4","memory":"16Gi"}"#)
        );
        assert_eq!(record.get(fields::ALLOCATABLE), Some("{}"));
        assert_eq!(record.get(fields::STATUS), Some("[]"));
        assert_eq!(record.get(fields::PROVIDER_ID), Some(""));
    }

    #[test]
    fn cluster_scoped_and_simple_kinds_keep_schema() {
        let config = TopologyConfig::default();
        let cases: Vec<(Box<dyn EntityMapper>, TopologyObject)> = vec![
            (
                Box::new(ConfigMapMapper),
                ConfigMap {
                    metadata: meta(Some("default"), "settings"),
                    ..Default::default()
                }
                .into(),
            ),
            (
                Box::new(NamespaceMapper),
                Namespace {
                    metadata: meta(None, "default"),
                    ..Default::default()
                }
                .into(),
            ),
            (
                Box::new(PersistentVolumeMapper),
                PersistentVolume {
                    metadata: meta(None, "pv-1"),
                    ..Default::default()
                }
                .into(),
            ),
        ];
        for (mapper, object) in cases {
            let records = mapper.map(&object, &ctx(&config)).unwrap();
            assert_eq!(records.len(), 1);
            assert_schema(mapper.as_ref(), &records[0]);
            assert_eq!(records[0].get(fields::KIND), Some(mapper.kind().kind_name()));
        }
    }

    #[test]
    fn delete_keeps_full_schema() {
        let config = TopologyConfig::default();
        let ctx = MapContext::new(&config, Method::Delete, ObservedWindow::at(100), 100);
        let records = PodMapper::default()
            .map(&pod(vec![container("app", None)]), &ctx)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_schema(&PodMapper::default(), &records[0]);
        assert!(records.iter().all(|r| r.get(fields::METHOD) == Some("delete")));
    }
}
