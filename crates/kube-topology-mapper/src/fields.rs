//! Record field names.
//!
//! Envelope fields come first in every record, in the order listed by
//! [`ENTITY_ENVELOPE`] and [`LINK_ENVELOPE`]; kind-specific fields follow in
//! the order of the per-kind lists.

/// Domain label.
pub const DOMAIN: &str = "__domain__";
/// Entity type key (e.g. `infra.k8s.pod`).
pub const ENTITY_TYPE: &str = "__entity_type__";
/// Entity id.
pub const ENTITY_ID: &str = "__entity_id__";
/// Record method (`upsert` or `delete`).
pub const METHOD: &str = "__method__";
/// First observed instant, Unix seconds.
pub const FIRST_OBSERVED_TIME: &str = "__first_observed_time__";
/// Last observed instant, Unix seconds.
pub const LAST_OBSERVED_TIME: &str = "__last_observed_time__";
/// Seconds the record stays alive downstream without a refresh.
pub const KEEP_ALIVE_SECONDS: &str = "__keep_alive_seconds__";
/// Record category.
pub const CATEGORY: &str = "__category__";
/// Cluster id.
pub const CLUSTER_ID: &str = "cluster_id";
/// Resource kind.
pub const KIND: &str = "kind";
/// Resource name.
pub const NAME: &str = "name";
/// Creation instant, Unix seconds.
pub const CREATE_TIME: &str = "create_time";

/// Source entity domain.
pub const SRC_DOMAIN: &str = "__src_domain__";
/// Source entity type key.
pub const SRC_ENTITY_TYPE: &str = "__src_entity_type__";
/// Source entity id.
pub const SRC_ENTITY_ID: &str = "__src_entity_id__";
/// Target entity domain.
pub const DEST_DOMAIN: &str = "__dest_domain__";
/// Target entity type key.
pub const DEST_ENTITY_TYPE: &str = "__dest_entity_type__";
/// Target entity id.
pub const DEST_ENTITY_ID: &str = "__dest_entity_id__";
/// Link id.
pub const LINK_ID: &str = "__link_id__";
/// Relation type tag.
pub const RELATION_TYPE: &str = "__relation_type__";

/// Category of entity records.
pub const CATEGORY_ENTITY: &str = "entity";
/// Category of link records.
pub const CATEGORY_LINK: &str = "entity_link";

/// Envelope of every entity record.
pub const ENTITY_ENVELOPE: [&str; 12] = [
    DOMAIN,
    ENTITY_TYPE,
    ENTITY_ID,
    METHOD,
    FIRST_OBSERVED_TIME,
    LAST_OBSERVED_TIME,
    KEEP_ALIVE_SECONDS,
    CATEGORY,
    CLUSTER_ID,
    KIND,
    NAME,
    CREATE_TIME,
];

/// Envelope of every link record.
pub const LINK_ENVELOPE: [&str; 14] = [
    SRC_DOMAIN,
    SRC_ENTITY_TYPE,
    SRC_ENTITY_ID,
    DEST_DOMAIN,
    DEST_ENTITY_TYPE,
    DEST_ENTITY_ID,
    LINK_ID,
    METHOD,
    FIRST_OBSERVED_TIME,
    LAST_OBSERVED_TIME,
    KEEP_ALIVE_SECONDS,
    CATEGORY,
    CLUSTER_ID,
    RELATION_TYPE,
];

/// `api_version` field.
pub const API_VERSION: &str = "api_version";
/// `namespace` field.
pub const NAMESPACE: &str = "namespace";
/// `labels` field.
pub const LABELS: &str = "labels";
/// `annotations` field.
pub const ANNOTATIONS: &str = "annotations";
/// `status` field.
pub const STATUS: &str = "status";
/// `instance_ip` field.
pub const INSTANCE_IP: &str = "instance_ip";
/// `host_ip` field.
pub const HOST_IP: &str = "host_ip";
/// `node_name` field.
pub const NODE_NAME: &str = "node_name";
/// `workload_kind` field.
pub const WORKLOAD_KIND: &str = "workload_kind";
/// `workload_name` field.
pub const WORKLOAD_NAME: &str = "workload_name";
/// `containers` field.
pub const CONTAINERS: &str = "containers";
/// `pod_name` field.
pub const POD_NAME: &str = "pod_name";
/// `pod_namespace` field.
pub const POD_NAMESPACE: &str = "pod_namespace";
/// `image` field.
pub const IMAGE: &str = "image";
/// `cpu_request` field.
pub const CPU_REQUEST: &str = "cpu_request";
/// `cpu_limit` field.
pub const CPU_LIMIT: &str = "cpu_limit";
/// `memory_request` field.
pub const MEMORY_REQUEST: &str = "memory_request";
/// `memory_limit` field.
pub const MEMORY_LIMIT: &str = "memory_limit";
/// `container_ports` field.
pub const CONTAINER_PORTS: &str = "container_ports";
/// `volumes` field.
pub const VOLUMES: &str = "volumes";
/// `internal_ip` field.
pub const INTERNAL_IP: &str = "internal_ip";
/// `host_name` field.
pub const HOST_NAME: &str = "host_name";
/// `capacity` field.
pub const CAPACITY: &str = "capacity";
/// `allocatable` field.
pub const ALLOCATABLE: &str = "allocatable";
/// `addresses` field.
pub const ADDRESSES: &str = "addresses";
/// `provider_id` field.
pub const PROVIDER_ID: &str = "provider_id";
/// `selector` field.
pub const SELECTOR: &str = "selector";
/// `type` field.
pub const TYPE: &str = "type";
/// `cluster_ip` field.
pub const CLUSTER_IP: &str = "cluster_ip";
/// `ports` field.
pub const PORTS: &str = "ports";
/// `storage_class_name` field.
pub const STORAGE_CLASS_NAME: &str = "storage_class_name";
/// `persistent_volume_reclaim_policy` field.
pub const RECLAIM_POLICY: &str = "persistent_volume_reclaim_policy";
/// `volume_mode` field.
pub const VOLUME_MODE: &str = "volume_mode";
/// `fsType` field.
pub const FS_TYPE: &str = "fsType";
/// `storage_requests` field.
pub const STORAGE_REQUESTS: &str = "storage_requests";
/// `volume_name` field.
pub const VOLUME_NAME: &str = "volume_name";

/// Kind-specific fields of pod records.
pub const POD_FIELDS: &[&str] = &[
    API_VERSION,
    NAMESPACE,
    LABELS,
    ANNOTATIONS,
    STATUS,
    INSTANCE_IP,
    HOST_IP,
    NODE_NAME,
    WORKLOAD_KIND,
    WORKLOAD_NAME,
    CONTAINERS,
];

/// Kind-specific fields of container records.
pub const CONTAINER_FIELDS: &[&str] = &[
    POD_NAME,
    POD_NAMESPACE,
    IMAGE,
    CPU_REQUEST,
    CPU_LIMIT,
    MEMORY_REQUEST,
    MEMORY_LIMIT,
    CONTAINER_PORTS,
    VOLUMES,
];

/// Kind-specific fields of node records.
pub const NODE_FIELDS: &[&str] = &[
    LABELS,
    ANNOTATIONS,
    STATUS,
    INTERNAL_IP,
    HOST_NAME,
    CAPACITY,
    ALLOCATABLE,
    ADDRESSES,
    PROVIDER_ID,
];

/// Kind-specific fields of service records.
pub const SERVICE_FIELDS: &[&str] = &[
    API_VERSION,
    NAMESPACE,
    LABELS,
    ANNOTATIONS,
    SELECTOR,
    TYPE,
    CLUSTER_IP,
    PORTS,
];

/// Kind-specific fields of config map records.
pub const CONFIG_MAP_FIELDS: &[&str] = &[API_VERSION, NAMESPACE, LABELS, ANNOTATIONS];

/// Kind-specific fields of namespace records.
pub const NAMESPACE_FIELDS: &[&str] = &[API_VERSION, LABELS, ANNOTATIONS, STATUS];

/// Kind-specific fields of persistent volume records.
pub const PERSISTENT_VOLUME_FIELDS: &[&str] = &[
    API_VERSION,
    NAMESPACE,
    LABELS,
    ANNOTATIONS,
    STATUS,
    STORAGE_CLASS_NAME,
    RECLAIM_POLICY,
    VOLUME_MODE,
    CAPACITY,
    FS_TYPE,
];

/// Kind-specific fields of persistent volume claim records.
pub const PERSISTENT_VOLUME_CLAIM_FIELDS: &[&str] = &[
    API_VERSION,
    NAMESPACE,
    LABELS,
    ANNOTATIONS,
    STATUS,
    STORAGE_REQUESTS,
    STORAGE_CLASS_NAME,
    VOLUME_NAME,
];
