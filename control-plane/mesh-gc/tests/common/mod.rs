#![allow(dead_code)]

use std::sync::Arc;

use mesh_gc::config::GcConfig;
use mesh_gc::config::types::MANAGED_BY_KEY;
use mesh_gc::crd::ManagedInstance;
use mesh_gc::gc::CniPruner;
use mesh_gc::store::memory::{MemoryStore, object};
use mesh_gc::store::{ObjectKey, ResourceKind};

pub const OPERATOR_NS: &str = "openshift-operators";
pub const MAISTRA: &[(&str, &str)] =
    &[(MANAGED_BY_KEY, "maistra-istio-operator")];
pub const SAIL: &[(&str, &str)] = &[(MANAGED_BY_KEY, "sail-operator")];

type Labels = &'static [(&'static str, &'static str)];

// Seeded object plus the labels it carries
#[derive(Clone, Debug)]
pub struct Obj {
    pub kind: ResourceKind,
    pub key: ObjectKey,
    pub labels: Labels,
}

pub fn cluster_role(name: &str, labels: Labels) -> Obj {
    cluster_scoped(ResourceKind::ClusterRole, name, labels)
}

pub fn cluster_role_binding(name: &str, labels: Labels) -> Obj {
    cluster_scoped(ResourceKind::ClusterRoleBinding, name, labels)
}

pub fn config_map(name: &str, labels: Labels) -> Obj {
    in_operator_ns(ResourceKind::ConfigMap, name, labels)
}

pub fn daemon_set(name: &str, labels: Labels) -> Obj {
    in_operator_ns(ResourceKind::DaemonSet, name, labels)
}

pub fn service_account(name: &str, labels: Labels) -> Obj {
    in_operator_ns(ResourceKind::ServiceAccount, name, labels)
}

fn cluster_scoped(kind: ResourceKind, name: &str, labels: Labels) -> Obj {
    Obj {
        kind,
        key: ObjectKey::cluster(name),
        labels,
    }
}

fn in_operator_ns(kind: ResourceKind, name: &str, labels: Labels) -> Obj {
    Obj {
        kind,
        key: ObjectKey::namespaced(OPERATOR_NS, name),
        labels,
    }
}

pub async fn seed(store: &MemoryStore, objs: &[Obj]) {
    for o in objs {
        store.insert(o.kind, object(o.kind, &o.key, o.labels)).await;
    }
}

pub fn smcp(uid: &str, ns: &str, version: &str, deleting: bool) -> ManagedInstance {
    ManagedInstance {
        uid: uid.into(),
        namespace: ns.into(),
        name: "my-smcp".into(),
        version: version.into(),
        marked_for_deletion: deleting,
    }
}

pub fn pruner(store: &MemoryStore) -> CniPruner {
    CniPruner::new(
        Arc::new(store.clone()),
        &GcConfig::for_namespace(OPERATOR_NS),
    )
}
