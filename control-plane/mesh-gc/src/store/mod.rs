//! Access to cluster objects.
//!
//! The garbage collector only needs a handful of verbs (list the managed
//! instances, get, delete and replace a single object). They are grouped
//! behind [`ObjectStore`] so the pruning and cleanup logic can run against
//! the API server ([`cluster::KubeStore`]) or an in-process map
//! ([`memory::MemoryStore`]).

pub mod cluster;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::{ApiResource, DynamicObject};

use crate::crd::ManagedInstance;
use crate::error::Error;

/// Object kinds touched by the garbage collector and the startup cleanup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    ClusterRole,
    ClusterRoleBinding,
    ConfigMap,
    DaemonSet,
    ServiceAccount,
    Service,
    Secret,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
    CustomResourceDefinition,
}

impl ResourceKind {
    pub fn api_resource(&self) -> ApiResource {
        match self {
            ResourceKind::ClusterRole => ApiResource::erase::<ClusterRole>(&()),
            ResourceKind::ClusterRoleBinding => {
                ApiResource::erase::<ClusterRoleBinding>(&())
            }
            ResourceKind::ConfigMap => ApiResource::erase::<ConfigMap>(&()),
            ResourceKind::DaemonSet => ApiResource::erase::<DaemonSet>(&()),
            ResourceKind::ServiceAccount => {
                ApiResource::erase::<ServiceAccount>(&())
            }
            ResourceKind::Service => ApiResource::erase::<Service>(&()),
            ResourceKind::Secret => ApiResource::erase::<Secret>(&()),
            ResourceKind::ValidatingWebhookConfiguration => {
                ApiResource::erase::<ValidatingWebhookConfiguration>(&())
            }
            ResourceKind::MutatingWebhookConfiguration => {
                ApiResource::erase::<MutatingWebhookConfiguration>(&())
            }
            ResourceKind::CustomResourceDefinition => {
                ApiResource::erase::<CustomResourceDefinition>(&())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ClusterRole => "ClusterRole",
            ResourceKind::ClusterRoleBinding => "ClusterRoleBinding",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::Service => "Service",
            ResourceKind::Secret => "Secret",
            ResourceKind::ValidatingWebhookConfiguration => {
                "ValidatingWebhookConfiguration"
            }
            ResourceKind::MutatingWebhookConfiguration => {
                "MutatingWebhookConfiguration"
            }
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of an object, qualified by namespace for namespaced kinds.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    pub fn namespaced(ns: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(ns.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Cluster verbs used by the pruner and the startup cleanup.
///
/// `get`, `delete` and `update` report a missing object as
/// [`Error::NotFound`]; `update` reports a stale `resourceVersion` as
/// [`Error::Conflict`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every managed control plane across all namespaces.
    async fn list_instances(&self) -> Result<Vec<ManagedInstance>, Error>;

    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<DynamicObject, Error>;

    async fn delete(&self, kind: ResourceKind, key: &ObjectKey)
    -> Result<(), Error>;

    /// Replace `obj`, guarded by the `resourceVersion` it was read with.
    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, Error>;
}

/// Key of a fetched object, as reported by its own metadata.
pub fn key_of(obj: &DynamicObject) -> Option<ObjectKey> {
    let name = obj.metadata.name.clone()?;
    Some(ObjectKey {
        namespace: obj.metadata.namespace.clone(),
        name,
    })
}
