use async_trait::async_trait;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::core::DynamicObject;
use kube::Client;
use tracing::trace;

use super::{ObjectKey, ObjectStore, ResourceKind};
use crate::crd::{ManagedInstance, ServiceMeshControlPlane};
use crate::error::Error;

/// [`ObjectStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: ResourceKind, key: &ObjectKey) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match key.namespace.as_deref() {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn list_instances(&self) -> Result<Vec<ManagedInstance>, Error> {
        let api: Api<ServiceMeshControlPlane> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        trace!(count = list.items.len(), "listed control planes");
        Ok(list.items.iter().map(ManagedInstance::from).collect())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<DynamicObject, Error> {
        self.api(kind, key)
            .get(&key.name)
            .await
            .map_err(|e| Error::from_kube(e, kind, key))
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<(), Error> {
        self.api(kind, key)
            .delete(&key.name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| Error::from_kube(e, kind, key))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        let key = super::key_of(obj).ok_or_else(|| Error::MissingMetadata {
            kind,
            key: ObjectKey::cluster(""),
        })?;
        self.api(kind, &key)
            .replace(&key.name, &PostParams::default(), obj)
            .await
            .map_err(|e| Error::from_kube(e, kind, &key))
    }
}
