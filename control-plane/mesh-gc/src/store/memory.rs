//! In-process [`ObjectStore`] with optimistic concurrency and fault
//! injection. Clones share the same state, so several pruners or cleanup
//! tasks can be pointed at one store to stand in for operator replicas.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use kube::core::DynamicObject;
use tokio::sync::RwLock;

use super::{ObjectKey, ObjectStore, ResourceKind, key_of};
use crate::crd::ManagedInstance;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    List,
    Get,
    Delete,
    Update,
}

#[derive(Clone, Debug)]
pub enum Fault {
    /// The call fails as if the API server could not be reached.
    Unavailable(String),
    /// Another writer bumps the object's `resourceVersion` first.
    Conflict,
    /// Another deleter removes the object first.
    ConcurrentDelete,
}

struct Injected {
    verb: Verb,
    kind: Option<ResourceKind>,
    fault: Fault,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(ResourceKind, ObjectKey), DynamicObject>,
    instances: Vec<ManagedInstance>,
    faults: VecDeque<Injected>,
    deleted: Vec<(ResourceKind, ObjectKey)>,
    updates: usize,
    next_version: u64,
}

impl State {
    fn take_fault(
        &mut self,
        verb: Verb,
        kind: Option<ResourceKind>,
    ) -> Option<Fault> {
        let pos = self.faults.iter().position(|f| {
            f.verb == verb && (f.kind.is_none() || f.kind == kind)
        })?;
        self.faults.remove(pos).map(|f| f.fault)
    }

    fn bump(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obj` under the key derived from its own metadata.
    pub async fn insert(&self, kind: ResourceKind, obj: DynamicObject) {
        let key = key_of(&obj).unwrap_or_else(|| ObjectKey::cluster(""));
        self.insert_at(kind, key, obj).await;
    }

    /// Store `obj` under `key` regardless of what its metadata says.
    pub async fn insert_at(
        &self,
        kind: ResourceKind,
        key: ObjectKey,
        mut obj: DynamicObject,
    ) {
        let mut st = self.state.write().await;
        obj.metadata.resource_version = Some(st.bump());
        st.objects.insert((kind, key), obj);
    }

    pub async fn add_instance(&self, instance: ManagedInstance) {
        self.state.write().await.instances.push(instance);
    }

    /// Queue a one-shot fault for the next matching call. `kind == None`
    /// matches any kind.
    pub async fn inject(
        &self,
        verb: Verb,
        kind: Option<ResourceKind>,
        fault: Fault,
    ) {
        self.state.write().await.faults.push_back(Injected {
            verb,
            kind,
            fault,
        });
    }

    pub async fn contains(&self, kind: ResourceKind, key: &ObjectKey) -> bool {
        self.state
            .read()
            .await
            .objects
            .contains_key(&(kind, key.clone()))
    }

    pub async fn fetch(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Option<DynamicObject> {
        self.state
            .read()
            .await
            .objects
            .get(&(kind, key.clone()))
            .cloned()
    }

    /// Objects removed through [`ObjectStore::delete`], in call order.
    pub async fn deleted(&self) -> Vec<(ResourceKind, ObjectKey)> {
        self.state.read().await.deleted.clone()
    }

    /// Number of successful [`ObjectStore::update`] calls.
    pub async fn update_count(&self) -> usize {
        self.state.read().await.updates
    }
}

fn fault_error(
    fault: Fault,
    kind: ResourceKind,
    key: &ObjectKey,
) -> Error {
    match fault {
        Fault::Unavailable(msg) => Error::Store(msg),
        Fault::Conflict => Error::Conflict {
            kind,
            key: key.clone(),
        },
        Fault::ConcurrentDelete => Error::NotFound {
            kind,
            key: key.clone(),
        },
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_instances(&self) -> Result<Vec<ManagedInstance>, Error> {
        let mut st = self.state.write().await;
        if let Some(fault) = st.take_fault(Verb::List, None) {
            return Err(match fault {
                Fault::Unavailable(msg) => Error::Store(msg),
                other => Error::Store(format!("unexpected list fault {other:?}")),
            });
        }
        Ok(st.instances.clone())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<DynamicObject, Error> {
        let mut st = self.state.write().await;
        if let Some(fault) = st.take_fault(Verb::Get, Some(kind)) {
            return Err(fault_error(fault, kind, key));
        }
        st.objects
            .get(&(kind, key.clone()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                kind,
                key: key.clone(),
            })
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        key: &ObjectKey,
    ) -> Result<(), Error> {
        let mut st = self.state.write().await;
        let id = (kind, key.clone());
        match st.take_fault(Verb::Delete, Some(kind)) {
            Some(Fault::ConcurrentDelete) => {
                st.objects.remove(&id);
                return Err(fault_error(Fault::ConcurrentDelete, kind, key));
            }
            Some(fault) => return Err(fault_error(fault, kind, key)),
            None => {}
        }
        if st.objects.remove(&id).is_none() {
            return Err(Error::NotFound {
                kind,
                key: key.clone(),
            });
        }
        st.deleted.push(id);
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, Error> {
        let key = key_of(obj).ok_or_else(|| Error::MissingMetadata {
            kind,
            key: ObjectKey::cluster(""),
        })?;
        let id = (kind, key.clone());
        let mut st = self.state.write().await;
        match st.take_fault(Verb::Update, Some(kind)) {
            Some(Fault::Conflict) => {
                let rv = st.bump();
                if let Some(current) = st.objects.get_mut(&id) {
                    current.metadata.resource_version = Some(rv);
                }
                return Err(fault_error(Fault::Conflict, kind, &key));
            }
            Some(fault) => return Err(fault_error(fault, kind, &key)),
            None => {}
        }
        let stored_version = match st.objects.get(&id) {
            Some(current) => current.metadata.resource_version.clone(),
            None => return Err(Error::NotFound { kind, key }),
        };
        if obj.metadata.resource_version.is_some()
            && obj.metadata.resource_version != stored_version
        {
            return Err(Error::Conflict { kind, key });
        }
        let mut next = obj.clone();
        next.metadata.resource_version = Some(st.bump());
        st.objects.insert(id, next.clone());
        st.updates += 1;
        Ok(next)
    }
}

/// Build a bare object of `kind` at `key` carrying `labels`.
pub fn object(
    kind: ResourceKind,
    key: &ObjectKey,
    labels: &[(&str, &str)],
) -> DynamicObject {
    let mut obj = DynamicObject::new(&key.name, &kind.api_resource());
    obj.metadata.namespace = key.namespace.clone();
    if !labels.is_empty() {
        obj.metadata.labels = Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }
    obj
}
