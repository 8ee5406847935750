use tracing::info;

use crate::error::Error;
use crate::store::{ObjectKey, ObjectStore, ResourceKind};

/// Delete `key`, treating an already-missing object as done. Returns
/// whether this call removed it.
pub async fn delete_ignoring_not_found(
    store: &dyn ObjectStore,
    kind: ResourceKind,
    key: &ObjectKey,
) -> Result<bool, Error> {
    match store.delete(kind, key).await {
        Ok(()) => {
            info!(%kind, name = %key.name, namespace = ?key.namespace, "deleted object");
            Ok(true)
        }
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Fetch-then-delete without an ownership check, for objects known to be
/// obsolete.
pub async fn remove_if_present(
    store: &dyn ObjectStore,
    kind: ResourceKind,
    key: &ObjectKey,
) -> Result<bool, Error> {
    match store.get(kind, key).await {
        Ok(_) => delete_ignoring_not_found(store, kind, key).await,
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
