use std::collections::BTreeSet;

use tracing::debug;

use crate::crd::ManagedInstance;
use crate::error::Error;
use crate::store::ObjectStore;

/// Release versions still required by some control plane.
///
/// The instance that triggered the pass does not count once it is marked
/// for deletion, so it cannot keep its own exclusive objects alive. Any
/// other instance counts whatever its deletion state.
pub fn active_versions(
    instances: &[ManagedInstance],
    trigger: &ManagedInstance,
) -> BTreeSet<String> {
    instances
        .iter()
        .filter(|i| i.uid != trigger.uid || !i.marked_for_deletion)
        .map(|i| i.version.clone())
        .collect()
}

/// List every control plane and derive the active version set.
pub async fn collect(
    store: &dyn ObjectStore,
    trigger: &ManagedInstance,
) -> Result<BTreeSet<String>, Error> {
    let instances = store.list_instances().await?;
    let active = active_versions(&instances, trigger);
    debug!(instances = instances.len(), ?active, "computed active versions");
    Ok(active)
}
