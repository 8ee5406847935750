use crate::error::Error;
use crate::gc::executor::remove_if_present;
use crate::store::{ObjectKey, ObjectStore, ResourceKind};

pub const WEBHOOK_SERVICE_NAME: &str = "maistra-admission-controller";
pub const WEBHOOK_SECRET_NAME: &str = "maistra-operator-serving-cert";
pub const WEBHOOK_CONFIGMAP_NAME: &str = "maistra-operator-cabundle";

pub fn validating_webhook_config_name(ns: &str) -> String {
    format!("{ns}.servicemesh-resources.maistra.io")
}

pub fn mutating_webhook_config_name(ns: &str) -> String {
    format!("{ns}.servicemesh-resources.maistra.io")
}

/// Webhook objects earlier operator releases created themselves; they are
/// now shipped by the installer and the old copies must go.
pub fn obsolete_webhook_objects(ns: &str) -> Vec<(ResourceKind, ObjectKey)> {
    vec![
        (
            ResourceKind::Service,
            ObjectKey::namespaced(ns, WEBHOOK_SERVICE_NAME),
        ),
        (
            ResourceKind::Secret,
            ObjectKey::namespaced(ns, WEBHOOK_SECRET_NAME),
        ),
        (
            ResourceKind::ConfigMap,
            ObjectKey::namespaced(ns, WEBHOOK_CONFIGMAP_NAME),
        ),
        (
            ResourceKind::ValidatingWebhookConfiguration,
            ObjectKey::cluster(validating_webhook_config_name(ns)),
        ),
        (
            ResourceKind::MutatingWebhookConfiguration,
            ObjectKey::cluster(mutating_webhook_config_name(ns)),
        ),
    ]
}

/// Delete the obsolete webhook objects. No ownership check is made; each
/// removal is logged by the executor.
pub async fn remove_obsolete_webhook_objects(
    store: &dyn ObjectStore,
    ns: &str,
) -> Result<usize, Error> {
    let mut removed = 0;
    for (kind, key) in obsolete_webhook_objects(ns) {
        if remove_if_present(store, kind, &key).await? {
            removed += 1;
        }
    }
    Ok(removed)
}
