use tracing::{info, warn};

use crate::crd::CONTROL_PLANE_CRD_NAME;
use crate::error::Error;
use crate::retry::{RetryPolicy, retry_on_conflict};
use crate::store::{ObjectKey, ObjectStore, ResourceKind};

/// Makes the service CA operator inject its bundle into the CRD. Left on,
/// it fights with the installer over the CRD's CA bundle.
pub const INJECT_CA_BUNDLE_KEY: &str = "service.beta.openshift.io/inject-cabundle";

const STALE: &str = "true";
const CORRECTED: &str = "false";

/// Flip the CA bundle injection annotation on the control plane CRD from
/// `"true"` to `"false"`. Returns whether this call changed it.
///
/// The read-check-write sequence is retried as a whole on conflicts.
pub async fn disable_crd_bundle_injection(
    store: &dyn ObjectStore,
    policy: &RetryPolicy,
) -> Result<bool, Error> {
    let key = &ObjectKey::cluster(CONTROL_PLANE_CRD_NAME);
    let kind = ResourceKind::CustomResourceDefinition;

    retry_on_conflict(policy, move || async move {
        let mut crd = match store.get(kind, key).await {
            Ok(crd) => crd,
            Err(e) if e.is_not_found() => {
                warn!(crd = %key, "CRD not found; nothing to correct");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let annotations = match crd.metadata.annotations.as_mut() {
            Some(a) if a.get(INJECT_CA_BUNDLE_KEY).map(String::as_str) == Some(STALE) => a,
            _ => return Ok(false),
        };
        annotations.insert(INJECT_CA_BUNDLE_KEY.to_string(), CORRECTED.to_string());
        store.update(kind, &crd).await?;
        info!(
            annotation = INJECT_CA_BUNDLE_KEY,
            crd = %key,
            "updated CRD annotation value from true to false"
        );
        Ok(true)
    })
    .await
}
