pub mod control_plane;

pub use control_plane::{
    ControlPlaneSpec, ControlPlaneStatus, ServiceMeshControlPlane,
};

use kube::{Resource, ResourceExt};

/// Name of the CustomResourceDefinition backing [`ServiceMeshControlPlane`].
pub const CONTROL_PLANE_CRD_NAME: &str = "servicemeshcontrolplanes.maistra.io";

/// The parts of a live control plane the garbage collector looks at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedInstance {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub marked_for_deletion: bool,
}

impl From<&ServiceMeshControlPlane> for ManagedInstance {
    fn from(smcp: &ServiceMeshControlPlane) -> Self {
        Self {
            uid: smcp.uid().unwrap_or_default(),
            namespace: smcp.namespace().unwrap_or_default(),
            name: smcp.name_any(),
            version: smcp.spec.version.clone().unwrap_or_default(),
            marked_for_deletion: smcp.meta().deletion_timestamp.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::core::CustomResourceExt;

    #[test]
    fn crd_name_matches_constant() {
        assert_eq!(ServiceMeshControlPlane::crd_name(), CONTROL_PLANE_CRD_NAME);
    }

    #[test]
    fn instance_reflects_deletion_marker() {
        let mut smcp = ServiceMeshControlPlane::new(
            "basic",
            ControlPlaneSpec {
                version: Some("v2.6".into()),
                ..Default::default()
            },
        );
        smcp.metadata.namespace = Some("istio-system".into());
        smcp.metadata.uid = Some("123".into());

        let live = ManagedInstance::from(&smcp);
        assert_eq!(live.uid, "123");
        assert_eq!(live.namespace, "istio-system");
        assert_eq!(live.version, "v2.6");
        assert!(!live.marked_for_deletion);

        smcp.metadata.deletion_timestamp =
            Some(Time(k8s_openapi::chrono::Utc::now()));
        assert!(ManagedInstance::from(&smcp).marked_for_deletion);
    }
}
