use crate::store::ResourceKind::{
    ClusterRole, ClusterRoleBinding, ConfigMap, DaemonSet, ServiceAccount,
};
use crate::store::{ObjectKey, ResourceKind};
use crate::versions::Version::{self, *};
use Scope::{Cluster, Namespaced};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Cluster,
    Namespaced,
}

/// An infrastructure object shared by every control plane of the listed
/// releases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub name: &'static str,
    pub required_by: &'static [Version],
}

impl ResourceDescriptor {
    const fn new(
        kind: ResourceKind,
        scope: Scope,
        name: &'static str,
        required_by: &'static [Version],
    ) -> Self {
        Self {
            kind,
            scope,
            name,
            required_by,
        }
    }

    /// Key of the object; namespaced objects live in the operator's own
    /// namespace, never in the control plane's.
    pub fn key(&self, operator_namespace: &str) -> ObjectKey {
        match self.scope {
            Scope::Cluster => ObjectKey::cluster(self.name),
            Scope::Namespaced => {
                ObjectKey::namespaced(operator_namespace, self.name)
            }
        }
    }
}

const ISTIO_CNI: &[Version] = &[V2_0, V2_1, V2_2, V2_3];
const OSSM_CNI: &[Version] = &[V2_4, V2_5, V2_6];
const LEGACY_CONFIG: &[Version] = &[V2_0, V2_1, V2_2];

/// Objects of the CNI daemon, keyed by the releases that deploy them.
pub static CNI_RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor::new(ClusterRole, Cluster, "istio-cni", ISTIO_CNI),
    ResourceDescriptor::new(ClusterRole, Cluster, "ossm-cni", OSSM_CNI),
    ResourceDescriptor::new(ClusterRoleBinding, Cluster, "istio-cni", ISTIO_CNI),
    ResourceDescriptor::new(ClusterRoleBinding, Cluster, "ossm-cni", OSSM_CNI),
    ResourceDescriptor::new(ConfigMap, Namespaced, "istio-cni-config", LEGACY_CONFIG),
    ResourceDescriptor::new(ConfigMap, Namespaced, "istio-cni-config-v2-3", &[V2_3]),
    ResourceDescriptor::new(ConfigMap, Namespaced, "ossm-cni-config-v2-4", &[V2_4]),
    ResourceDescriptor::new(ConfigMap, Namespaced, "ossm-cni-config-v2-5", &[V2_5]),
    ResourceDescriptor::new(ConfigMap, Namespaced, "ossm-cni-config-v2-6", &[V2_6]),
    ResourceDescriptor::new(DaemonSet, Namespaced, "istio-cni-node", LEGACY_CONFIG),
    ResourceDescriptor::new(DaemonSet, Namespaced, "istio-cni-node-v2-3", &[V2_3]),
    ResourceDescriptor::new(DaemonSet, Namespaced, "istio-cni-node-v2-4", &[V2_4]),
    ResourceDescriptor::new(DaemonSet, Namespaced, "istio-cni-node-v2-5", &[V2_5]),
    ResourceDescriptor::new(DaemonSet, Namespaced, "istio-cni-node-v2-6", &[V2_6]),
    ResourceDescriptor::new(ServiceAccount, Namespaced, "istio-cni", ISTIO_CNI),
    ResourceDescriptor::new(ServiceAccount, Namespaced, "ossm-cni", OSSM_CNI),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn descriptors_are_unique() {
        let mut seen = HashSet::new();
        for d in CNI_RESOURCES {
            assert!(
                seen.insert((d.kind, d.scope, d.name)),
                "duplicate catalog entry {} {}",
                d.kind,
                d.name
            );
        }
    }

    #[test]
    fn every_release_has_a_full_cni_set() {
        let kinds = [
            ResourceKind::ClusterRole,
            ResourceKind::ClusterRoleBinding,
            ResourceKind::ConfigMap,
            ResourceKind::DaemonSet,
            ResourceKind::ServiceAccount,
        ];
        for v in Version::ALL {
            for kind in kinds {
                let n = CNI_RESOURCES
                    .iter()
                    .filter(|d| d.kind == kind && d.required_by.contains(v))
                    .count();
                assert_eq!(n, 1, "{v} needs exactly one {kind}");
            }
        }
    }

    #[test]
    fn namespaced_keys_use_operator_namespace() {
        let cm = CNI_RESOURCES
            .iter()
            .find(|d| d.name == "ossm-cni-config-v2-6")
            .unwrap();
        assert_eq!(
            cm.key("openshift-operators"),
            ObjectKey::namespaced("openshift-operators", "ossm-cni-config-v2-6")
        );
        let role = &CNI_RESOURCES[1];
        assert_eq!(role.key("openshift-operators"), ObjectKey::cluster("ossm-cni"));
    }
}
