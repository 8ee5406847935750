use std::time::Duration;

use envconfig::Envconfig;

use crate::retry::RetryPolicy;

/// Label key every object created by the operator carries.
pub const MANAGED_BY_KEY: &str = "app.kubernetes.io/managed-by";

#[derive(Envconfig, Clone, Debug)]
pub struct GcConfig {
    /// Namespace the operator is installed in; namespaced shared objects
    /// live here rather than in the control plane's namespace.
    /// Env: MESH_GC_OPERATOR_NAMESPACE
    #[envconfig(
        from = "MESH_GC_OPERATOR_NAMESPACE",
        default = "openshift-operators"
    )]
    pub operator_namespace: String,

    /// Value expected under `app.kubernetes.io/managed-by`.
    /// Env: MESH_GC_MANAGED_BY
    #[envconfig(from = "MESH_GC_MANAGED_BY", default = "maistra-istio-operator")]
    pub managed_by: String,

    #[envconfig(from = "HTTP_PORT", default = "8080")]
    pub http_port: u16,

    #[envconfig(from = "MESH_GC_CNI_ENABLED", default = "true")]
    pub cni_enabled: bool,

    /// Extra image pull secret for the CNI daemon when Multus is in use.
    /// Env: ISTIO_CNI_IMAGE_PULL_SECRET
    #[envconfig(from = "ISTIO_CNI_IMAGE_PULL_SECRET")]
    pub cni_image_pull_secret: Option<String>,

    /// Requeue interval for successfully reconciled control planes.
    /// Env: MESH_GC_REQUEUE_SECS
    #[envconfig(from = "MESH_GC_REQUEUE_SECS", default = "60")]
    pub requeue_secs: u64,

    #[envconfig(nested)]
    pub retry: RetryConfig,
}

/// Conflict retry settings. Defaults follow client-go's `DefaultRetry`.
#[derive(Envconfig, Clone, Debug)]
pub struct RetryConfig {
    #[envconfig(from = "MESH_GC_CONFLICT_RETRY_STEPS", default = "5")]
    pub steps: u32,
    #[envconfig(from = "MESH_GC_CONFLICT_RETRY_BASE_MS", default = "10")]
    pub base_ms: u64,
    #[envconfig(from = "MESH_GC_CONFLICT_RETRY_FACTOR", default = "1.0")]
    pub factor: f64,
    #[envconfig(from = "MESH_GC_CONFLICT_RETRY_JITTER", default = "0.1")]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            base_ms: 10,
            factor: 1.0,
            jitter: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            steps: self.steps.max(1),
            duration: Duration::from_millis(self.base_ms),
            factor: self.factor.max(1.0),
            jitter: self.jitter.max(0.0),
        }
    }
}

impl GcConfig {
    /// Configuration for a given install namespace with every other field
    /// at its default.
    pub fn for_namespace(ns: &str) -> Self {
        Self {
            operator_namespace: ns.to_string(),
            managed_by: "maistra-istio-operator".into(),
            http_port: 8080,
            cni_enabled: true,
            cni_image_pull_secret: None,
            requeue_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_from_empty_env() {
        let cfg = GcConfig::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(cfg.operator_namespace, "openshift-operators");
        assert_eq!(cfg.managed_by, "maistra-istio-operator");
        assert_eq!(cfg.http_port, 8080);
        assert!(cfg.cni_enabled);
        assert_eq!(cfg.cni_image_pull_secret, None);
        assert_eq!(cfg.retry.steps, 5);
    }

    #[test]
    fn env_overrides_are_honored() {
        let env = HashMap::from([
            ("MESH_GC_OPERATOR_NAMESPACE".to_string(), "mesh-ops".to_string()),
            ("MESH_GC_CNI_ENABLED".to_string(), "false".to_string()),
            ("MESH_GC_CONFLICT_RETRY_STEPS".to_string(), "3".to_string()),
        ]);
        let cfg = GcConfig::init_from_hashmap(&env).unwrap();
        assert_eq!(cfg.operator_namespace, "mesh-ops");
        assert!(!cfg.cni_enabled);
        assert_eq!(cfg.retry.policy().steps, 3);
    }

    #[test]
    fn retry_policy_clamps_nonsense_values() {
        let policy = RetryConfig {
            steps: 0,
            base_ms: 5,
            factor: 0.5,
            jitter: -1.0,
        }
        .policy();
        assert_eq!(policy.steps, 1);
        assert_eq!(policy.factor, 1.0);
        assert_eq!(policy.jitter, 0.0);
    }
}
