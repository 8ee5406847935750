use kube::Client;
use kube::discovery::Discovery;
use tracing::{info, warn};

use super::GcConfig;

const MULTUS_GROUP: &str = "k8s.cni.cncf.io";
const MULTUS_RESOURCE: &str = "network-attachment-definitions";

/// CNI support of the cluster, resolved once at startup and handed to the
/// components that need it.
///
/// The collector itself only reads `enabled`. `use_multus` and
/// `image_pull_secrets` are the values the CNI daemon chart is rendered
/// with; they are resolved here so every consumer sees the same answer,
/// and logged at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CniConfig {
    /// Whether this installation deploys the CNI plugin at all.
    pub enabled: bool,
    /// Whether the plugin is chained through Multus. Chart value.
    pub use_multus: bool,
    /// Image pull secrets for the CNI daemon. Chart value.
    pub image_pull_secrets: Vec<String>,
}

impl CniConfig {
    /// Decide the CNI settings from the installation switch and the outcome
    /// of the Multus probe. A failed probe is treated as "no Multus".
    pub fn resolve(
        enabled: bool,
        multus_available: bool,
        pull_secret: Option<&str>,
    ) -> Self {
        if !enabled {
            return Self::default();
        }
        let mut cfg = Self {
            enabled: true,
            ..Default::default()
        };
        if multus_available {
            cfg.use_multus = true;
            if let Some(secret) = pull_secret.filter(|s| !s.is_empty()) {
                cfg.image_pull_secrets.push(secret.to_string());
            }
        }
        cfg
    }

    pub async fn detect(client: &Client, cfg: &GcConfig) -> Self {
        if !cfg.cni_enabled {
            info!("CNI is disabled for this installation");
            return Self::resolve(false, false, None);
        }
        let multus = match Discovery::new(client.clone())
            .filter(&[MULTUS_GROUP])
            .run()
            .await
        {
            Ok(discovery) => discovery.groups().any(|g| {
                g.recommended_resources()
                    .iter()
                    .any(|(ar, _)| ar.plural == MULTUS_RESOURCE)
            }),
            Err(e) => {
                warn!(error = %e, "multus discovery failed; assuming absent");
                false
            }
        };
        let resolved = Self::resolve(
            true,
            multus,
            cfg.cni_image_pull_secret.as_deref(),
        );
        info!(
            use_multus = resolved.use_multus,
            pull_secrets = ?resolved.image_pull_secrets,
            "CNI is enabled for this installation"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_ignores_everything_else() {
        let cfg = CniConfig::resolve(false, true, Some("pull"));
        assert_eq!(cfg, CniConfig::default());
    }

    #[test]
    fn multus_records_pull_secret() {
        let cfg = CniConfig::resolve(true, true, Some("registry-creds"));
        assert!(cfg.enabled);
        assert!(cfg.use_multus);
        assert_eq!(cfg.image_pull_secrets, vec!["registry-creds".to_string()]);
    }

    #[test]
    fn without_multus_secret_is_unused() {
        let cfg = CniConfig::resolve(true, false, Some("registry-creds"));
        assert!(cfg.enabled);
        assert!(!cfg.use_multus);
        assert!(cfg.image_pull_secrets.is_empty());
    }

    #[test]
    fn empty_secret_is_skipped() {
        let cfg = CniConfig::resolve(true, true, Some(""));
        assert!(cfg.image_pull_secrets.is_empty());
    }
}
