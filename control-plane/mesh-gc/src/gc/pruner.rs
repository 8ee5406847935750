use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::catalog::{CNI_RESOURCES, ResourceDescriptor};
use super::executor::delete_ignoring_not_found;
use super::ownership::{Attribution, ownership_matches};
use super::{census, resolver};
use crate::config::GcConfig;
use crate::crd::ManagedInstance;
use crate::error::Error;
use crate::store::{ObjectKey, ObjectStore, ResourceKind};

/// Outcome of one prune pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted: Vec<(ResourceKind, ObjectKey)>,
    /// Unused objects left alone because another controller owns them.
    pub foreign: Vec<(ResourceKind, ObjectKey)>,
    /// Unused objects that were already gone.
    pub absent: usize,
}

/// Removes CNI infrastructure no live control plane needs anymore.
#[derive(Clone)]
pub struct CniPruner {
    store: Arc<dyn ObjectStore>,
    catalog: &'static [ResourceDescriptor],
    operator_namespace: String,
    attribution: Attribution,
}

impl CniPruner {
    pub fn new(store: Arc<dyn ObjectStore>, cfg: &GcConfig) -> Self {
        Self {
            store,
            catalog: CNI_RESOURCES,
            operator_namespace: cfg.operator_namespace.clone(),
            attribution: Attribution::managed_by(cfg.managed_by.clone()),
        }
    }

    pub fn with_catalog(mut self, catalog: &'static [ResourceDescriptor]) -> Self {
        self.catalog = catalog;
        self
    }

    /// Delete every catalog object whose releases are no longer deployed,
    /// provided this operator created it.
    ///
    /// The first error other than not-found aborts the pass. Deletions made
    /// before it stay; the next reconcile picks up where this one stopped.
    #[instrument(
        skip_all,
        fields(
            smcp = %trigger.name,
            ns = %trigger.namespace,
            version = %trigger.version
        )
    )]
    pub async fn prune(
        &self,
        trigger: &ManagedInstance,
    ) -> Result<PruneReport, Error> {
        let active = census::collect(self.store.as_ref(), trigger).await?;
        let mut report = PruneReport::default();

        for desc in resolver::deletion_candidates(self.catalog, &active) {
            let key = desc.key(&self.operator_namespace);
            let obj = match self.store.get(desc.kind, &key).await {
                Ok(obj) => obj,
                Err(e) if e.is_not_found() => {
                    report.absent += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let actual = self.attribution.actual(&obj, desc.kind, &key)?;
            if !ownership_matches(&self.attribution, actual) {
                debug!(
                    kind = %desc.kind,
                    %key,
                    owner = ?actual,
                    "skipping object not managed by this operator"
                );
                report.foreign.push((desc.kind, key));
                continue;
            }

            if delete_ignoring_not_found(self.store.as_ref(), desc.kind, &key)
                .await?
            {
                report.deleted.push((desc.kind, key));
            } else {
                report.absent += 1;
            }
        }

        if !report.deleted.is_empty() {
            info!(
                deleted = report.deleted.len(),
                foreign = report.foreign.len(),
                "pruned unused CNI resources"
            );
        }
        Ok(report)
    }
}
