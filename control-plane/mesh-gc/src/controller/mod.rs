use std::sync::Arc;

use futures_util::StreamExt;
use kube::{
    Client, Resource, ResourceExt,
    api::{Api, Patch, PatchParams},
    runtime::{Controller, controller::Action, watcher::Config},
};
use serde_json::json;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::{CniConfig, GcConfig};
use crate::crd::{ManagedInstance, ServiceMeshControlPlane};
use crate::gc::CniPruner;

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("prune failed: {0}")]
    Prune(#[from] crate::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub struct ControllerContext {
    pub client: Client,
    pub pruner: CniPruner,
    pub cfg: Arc<GcConfig>,
    pub cni: Arc<CniConfig>,
}

pub const FINALIZER: &str = "maistra.io/cni-pruner";

pub async fn run_controller(
    client: Client,
    ctx: Arc<ControllerContext>,
    stop: CancellationToken,
) -> anyhow::Result<()> {
    let api: Api<ServiceMeshControlPlane> = Api::all(client);

    Controller::new(api, Config::default())
        .graceful_shutdown_on(async move { stop.cancelled().await })
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj_ref, action)) => {
                    info!(smcp = %obj_ref, "reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    Ok(())
}

fn has_finalizer(obj: &ServiceMeshControlPlane) -> bool {
    obj.finalizers().iter().any(|f| f == FINALIZER)
}

/// Whether a pass over a live (not deleting) control plane should prune.
/// Deleting control planes are always pruned.
pub fn prune_live_instances(cni: &CniConfig) -> bool {
    cni.enabled
}

#[instrument(skip_all, fields(ns = %obj.namespace().unwrap_or_default(), name = %obj.name_any()))]
async fn reconcile(
    obj: Arc<ServiceMeshControlPlane>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    let ns = obj.namespace().unwrap_or_else(|| "default".to_string());
    let name = obj.name_any();
    let api: Api<ServiceMeshControlPlane> =
        Api::namespaced(ctx.client.clone(), &ns);
    let instance = ManagedInstance::from(obj.as_ref());

    if obj.meta().deletion_timestamp.is_some() {
        let report = ctx.pruner.prune(&instance).await?;
        info!(%ns, %name, deleted = report.deleted.len(), "pruned on deletion");
        if has_finalizer(&obj) {
            let finals: Vec<_> = obj
                .finalizers()
                .iter()
                .filter(|f| *f != FINALIZER)
                .cloned()
                .collect();
            let patch = json!({"metadata": {"finalizers": finals}});
            api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await
                .map_err(into_internal)?;
        }
        return Ok(Action::await_change());
    }

    if !has_finalizer(&obj) {
        info!(%ns, %name, "adding finalizer");
        let mut finals = obj.finalizers().to_vec();
        finals.push(FINALIZER.to_string());
        let patch = json!({"metadata": {"finalizers": finals}});
        api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(into_internal)?;
    }

    // Upgrades leave the previous release's objects behind.
    if prune_live_instances(&ctx.cni) {
        ctx.pruner.prune(&instance).await?;
    }

    Ok(Action::requeue(Duration::from_secs(ctx.cfg.requeue_secs)))
}

fn into_internal<E: std::fmt::Display>(e: E) -> ReconcileErr {
    ReconcileErr::Internal(e.to_string())
}

fn error_policy(
    _obj: Arc<ServiceMeshControlPlane>,
    error: &ReconcileErr,
    _ctx: Arc<ControllerContext>,
) -> Action {
    error!(%error, "reconcile failed; requeueing");
    Action::requeue(Duration::from_secs(15))
}
