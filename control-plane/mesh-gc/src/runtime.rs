use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use kube::Client;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cleanup::new_cleanup_runnable;
use crate::config::{CniConfig, GcConfig};
use crate::controller::{ControllerContext, run_controller};
use crate::error::Error;
use crate::gc::CniPruner;
use crate::store::cluster::KubeStore;
use crate::web::run_http_server;

/// A long-lived or one-shot task started by the supervisor.
#[async_trait]
pub trait Runnable: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run until finished or until `stop` is cancelled.
    async fn start(&self, stop: CancellationToken) -> Result<(), Error>;

    /// Whether the task may only run on the elected leader.
    fn need_leader_election(&self) -> bool {
        true
    }
}

/// Compute the HTTP bind address based on config.
pub fn compute_http_addr(cfg: &GcConfig) -> SocketAddr {
    ([0, 0, 0, 0], cfg.http_port).into()
}

/// Spawn a runnable; its error is logged and returned through the handle.
pub fn spawn_runnable(
    runnable: Arc<dyn Runnable>,
    stop: CancellationToken,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move {
        let name = runnable.name();
        info!(
            runnable = name,
            leader_only = runnable.need_leader_election(),
            "starting"
        );
        runnable.start(stop).await.map_err(|e| {
            error!(runnable = name, error = %e, "runnable failed");
            anyhow::Error::new(e).context(name)
        })
    })
}

/// Start the cleanup task, the readiness server and the controller, and
/// wait until one of them exits. Any exit is treated as fatal.
pub async fn run_all(
    client: Client,
    cfg: Arc<GcConfig>,
    cni: Arc<CniConfig>,
) -> anyhow::Result<()> {
    let stop = CancellationToken::new();
    let cleanup = Arc::new(new_cleanup_runnable(client.clone(), &cfg));
    let mut cleanup_task = spawn_runnable(cleanup.clone(), stop.clone());

    let http_addr = compute_http_addr(&cfg);
    let http_stop = stop.clone();
    let ready = cleanup.clone();
    let mut http = tokio::spawn(async move {
        run_http_server(http_addr, ready, http_stop).await
    });

    let ctx = Arc::new(ControllerContext {
        client: client.clone(),
        pruner: CniPruner::new(Arc::new(KubeStore::new(client.clone())), &cfg),
        cfg: cfg.clone(),
        cni,
    });
    let controller_stop = stop.clone();
    let mut controller = tokio::spawn(async move {
        run_controller(client, ctx, controller_stop).await
    });

    let mut cleanup_running = true;
    let res = loop {
        tokio::select! {
            r = &mut cleanup_task, if cleanup_running => {
                cleanup_running = false;
                match r {
                    // Finishing is expected; keep serving.
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => break Err(e),
                    Err(e) => break Err(e.into()),
                }
            }
            r = &mut http => break flatten(r),
            r = &mut controller => break flatten(r),
        }
    };
    stop.cancel();
    res
}

fn flatten(
    r: Result<anyhow::Result<()>, tokio::task::JoinError>,
) -> anyhow::Result<()> {
    r?
}
