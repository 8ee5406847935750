//! One-shot cleanup run at process start, before leader election.
//!
//! Earlier operator releases managed the admission webhook objects
//! themselves. Those copies are removed here, and the control plane CRD is
//! kept from having a CA bundle injected into it. Every replica runs this
//! on its own: deletes tolerate objects that are already gone and the CRD
//! update is conflict-checked, so racing replicas converge.

pub mod crd_annotation;
pub mod webhooks;

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::config::GcConfig;
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::runtime::Runnable;
use crate::store::ObjectStore;
use crate::store::cluster::KubeStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CleanupState {
    NotStarted = 0,
    Running = 1,
    Done = 2,
    Failed = 3,
}

impl CleanupState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CleanupState::Running,
            2 => CleanupState::Done,
            3 => CleanupState::Failed,
            _ => CleanupState::NotStarted,
        }
    }
}

pub struct WebhookCleanup {
    store: Arc<dyn ObjectStore>,
    operator_namespace: String,
    retry: RetryPolicy,
    state: AtomicU8,
}

/// Cleanup runnable talking to the API server through `client`.
pub fn new_cleanup_runnable(client: Client, cfg: &GcConfig) -> WebhookCleanup {
    WebhookCleanup::new(Arc::new(KubeStore::new(client)), cfg)
}

impl WebhookCleanup {
    pub fn new(store: Arc<dyn ObjectStore>, cfg: &GcConfig) -> Self {
        Self {
            store,
            operator_namespace: cfg.operator_namespace.clone(),
            retry: cfg.retry.policy(),
            state: AtomicU8::new(CleanupState::NotStarted as u8),
        }
    }

    pub fn state(&self) -> CleanupState {
        CleanupState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once both cleanup steps have succeeded. Never reset.
    pub fn done(&self) -> bool {
        self.state() == CleanupState::Done
    }

    /// Move to `Running` from `NotStarted` or `Failed`.
    fn claim(&self) -> bool {
        [CleanupState::NotStarted, CleanupState::Failed]
            .into_iter()
            .any(|from| {
                self.state
                    .compare_exchange(
                        from as u8,
                        CleanupState::Running as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
            })
    }

    async fn run(&self) -> Result<(), Error> {
        let removed = webhooks::remove_obsolete_webhook_objects(
            self.store.as_ref(),
            &self.operator_namespace,
        )
        .await?;
        let corrected = crd_annotation::disable_crd_bundle_injection(
            self.store.as_ref(),
            &self.retry,
        )
        .await?;
        info!(removed, corrected, "webhook cleanup finished");
        Ok(())
    }
}

#[async_trait]
impl Runnable for WebhookCleanup {
    fn name(&self) -> &'static str {
        "webhook-cleanup"
    }

    /// Run the cleanup unless another call already finished it or is
    /// running it now. Only the call that claimed the run records its
    /// outcome, so `Done` is never overwritten.
    #[instrument(skip_all, fields(ns = %self.operator_namespace))]
    async fn start(&self, stop: CancellationToken) -> Result<(), Error> {
        if !self.claim() {
            debug!(state = ?self.state(), "webhook cleanup not claimed");
            return Ok(());
        }

        let res = tokio::select! {
            biased;
            _ = stop.cancelled() => Err(Error::Cancelled),
            res = self.run() => res,
        };

        let next = if res.is_ok() {
            CleanupState::Done
        } else {
            CleanupState::Failed
        };
        self.state.store(next as u8, Ordering::Release);
        res
    }

    /// The webhook server starts before this replica wins an election, and
    /// it must not come up while the old serving certificate objects exist.
    fn need_leader_election(&self) -> bool {
        false
    }
}
