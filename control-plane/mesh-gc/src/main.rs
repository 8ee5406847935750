use std::sync::Arc;

use envconfig::Envconfig;
use kube::Client;
use mesh_gc::{
    config::{CniConfig, GcConfig},
    init_tracing, runtime,
};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let cfg = GcConfig::init_from_env()?;
    info!(?cfg, "Starting mesh-gc");

    let client = Client::try_default().await?;
    let cni = CniConfig::detect(&client, &cfg).await;
    runtime::run_all(client, Arc::new(cfg), Arc::new(cni)).await
}
