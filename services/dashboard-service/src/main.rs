mod config;
mod routes;

use nl_chain_evm::{Erc721Contract, HttpMetadataFetcher, JsonRpcClient, RpcWalletProvider};
use nl_dashboard_core::{Dashboard, LoaderConfig, RandomPricing};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::routes::{AppState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env()?;
    let evm = &config.evm;
    info!(
        rpc = %evm.rpc_url,
        contract = %evm.contract_address,
        index_base = ?config.index_base,
        mint_event = evm.mint_event_signature.as_deref().unwrap_or("off"),
        "dashboard configuration loaded"
    );

    let rpc = JsonRpcClient::new(&evm.rpc_url);
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(RpcWalletProvider::new(rpc.clone(), evm.poll_interval)),
        Arc::new(Erc721Contract::new(
            rpc,
            &evm.contract_address,
            evm.mint_event_signature.as_deref(),
            evm.poll_interval,
        )),
        Arc::new(HttpMetadataFetcher::new(&evm.ipfs_gateway)),
        Arc::new(RandomPricing),
        LoaderConfig {
            index_base: config.index_base,
            watch_mints: evm.mint_event_signature.is_some(),
        },
    ));
    dashboard.start().await;

    let app = router(AppState {
        dashboard: dashboard.clone(),
    });

    info!("dashboard-service listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.dispose();
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            warn!("failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
