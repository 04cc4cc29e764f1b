use gow_common::Result;
use gow_config::GatewayConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::SharedState;

pub struct GatewayServer {
    config: GatewayConfig,
    state: SharedState,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
