//! HTTP surface of a prediction service.

use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::error::Result;
use crate::services::PredictionService;

pub struct PredictionServer<S> {
    service: Arc<S>,
    addr: String,
}

impl<S: PredictionService> PredictionServer<S> {
    pub fn new(service: Arc<S>, addr: impl Into<String>) -> Self {
        Self {
            service,
            addr: addr.into(),
        }
    }

    /// Pre-load the model, then serve until Ctrl+C / SIGTERM.
    ///
    /// A model that fails to load is not fatal: `/health` reports it and the
    /// next `/predict` retries the load.
    pub async fn run(&self) -> Result<()> {
        match self.service.warm_up().await {
            Ok(()) => info!(service = S::NAME, "model loaded successfully"),
            Err(e) => {
                let health = self.service.health();
                warn!(
                    service = S::NAME,
                    error = %e,
                    model_path = ?health.model_path,
                    model_available = health.model_available,
                    "could not load model"
                );
            }
        }

        let app = create_router(Arc::clone(&self.service));
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!(
            "Starting {} prediction server on http://{}",
            S::NAME,
            listener.local_addr()?
        );
        info!("  POST /predict - Make prediction");
        info!("  GET /health - Check server status");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!(service = S::NAME, "server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
