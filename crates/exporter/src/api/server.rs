use std::sync::Arc;

use error_stack::Report;
use poem::get;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::Endpoint;
use poem::EndpointExt;
use poem::Route;
use poem::Server;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use super::errors::ApiError;
use super::handlers::get_index;
use super::handlers::get_metrics;
use super::handlers::LandingPage;
use crate::collector::Orchestrator;

/// HTTP server exposing the collected metrics
pub struct ApiServer {
    orchestrator: Arc<Orchestrator>,
    listen_addr: String,
    telemetry_path: String,
}

impl ApiServer {
    pub fn new(orchestrator: Arc<Orchestrator>, listen_addr: String, telemetry_path: String) -> Self {
        Self {
            orchestrator,
            listen_addr,
            telemetry_path,
        }
    }

    /// Routes of the exposition server.
    pub fn routes(&self) -> impl Endpoint {
        Route::new()
            .at(&self.telemetry_path, get(get_metrics))
            .at("/", get(get_index))
            .data(Arc::clone(&self.orchestrator))
            .data(LandingPage::new(&self.telemetry_path))
            .with(Tracing)
    }

    /// Start the API server
    ///
    /// # Errors
    ///
    /// - [`ApiError::ServerError`] if the server fails to start or bind to the address
    pub async fn run(self, mut shutdown_rx: oneshot::Receiver<()>) -> Result<(), Report<ApiError>> {
        info!(
            "Listening on {} (scheme=HTTP, telemetry path={})",
            self.listen_addr, self.telemetry_path
        );

        let app = self.routes();
        let listener = TcpListener::bind(&self.listen_addr);
        let server = Server::new(listener);

        tokio::select! {
            result = server.run(app) => {
                match result {
                    Ok(()) => {
                        info!("API server stopped normally");
                        Ok(())
                    }
                    Err(e) => {
                        error!("API server failed: {e}");
                        Err(Report::new(ApiError::ServerError {
                            message: format!("Server failed: {e}"),
                        }))
                    }
                }
            }
            _ = &mut shutdown_rx => {
                info!("API server shutdown requested");
                Ok(())
            }
        }
    }
}
