use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use nsone_client::ClientConfig;
use nsone_client::NsoneClient;
use tokio::sync::oneshot;
use tracing::error;
use tracing::info;

use crate::api::ApiServer;
use crate::collector::Orchestrator;
use crate::collector::TaskPool;
use crate::config::Cli;
use crate::config::ExportSettings;
use crate::config::PoolSettings;

/// Application core structure with explicit dependencies
pub struct Application {
    orchestrator: Arc<Orchestrator>,
    pool: Arc<TaskPool>,
    listen_address: String,
    telemetry_path: String,
}

impl Application {
    /// Validate the configuration and wire the collaborators.
    ///
    /// Creates the blocking HTTP client, so it must not be called from within
    /// an async runtime.
    pub fn build(cli: &Cli) -> Result<Self> {
        cli.validate().map_err(|report| anyhow!("{report:?}"))?;

        let pool_settings = PoolSettings::from(cli);
        let pool = Arc::new(
            TaskPool::new(pool_settings.workers, pool_settings.queue_capacity)
                .context("Failed to start worker pool")?,
        );

        let client = NsoneClient::new(&ClientConfig::from(cli)).map_err(|report| anyhow!("{report:?}"))?;
        let orchestrator = Orchestrator::new(Arc::new(client), Arc::clone(&pool), ExportSettings::from(cli))
            .map_err(|report| anyhow!("{report:?}"))?;

        info!(
            workers = pool_settings.workers,
            queue_capacity = pool_settings.queue_capacity,
            "Application wired"
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            pool,
            listen_address: cli.listen_address.clone(),
            telemetry_path: cli.telemetry_path.clone(),
        })
    }

    /// Serve until SIGTERM or SIGINT
    pub async fn run(&self) -> Result<()> {
        let server = ApiServer::new(
            Arc::clone(&self.orchestrator),
            self.listen_address.clone(),
            self.telemetry_path.clone(),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let signals = tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Failed to listen for shutdown signals: {e}");
                // keep the sender alive, the server keeps running
                std::future::pending::<()>().await;
            }
            let _ = shutdown_tx.send(());
        });

        let result = server.run(shutdown_rx).await;
        signals.abort();
        result.map_err(|report| anyhow!("{report:?}"))
    }

    /// Drain in-flight collection tasks and stop the workers
    pub fn shutdown(&self) {
        info!("Shutting down application...");
        self.pool.shutdown();
        info!("Application shutdown completed");
    }
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::signal;
        use tokio::signal::unix::SignalKind;

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, initiating graceful shutdown");
    }
    Ok(())
}
