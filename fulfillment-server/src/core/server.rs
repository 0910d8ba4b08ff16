//! HTTP server with background task lifecycle

use std::time::Duration;

use crate::api;
use crate::core::{BackgroundTasks, Config, ServerState, TaskKind};
use crate::fulfillment::FulfillmentSweeper;
use crate::notify::NotifyWorker;

/// The fulfillment HTTP server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Run until ctrl-c, then shut down background tasks gracefully
    pub async fn run(self) -> anyhow::Result<()> {
        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();

        // Notification worker (event broadcast listener)
        let notify = NotifyWorker::new(
            self.state.manager.clone(),
            self.state.dispatcher.clone(),
            shutdown.clone(),
        );
        tasks.spawn("notify_worker", TaskKind::Listener, notify.run());

        // Backlog retry + reservation expiry sweeper
        let sweeper = FulfillmentSweeper::new(
            self.state.manager.clone(),
            Duration::from_secs(self.config.sweep_interval_secs),
            Duration::from_secs(self.config.reservation_ttl_minutes * 60),
            shutdown.clone(),
        );
        tasks.spawn("fulfillment_sweeper", TaskKind::Periodic, sweeper.run());

        // HTTP surface
        let app = api::router(self.state.clone());
        let listener =
            tokio::net::TcpListener::bind(("0.0.0.0", self.config.http_port)).await?;
        tracing::info!(
            port = self.config.http_port,
            environment = %self.config.environment,
            "HTTP server listening"
        );

        let signal_token = shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutdown signal received");
                    }
                    _ = signal_token.cancelled() => {}
                }
            })
            .await?;

        tasks
            .shutdown(Duration::from_millis(self.config.shutdown_timeout_ms))
            .await;
        Ok(())
    }
}
