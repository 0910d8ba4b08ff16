//! Shared server state

use std::sync::Arc;
use std::time::Duration;

use crate::core::Config;
use crate::fulfillment::FulfillmentManager;
use crate::notify::{LogDispatcher, NotificationDispatcher};
use crate::riders::AssignmentPolicy;
use shared::order::{CommandError, CommandErrorCode, CommandResponse, FulfillmentCommand};

/// State shared by every handler and background task
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub manager: FulfillmentManager,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ServerState {
    /// Open storage and wire up the engine
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let policy = AssignmentPolicy {
            max_active_deliveries: config.max_active_deliveries,
        };
        let manager = FulfillmentManager::new(config.db_path(), policy)
            .map_err(|e| anyhow::anyhow!("failed to open fulfillment storage: {e}"))?;

        tracing::info!(
            db_path = %config.db_path().display(),
            epoch = manager.epoch(),
            "Server state initialized"
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            manager,
            dispatcher: Arc::new(LogDispatcher),
        })
    }

    /// Replace the notification backend (used by deployments with a
    /// real delivery service, and by tests)
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Execute a command off the async runtime with a bounded timeout.
    ///
    /// Commands are synchronous (redb single-writer); running them on
    /// the blocking pool keeps handlers responsive, and the timeout
    /// turns a wedged writer into SYSTEM_BUSY instead of a hang.
    pub async fn execute(&self, cmd: FulfillmentCommand) -> CommandResponse {
        let command_id = cmd.command_id.clone();
        let manager = self.manager.clone();
        let timeout = Duration::from_millis(self.config.command_timeout_ms);

        let task = tokio::task::spawn_blocking(move || manager.execute_command(cmd));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(response)) => response,
            Ok(Err(join_err)) => {
                tracing::error!(command_id = %command_id, error = %join_err, "Command task failed");
                CommandResponse::error(
                    command_id,
                    CommandError::new(CommandErrorCode::InternalError, "command execution failed"),
                )
            }
            Err(_) => {
                tracing::warn!(command_id = %command_id, timeout_ms = timeout.as_millis() as u64, "Command timed out");
                CommandResponse::error(
                    command_id,
                    CommandError::new(
                        CommandErrorCode::SystemBusy,
                        "command timed out, please retry",
                    ),
                )
            }
        }
    }
}
