//! Background task management
//!
//! Central registry for background task registration, startup and
//! shutdown.
//!
//! # Task kinds
//!
//! - [`TaskKind::Worker`] - long-lived background worker
//! - [`TaskKind::Listener`] - event listener
//! - [`TaskKind::Periodic`] - periodic task

use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Task kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Long-lived background worker
    Worker,
    /// Event listener
    Listener,
    /// Periodic task
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Listener => write!(f, "Listener"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// A registered background task
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Background task registry
///
/// # Usage
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new();
/// tasks.spawn("notify_worker", TaskKind::Listener, async move {
///     // task body
/// });
/// tasks.shutdown(Duration::from_secs(10)).await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancellation token tasks should watch for shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register and start a background task.
    ///
    /// The task is wrapped to capture panics; an abnormal exit is logged
    /// rather than taking the process down.
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(task = name, kind = %kind, "Starting background task");
        let handle = tokio::spawn(async move {
            if let Err(e) = AssertUnwindSafe(fut).catch_unwind().await {
                let msg = e
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| e.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(task = name, panic = %msg, "Background task panicked");
            }
        });
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    /// Cancel all tasks and wait for them to finish, bounded by `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        tracing::info!(count = self.tasks.len(), "Shutting down background tasks");
        self.shutdown.cancel();

        for task in self.tasks {
            match tokio::time::timeout(timeout, task.handle).await {
                Ok(Ok(())) => {
                    tracing::info!(task = task.name, kind = %task.kind, "Task stopped");
                }
                Ok(Err(e)) => {
                    tracing::warn!(task = task.name, error = %e, "Task join failed");
                }
                Err(_) => {
                    tracing::warn!(task = task.name, "Task did not stop within timeout, aborting");
                }
            }
        }
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tasks_stop_on_shutdown() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("test_worker", TaskKind::Worker, async move {
            token.cancelled().await;
        });
        tasks.shutdown(Duration::from_secs(1)).await;
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("bad_task", TaskKind::Worker, async {
            panic!("boom");
        });
        // Must not propagate the panic
        tasks.shutdown(Duration::from_secs(1)).await;
    }
}
