use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/fulfillment | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | COMMAND_TIMEOUT_MS | 5000 | Bound on a single command execution |
/// | SWEEP_INTERVAL_SECS | 60 | Background sweep period |
/// | RESERVATION_TTL_MINUTES | 30 | Pending orders older than this are expired |
/// | MAX_ACTIVE_DELIVERIES | 3 | Per-rider concurrent shipment cap |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown bound |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/fulfillment HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Bound on a single command execution (milliseconds); expiry
    /// surfaces SYSTEM_BUSY instead of hanging the caller
    pub command_timeout_ms: u64,
    /// Background sweep period (seconds)
    pub sweep_interval_secs: u64,
    /// Pending orders older than this release their reservation (minutes)
    pub reservation_ttl_minutes: u64,
    /// Per-rider concurrent shipment cap
    pub max_active_deliveries: u32,
    /// Graceful shutdown bound (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/fulfillment".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            command_timeout_ms: std::env::var("COMMAND_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            reservation_ttl_minutes: std::env::var("RESERVATION_TTL_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            max_active_deliveries: std::env::var("MAX_ACTIVE_DELIVERIES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// Override the parts tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the redb database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("fulfillment.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = Config::with_overrides("/tmp/fftest", 8123);
        assert_eq!(config.work_dir, "/tmp/fftest");
        assert_eq!(config.http_port, 8123);
        assert!(config.db_path().ends_with("fulfillment.redb"));
    }
}
