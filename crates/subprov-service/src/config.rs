use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    #[serde(default = "default_nats_stream")]
    pub nats_stream: String,

    /// Subject pattern for the subscriber-event consumer filter
    #[serde(default = "default_nats_subject")]
    pub nats_subject: String,

    #[serde(default = "default_nats_consumer")]
    pub nats_consumer: String,

    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // PostgreSQL configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_user")]
    pub postgres_user: String,

    #[serde(default)]
    pub postgres_password: String,

    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    /// Base URL of the group-management service
    #[serde(default = "default_cgw_url")]
    pub cgw_url: String,

    /// Per-call timeout for group-management requests in seconds
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_stream() -> String {
    "subscriber_events".to_string()
}

fn default_nats_subject() -> String {
    "subscriber_events.>".to_string()
}

fn default_nats_consumer() -> String {
    "subprov-group-reconciler".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "subprov".to_string()
}

fn default_postgres_user() -> String {
    "subprov".to_string()
}

fn default_postgres_pool_size() -> usize {
    8
}

fn default_cgw_url() -> String {
    "http://localhost:16008".to_string()
}

fn default_remote_timeout_secs() -> u64 {
    30
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SUBPROV"))
            .build()?
            .try_deserialize()
    }
}
