use ops_core::config as core_config;
use ops_core::error::AppError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RecurringConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between firings of the recurrence trigger.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Upper bound on records fetched per due-query page.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Payment term applied to generated invoices.
    #[serde(default = "default_due_term_days")]
    pub due_term_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            batch_size: default_batch_size(),
            due_term_days: default_due_term_days(),
        }
    }
}

impl RecurringConfig {
    /// Load from the optional `configuration` file and `APP__`-prefixed
    /// environment variables.
    pub fn load() -> Result<Self, AppError> {
        core_config::load()
    }
}

fn default_service_name() -> String {
    "recurring-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_tick_interval_secs() -> u64 {
    86_400
}

fn default_batch_size() -> i64 {
    100
}

fn default_due_term_days() -> i64 {
    30
}
