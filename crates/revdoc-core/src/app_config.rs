use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub raw_table_prefix: String,
    pub registry_table: String,
    pub report_folder: String,
    pub brand_seeds_path: Option<PathBuf>,
    pub dedup_cache_capacity: usize,
    pub dedup_cache_ttl_secs: u64,
    pub dup_check_lookback_rows: usize,
    pub enrich_batch_size: usize,
    pub enrich_max_attempts: u32,
    pub enrich_cron: String,
    pub weekly_report_enabled: bool,
    pub weekly_report_cron: String,
    pub store_max_retries: u32,
    pub store_retry_backoff_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("raw_table_prefix", &self.raw_table_prefix)
            .field("registry_table", &self.registry_table)
            .field("report_folder", &self.report_folder)
            .field("brand_seeds_path", &self.brand_seeds_path)
            .field("dedup_cache_capacity", &self.dedup_cache_capacity)
            .field("dedup_cache_ttl_secs", &self.dedup_cache_ttl_secs)
            .field("dup_check_lookback_rows", &self.dup_check_lookback_rows)
            .field("enrich_batch_size", &self.enrich_batch_size)
            .field("enrich_max_attempts", &self.enrich_max_attempts)
            .field("enrich_cron", &self.enrich_cron)
            .field("weekly_report_enabled", &self.weekly_report_enabled)
            .field("weekly_report_cron", &self.weekly_report_cron)
            .field("store_max_retries", &self.store_max_retries)
            .field("store_retry_backoff_ms", &self.store_retry_backoff_ms)
            .finish()
    }
}
