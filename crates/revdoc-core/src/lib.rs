//! Shared domain types, fingerprinting, week arithmetic, and configuration
//! for the review pipeline.

pub mod app_config;
pub mod brands;
pub mod config;
pub mod hash;
pub mod review;
pub mod week;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use brands::{load_brand_seeds, BrandSeed, BrandSeedFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use hash::{review_fingerprint, ReviewIdentity, FINGERPRINT_LEN};
pub use review::{
    format_rating, parse_rating, Enrichment, EnrichmentContext, InboundReview, RatingValue,
    ReviewRecord, ReviewStatus, Sentiment,
};
pub use week::{format_timestamp, kst, now_kst, parse_timestamp, WeekRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brand seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brand seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),

    #[error("brand seed validation failed: {0}")]
    Validation(String),
}
