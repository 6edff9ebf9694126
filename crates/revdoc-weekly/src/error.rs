use revdoc_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeeklyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure to deliver a report notification; logged, never fatal to a brand.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("notification target misconfigured: {0}")]
    Config(String),
}
