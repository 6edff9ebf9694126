use revdoc_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A required identity field was missing or blank; no I/O was attempted.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure of the enrichment collaborator for a single review.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("enrichment failed: {0}")]
    Failed(String),

    #[error("enrichment returned unusable output: {0}")]
    InvalidOutput(String),
}
