use thiserror::Error;

/// Errors returned by tabular store and report sink implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure while reading or writing a snapshot.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("store snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("section '{section}' not found in table '{table}'")]
    SectionNotFound { table: String, section: String },

    #[error("row range out of bounds: row {row}, col {col}")]
    InvalidRange { row: usize, col: usize },

    #[error("report artifact not found: {0}")]
    ArtifactNotFound(String),
}

impl StoreError {
    /// Transient failures that are worth retrying after a back-off delay.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }

    /// The table or section has not been created yet; callers read this as empty.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            StoreError::TableNotFound(_) | StoreError::SectionNotFound { .. }
        )
    }
}
