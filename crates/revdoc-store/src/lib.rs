//! Tabular storage collaborator for the review pipeline.
//!
//! Everything above this crate talks to storage through [`TabularStore`] and
//! [`ReportSink`]. Raw rows are decoded into typed records here and nowhere
//! else.

pub mod error;
pub mod file;
pub mod memory;
pub mod naming;
pub mod notifications;
pub mod registry;
pub mod report;
pub mod retry;
pub mod reviews;
pub mod table;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::{MemoryStore, StoredArtifact};
pub use notifications::{NotificationConfig, NotificationLevel};
pub use registry::RegistryRecord;
pub use report::{ArtifactRef, ReportSection, ReportSink};
pub use retry::retry_with_backoff;
pub use reviews::StoredReview;
pub use table::{Row, RowRange, TabularStore};
