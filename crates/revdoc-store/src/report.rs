use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Row, StoreError};

/// Handle to a created report artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    pub name: String,
    /// Human-readable path such as `WeeklyReports/Foo/2025/01월/Foo_Weekly_...`.
    pub location: String,
}

/// One named tab of a report: a header row plus data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ReportSection {
    #[must_use]
    pub fn new(title: &str, headers: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }
}

/// Destination for assembled report artifacts.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Create an empty artifact named `name` under the nested `folder` path.
    async fn create_artifact(&self, folder: &[String], name: &str)
        -> Result<ArtifactRef, StoreError>;

    /// Write `section` as the `index`-th tab of `artifact`.
    async fn write_section(
        &self,
        artifact: &ArtifactRef,
        index: usize,
        section: &ReportSection,
    ) -> Result<(), StoreError>;
}
