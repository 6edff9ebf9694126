use async_trait::async_trait;

use crate::StoreError;

/// One data row; cells are plain strings.
pub type Row = Vec<String>;

/// Zero-based position of the first cell an update overwrites.
///
/// `row` counts data rows only (the header row is not addressable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub row: usize,
    pub col: usize,
}

/// A store of named tables, each holding named sections of header + rows.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Create `table` if it does not exist.
    async fn ensure_table(&self, table: &str) -> Result<(), StoreError>;

    /// Create `section` with `headers` inside an existing table if absent.
    async fn ensure_section(
        &self,
        table: &str,
        section: &str,
        headers: &[&str],
    ) -> Result<(), StoreError>;

    /// All data rows of a section, header excluded.
    async fn get_rows(&self, table: &str, section: &str) -> Result<Vec<Row>, StoreError>;

    /// The last `limit` data rows of a section, oldest first.
    async fn get_recent_rows(
        &self,
        table: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        let rows = self.get_rows(table, section).await?;
        let skip = rows.len().saturating_sub(limit);
        Ok(rows.into_iter().skip(skip).collect())
    }

    /// Append a data row and return its index.
    async fn append_row(&self, table: &str, section: &str, row: Row) -> Result<usize, StoreError>;

    /// Overwrite consecutive cells of one row starting at `range`.
    async fn update_rows(
        &self,
        table: &str,
        section: &str,
        range: RowRange,
        values: Row,
    ) -> Result<(), StoreError>;
}
