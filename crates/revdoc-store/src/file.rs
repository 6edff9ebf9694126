//! JSON-snapshot persistence on top of [`MemoryStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::memory::StoreState;
use crate::{
    ArtifactRef, MemoryStore, ReportSection, ReportSink, Row, RowRange, StoreError, TabularStore,
};

const SNAPSHOT_FILE: &str = "store.json";

/// A [`MemoryStore`] that rewrites `{data_dir}/store.json` after every mutation.
#[derive(Debug)]
pub struct FileStore {
    inner: MemoryStore,
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Open (or create) the snapshot under `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or the
    /// snapshot cannot be read, and [`StoreError::Json`] if it is malformed.
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(SNAPSHOT_FILE);

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreState>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        tracing::debug!(path = %path.display(), tables = state.tables.len(), "store: opened snapshot");

        Ok(Self {
            inner: MemoryStore::from_state(state),
            path,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let bytes = serde_json::to_vec_pretty(&self.inner.snapshot())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TabularStore for FileStore {
    async fn ensure_table(&self, table: &str) -> Result<(), StoreError> {
        self.inner.ensure_table(table).await?;
        self.persist().await
    }

    async fn ensure_section(
        &self,
        table: &str,
        section: &str,
        headers: &[&str],
    ) -> Result<(), StoreError> {
        self.inner.ensure_section(table, section, headers).await?;
        self.persist().await
    }

    async fn get_rows(&self, table: &str, section: &str) -> Result<Vec<Row>, StoreError> {
        self.inner.get_rows(table, section).await
    }

    async fn get_recent_rows(
        &self,
        table: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        self.inner.get_recent_rows(table, section, limit).await
    }

    async fn append_row(&self, table: &str, section: &str, row: Row) -> Result<usize, StoreError> {
        let index = self.inner.append_row(table, section, row).await?;
        self.persist().await?;
        Ok(index)
    }

    async fn update_rows(
        &self,
        table: &str,
        section: &str,
        range: RowRange,
        values: Row,
    ) -> Result<(), StoreError> {
        self.inner.update_rows(table, section, range, values).await?;
        self.persist().await
    }
}

#[async_trait]
impl ReportSink for FileStore {
    async fn create_artifact(
        &self,
        folder: &[String],
        name: &str,
    ) -> Result<ArtifactRef, StoreError> {
        let reference = self.inner.create_artifact(folder, name).await?;
        self.persist().await?;
        Ok(reference)
    }

    async fn write_section(
        &self,
        artifact: &ArtifactRef,
        index: usize,
        section: &ReportSection,
    ) -> Result<(), StoreError> {
        self.inner.write_section(artifact, index, section).await?;
        self.persist().await
    }
}
