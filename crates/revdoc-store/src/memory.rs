use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{ArtifactRef, ReportSection, ReportSink, Row, RowRange, StoreError, TabularStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Section {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// A report artifact as held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub reference: ArtifactRef,
    pub folder: Vec<String>,
    pub sections: BTreeMap<usize, ReportSection>,
}

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoreState {
    pub tables: BTreeMap<String, BTreeMap<String, Section>>,
    pub artifacts: BTreeMap<String, StoredArtifact>,
}

/// In-process tabular store and report sink.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub(crate) fn snapshot(&self) -> StoreState {
        self.state.read().clone()
    }

    /// Names of all tables, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.state.read().tables.keys().cloned().collect()
    }

    #[must_use]
    pub fn artifact(&self, id: &str) -> Option<StoredArtifact> {
        self.state.read().artifacts.get(id).cloned()
    }

    #[must_use]
    pub fn artifacts(&self) -> Vec<StoredArtifact> {
        self.state.read().artifacts.values().cloned().collect()
    }

    fn with_section<T>(
        &self,
        table: &str,
        section: &str,
        f: impl FnOnce(&Section) -> T,
    ) -> Result<T, StoreError> {
        let state = self.state.read();
        let sections = state
            .tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let found = sections
            .get(section)
            .ok_or_else(|| section_not_found(table, section))?;
        Ok(f(found))
    }

    fn with_section_mut<T>(
        &self,
        table: &str,
        section: &str,
        f: impl FnOnce(&mut Section) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.write();
        let sections = state
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        let found = sections
            .get_mut(section)
            .ok_or_else(|| section_not_found(table, section))?;
        f(found)
    }
}

fn section_not_found(table: &str, section: &str) -> StoreError {
    StoreError::SectionNotFound {
        table: table.to_string(),
        section: section.to_string(),
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn ensure_table(&self, table: &str) -> Result<(), StoreError> {
        self.state
            .write()
            .tables
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    async fn ensure_section(
        &self,
        table: &str,
        section: &str,
        headers: &[&str],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let sections = state
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        sections
            .entry(section.to_string())
            .or_insert_with(|| Section {
                headers: headers.iter().map(|h| (*h).to_string()).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    async fn get_rows(&self, table: &str, section: &str) -> Result<Vec<Row>, StoreError> {
        self.with_section(table, section, |s| s.rows.clone())
    }

    async fn get_recent_rows(
        &self,
        table: &str,
        section: &str,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        self.with_section(table, section, |s| {
            let skip = s.rows.len().saturating_sub(limit);
            s.rows[skip..].to_vec()
        })
    }

    async fn append_row(&self, table: &str, section: &str, row: Row) -> Result<usize, StoreError> {
        self.with_section_mut(table, section, |s| {
            s.rows.push(row);
            Ok(s.rows.len() - 1)
        })
    }

    async fn update_rows(
        &self,
        table: &str,
        section: &str,
        range: RowRange,
        values: Row,
    ) -> Result<(), StoreError> {
        self.with_section_mut(table, section, |s| {
            let target = s.rows.get_mut(range.row).ok_or(StoreError::InvalidRange {
                row: range.row,
                col: range.col,
            })?;
            let needed = range.col + values.len();
            if target.len() < needed {
                target.resize(needed, String::new());
            }
            for (offset, value) in values.into_iter().enumerate() {
                target[range.col + offset] = value;
            }
            Ok(())
        })
    }
}

#[async_trait]
impl ReportSink for MemoryStore {
    async fn create_artifact(
        &self,
        folder: &[String],
        name: &str,
    ) -> Result<ArtifactRef, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut location = folder.join("/");
        if !location.is_empty() {
            location.push('/');
        }
        location.push_str(name);

        let reference = ArtifactRef {
            id: id.clone(),
            name: name.to_string(),
            location,
        };
        self.state.write().artifacts.insert(
            id,
            StoredArtifact {
                reference: reference.clone(),
                folder: folder.to_vec(),
                sections: BTreeMap::new(),
            },
        );
        Ok(reference)
    }

    async fn write_section(
        &self,
        artifact: &ArtifactRef,
        index: usize,
        section: &ReportSection,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let stored = state
            .artifacts
            .get_mut(&artifact.id)
            .ok_or_else(|| StoreError::ArtifactNotFound(artifact.id.clone()))?;
        stored.sections.insert(index, section.clone());
        Ok(())
    }
}
