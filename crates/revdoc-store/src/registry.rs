//! Row codec and operations for the `BrandRegistry` section.

use chrono::NaiveDate;

use crate::naming::REGISTRY_SECTION;
use crate::{Row, RowRange, StoreError, TabularStore};

pub const REGISTRY_HEADERS: [&str; 4] = ["normalized_key", "standard_name", "first_seen", "aliases"];

const COL_ALIASES: usize = 3;
const ALIAS_SEPARATOR: &str = ", ";

/// One canonical brand as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    pub row: usize,
    pub normalized_key: String,
    pub standard_name: String,
    pub first_seen: String,
    /// Ordered set; never contains duplicates.
    pub aliases: Vec<String>,
}

fn decode(row: usize, cells: &[String]) -> Option<RegistryRecord> {
    let cell = |i: usize| cells.get(i).map_or("", |s| s.trim());
    let normalized_key = cell(0);
    if normalized_key.is_empty() {
        return None;
    }
    let standard_name = match cell(1) {
        "" => normalized_key,
        name => name,
    };
    Some(RegistryRecord {
        row,
        normalized_key: normalized_key.to_string(),
        standard_name: standard_name.to_string(),
        first_seen: cell(2).to_string(),
        aliases: split_aliases(cell(3)),
    })
}

fn split_aliases(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for alias in raw.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        if !out.iter().any(|a| a == alias) {
            out.push(alias.to_string());
        }
    }
    out
}

async fn ensure_registry(store: &dyn TabularStore, table: &str) -> Result<(), StoreError> {
    store.ensure_table(table).await?;
    store
        .ensure_section(table, REGISTRY_SECTION, &REGISTRY_HEADERS)
        .await
}

/// All registry records in row order. A missing registry reads as empty.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn load_registry(
    store: &dyn TabularStore,
    table: &str,
) -> Result<Vec<RegistryRecord>, StoreError> {
    let rows = match store.get_rows(table, REGISTRY_SECTION).await {
        Ok(rows) => rows,
        Err(e) if e.is_missing() => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| decode(i, cells))
        .collect())
}

/// Append a new canonical brand and return its row index.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn append_brand(
    store: &dyn TabularStore,
    table: &str,
    normalized_key: &str,
    standard_name: &str,
    first_seen: NaiveDate,
    aliases: &[String],
) -> Result<usize, StoreError> {
    ensure_registry(store, table).await?;
    let row: Row = vec![
        normalized_key.to_string(),
        standard_name.to_string(),
        first_seen.format("%Y-%m-%d").to_string(),
        aliases.join(ALIAS_SEPARATOR),
    ];
    store.append_row(table, REGISTRY_SECTION, row).await
}

/// Overwrite the alias list of an existing registry row.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn write_aliases(
    store: &dyn TabularStore,
    table: &str,
    row: usize,
    aliases: &[String],
) -> Result<(), StoreError> {
    store
        .update_rows(
            table,
            REGISTRY_SECTION,
            RowRange {
                row,
                col: COL_ALIASES,
            },
            vec![aliases.join(ALIAS_SEPARATOR)],
        )
        .await
}
