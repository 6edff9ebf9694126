//! Per-brand notification settings read from the `NotificationConfig` section.

use crate::naming::NOTIFICATION_SECTION;
use crate::{StoreError, TabularStore};

pub const NOTIFICATION_HEADERS: [&str; 4] =
    ["brand_name", "webhook_url", "enabled", "notification_level"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    All,
    Summary,
    UrlOnly,
}

impl NotificationLevel {
    /// Unknown values fall back to `All`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "summary" => Self::Summary,
            "url_only" => Self::UrlOnly,
            _ => Self::All,
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::All => write!(f, "all"),
            NotificationLevel::Summary => write!(f, "summary"),
            NotificationLevel::UrlOnly => write!(f, "url_only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub brand_name: String,
    pub webhook_url: String,
    pub enabled: bool,
    pub level: NotificationLevel,
}

fn parse_enabled(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "on"
    )
}

/// All configured notification targets. A missing section reads as empty.
///
/// # Errors
///
/// Returns any [`StoreError`] other than a missing table/section.
pub async fn load_notification_configs(
    store: &dyn TabularStore,
    table: &str,
) -> Result<Vec<NotificationConfig>, StoreError> {
    let rows = match store.get_rows(table, NOTIFICATION_SECTION).await {
        Ok(rows) => rows,
        Err(e) if e.is_missing() => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(rows
        .iter()
        .filter_map(|cells| {
            let cell = |i: usize| cells.get(i).map_or("", |s| s.trim());
            if cell(0).is_empty() {
                return None;
            }
            Some(NotificationConfig {
                brand_name: cell(0).to_string(),
                webhook_url: cell(1).to_string(),
                enabled: parse_enabled(cell(2)),
                level: NotificationLevel::parse(cell(3)),
            })
        })
        .collect())
}

/// Create the notification section so operators have a header row to fill in.
///
/// # Errors
///
/// Propagates any [`StoreError`] from the store.
pub async fn ensure_notification_section(
    store: &dyn TabularStore,
    table: &str,
) -> Result<(), StoreError> {
    store.ensure_table(table).await?;
    store
        .ensure_section(table, NOTIFICATION_SECTION, &NOTIFICATION_HEADERS)
        .await
}

/// The enabled config for `brand`: exact whitespace-insensitive match first,
/// then a shared 3-character prefix in either direction.
#[must_use]
pub fn find_for_brand<'a>(
    configs: &'a [NotificationConfig],
    brand: &str,
) -> Option<&'a NotificationConfig> {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let prefix = |s: &str| s.chars().take(3).collect::<String>();

    let wanted = strip(brand);
    let enabled = || configs.iter().filter(|c| c.enabled);

    enabled()
        .find(|c| strip(&c.brand_name) == wanted)
        .or_else(|| {
            enabled().find(|c| {
                let key = strip(&c.brand_name);
                wanted.starts_with(&prefix(&key)) || key.starts_with(&prefix(&wanted))
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn config(brand: &str, enabled: bool) -> NotificationConfig {
        NotificationConfig {
            brand_name: brand.to_string(),
            webhook_url: format!("https://hooks.example/{brand}"),
            enabled,
            level: NotificationLevel::All,
        }
    }

    #[test]
    fn level_parsing() {
        assert_eq!(NotificationLevel::parse("summary"), NotificationLevel::Summary);
        assert_eq!(NotificationLevel::parse("URL_ONLY"), NotificationLevel::UrlOnly);
        assert_eq!(NotificationLevel::parse(""), NotificationLevel::All);
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        let configs = vec![config("화락바베큐", true), config("화락바베큐치킨", true)];
        let found = find_for_brand(&configs, "화락 바베큐치킨").unwrap();
        assert_eq!(found.brand_name, "화락바베큐치킨");
    }

    #[test]
    fn prefix_match_and_disabled_skip() {
        let configs = vec![config("문화치킨", false), config("화락바베큐치킨", true)];
        assert!(find_for_brand(&configs, "문화치킨").is_none());
        assert!(find_for_brand(&configs, "화락바베큐치킨본점").is_some());
    }

    #[tokio::test]
    async fn load_parses_rows() {
        let store = MemoryStore::new();
        ensure_notification_section(&store, "Registry").await.unwrap();
        store
            .append_row(
                "Registry",
                NOTIFICATION_SECTION,
                vec![
                    "Foo".into(),
                    "https://hooks.example/foo".into(),
                    "TRUE".into(),
                    "summary".into(),
                ],
            )
            .await
            .unwrap();
        let configs = load_notification_configs(&store, "Registry").await.unwrap();
        assert_eq!(configs.len(), 1);
        assert!(configs[0].enabled);
        assert_eq!(configs[0].level, NotificationLevel::Summary);
    }
}
