use chrono::{DateTime, Datelike, FixedOffset};
use revdoc_core::{kst, WeekRange};

pub const REVIEWS_SECTION: &str = "Reviews";
pub const REGISTRY_SECTION: &str = "BrandRegistry";
pub const NOTIFICATION_SECTION: &str = "NotificationConfig";

/// `{prefix}{YYYY}_{MM}`.
#[must_use]
pub fn raw_table_name(prefix: &str, year: i32, month: u32) -> String {
    format!("{prefix}{year}_{month:02}")
}

/// Raw table for the KST month containing `ts`.
#[must_use]
pub fn raw_table_for(prefix: &str, ts: &DateTime<FixedOffset>) -> String {
    let local = ts.with_timezone(&kst());
    raw_table_name(prefix, local.year(), local.month())
}

/// Every raw table a week's reviews may live in.
#[must_use]
pub fn raw_tables_for_week(prefix: &str, week: &WeekRange) -> Vec<String> {
    week.months()
        .into_iter()
        .map(|(year, month)| raw_table_name(prefix, year, month))
        .collect()
}

/// `[root, brand, YYYY, MM월]` folder path for a brand's weekly report.
#[must_use]
pub fn report_folder(root: &str, brand: &str, week: &WeekRange) -> Vec<String> {
    let start = week.start_date();
    vec![
        root.to_string(),
        brand.to_string(),
        start.year().to_string(),
        format!("{:02}월", start.month()),
    ]
}

/// `{brand}_Weekly_{label}`.
#[must_use]
pub fn report_name(brand: &str, week: &WeekRange) -> String {
    format!("{brand}_Weekly_{}", week.label())
}
