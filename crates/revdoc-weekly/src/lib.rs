//! Weekly brand reports.
//!
//! Loads enriched reviews for a KST week, groups them by canonical brand,
//! aggregates sentiment/keyword/store/platform statistics, writes a
//! six-section report artifact per brand, and notifies subscribed channels.

pub mod aggregate;
pub mod error;
pub mod grouping;
pub mod keywords;
pub mod notify;
pub mod report;
pub mod service;
pub mod types;

pub use aggregate::aggregate_brand;
pub use error::{NotifyError, WeeklyError};
pub use grouping::{group_by_brand, BrandGroup};
pub use keywords::KeywordFilter;
pub use notify::{LogNotifier, Notifier, WeeklySummary};
pub use report::ReportAssembler;
pub use service::{CancelFlag, ReportRequest, WeeklyReportService, WeeklySettings};
pub use types::{
    BrandReportOutcome, BrandWeeklyAggregation, KeywordStat, NegativeReview, NegativeStoreAnalysis,
    PlatformStat, Priority, SentimentDistribution, StoreStat, WeekOverWeek,
};
