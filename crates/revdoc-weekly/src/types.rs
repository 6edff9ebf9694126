use revdoc_core::{ReviewRecord, Sentiment};
use revdoc_store::ArtifactRef;
use serde::Serialize;

/// `12.5%` with one decimal; the denominator is at least 1.
#[must_use]
pub fn format_rate(count: usize, total: usize) -> String {
    format!("{:.1}%", rate(count, total))
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn rate(count: usize, total: usize) -> f64 {
    count as f64 / total.max(1) as f64 * 100.0
}

/// Mean star rating rounded to one decimal; `0.0` for no reviews.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn average_rating<'a>(ratings: impl Iterator<Item = &'a ReviewRecord>) -> f64 {
    let (sum, count) = ratings.fold((0.0_f64, 0usize), |(sum, count), r| {
        (sum + r.rating, count + 1)
    });
    round1(sum / count.max(1) as f64)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentDistribution {
    #[must_use]
    pub fn from_reviews(reviews: &[ReviewRecord]) -> Self {
        let mut dist = Self::default();
        for review in reviews {
            dist.add(review.effective_sentiment());
        }
        dist
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    #[must_use]
    pub fn positive_rate(&self) -> String {
        format_rate(self.positive, self.total())
    }

    #[must_use]
    pub fn negative_rate(&self) -> String {
        format_rate(self.negative, self.total())
    }

    #[must_use]
    pub fn neutral_rate(&self) -> String {
        format_rate(self.neutral, self.total())
    }
}

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordStat {
    pub keyword: String,
    pub total: usize,
    pub sentiment: SentimentDistribution,
    pub dominant: Sentiment,
    /// Count change against the prior week; `None` without a prior week.
    pub trend: Option<i64>,
}

impl KeywordStat {
    fn dominant_count(&self) -> usize {
        match self.dominant {
            Sentiment::Positive => self.sentiment.positive,
            Sentiment::Negative => self.sentiment.negative,
            Sentiment::Neutral => self.sentiment.neutral,
        }
    }

    /// `75% 긍정`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn ratio_label(&self) -> String {
        let pct = (self.dominant_count() as f64 / self.total.max(1) as f64 * 100.0).round() as u32;
        format!("{pct}% {}", self.dominant.korean_label())
    }

    /// `▲ +3`, `▼ -2`, or `- 0`.
    #[must_use]
    pub fn trend_label(&self) -> String {
        match self.trend {
            Some(d) if d > 0 => format!("▲ +{d}"),
            Some(d) if d < 0 => format!("▼ {d}"),
            _ => "- 0".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stores and platforms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStat {
    pub store_name: String,
    pub sentiment: SentimentDistribution,
    pub avg_rating: f64,
    pub top_keywords: Vec<String>,
    pub action_needed: bool,
}

impl StoreStat {
    #[must_use]
    pub fn total(&self) -> usize {
        self.sentiment.total()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStat {
    pub platform: String,
    pub sentiment: SentimentDistribution,
    pub avg_rating: f64,
    pub top_keywords: Vec<String>,
}

impl PlatformStat {
    #[must_use]
    pub fn total(&self) -> usize {
        self.sentiment.total()
    }
}

// ---------------------------------------------------------------------------
// Negative reviews
// ---------------------------------------------------------------------------

/// Follow-up urgency of a negative review. Orders `High < Medium < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "🔴 높음",
            Self::Medium => "🟡 중간",
            Self::Low => "🟢 낮음",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeReview {
    pub received_at: String,
    pub store_name: String,
    pub platform: String,
    pub rating: f64,
    pub summary: String,
    pub keywords: Vec<String>,
    pub text: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegativeStoreAnalysis {
    pub store_name: String,
    pub negative_count: usize,
    /// Negative reviews rated exactly 1, 2, 3 and 4 stars.
    pub rating_breakdown: [usize; 4],
    pub top_keywords: Vec<String>,
    pub samples: Vec<String>,
}

// ---------------------------------------------------------------------------
// Week over week
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekOverWeek {
    pub review_change: i64,
    /// Whole-percent change relative to the prior week's count.
    pub review_change_pct: i64,
    pub avg_rating_change: f64,
    pub positive_rate_up: bool,
    pub negative_rate_up: bool,
}

impl WeekOverWeek {
    /// `+5건 (25%)` or `-3건`.
    #[must_use]
    pub fn review_change_label(&self) -> String {
        if self.review_change >= 0 {
            format!("+{}건 ({}%)", self.review_change, self.review_change_pct)
        } else {
            format!("{}건", self.review_change)
        }
    }

    #[must_use]
    pub fn avg_rating_change_label(&self) -> String {
        if self.avg_rating_change >= 0.0 {
            format!("+{:.1}", self.avg_rating_change)
        } else {
            format!("{:.1}", self.avg_rating_change)
        }
    }

    #[must_use]
    pub fn arrow(up: bool) -> &'static str {
        if up {
            "▲"
        } else {
            "▼"
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation and outcomes
// ---------------------------------------------------------------------------

/// Everything a weekly report shows for one brand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandWeeklyAggregation {
    pub brand_name: String,
    pub week_label: String,
    pub total_reviews: usize,
    pub avg_rating: f64,
    pub sentiment: SentimentDistribution,
    /// Positive-leading keywords after brand/platform/generic filtering.
    pub top_keywords: Vec<KeywordStat>,
    /// Negative-leading keywords after the same filtering.
    pub issue_keywords: Vec<KeywordStat>,
    /// Most frequent keywords, unfiltered.
    pub keyword_table: Vec<KeywordStat>,
    pub store_stats: Vec<StoreStat>,
    pub platform_stats: Vec<PlatformStat>,
    pub negative_reviews: Vec<NegativeReview>,
    pub negative_stores: Vec<NegativeStoreAnalysis>,
    pub week_over_week: Option<WeekOverWeek>,
    #[serde(skip)]
    pub raw: Vec<ReviewRecord>,
}

/// Per-brand result of a weekly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandReportOutcome {
    pub brand_name: String,
    pub success: bool,
    pub total_reviews: usize,
    pub week_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BrandReportOutcome {
    #[must_use]
    pub fn failed(brand_name: &str, week_label: &str, error: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.to_string(),
            success: false,
            total_reviews: 0,
            week_label: week_label.to_string(),
            artifact: None,
            error: Some(error.into()),
        }
    }
}
