use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Enrichment sentiment of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Parse either the English or the stored Korean label.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "positive" | "긍정" => Some(Self::Positive),
            "negative" | "부정" => Some(Self::Negative),
            "neutral" | "중립" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Label written to the store and shown in reports.
    #[must_use]
    pub fn korean_label(self) -> &'static str {
        match self {
            Self::Positive => "긍정",
            Self::Negative => "부정",
            Self::Neutral => "중립",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

/// Lifecycle state of a persisted review row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    New,
    Done,
    Error,
    Failed,
}

impl ReviewStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Done => "DONE",
            Self::Error => "ERROR",
            Self::Failed => "FAILED",
        }
    }

    /// Unknown or blank cells read as `New` so they are picked up for enrichment.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "DONE" => Self::Done,
            "ERROR" => Self::Error,
            "FAILED" => Self::Failed,
            _ => Self::New,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inbound payload
// ---------------------------------------------------------------------------

/// Rating as delivered by the source: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    Number(f64),
    Text(String),
}

/// One review event as received from the upstream source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundReview {
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub rating: Option<RatingValue>,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub review_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Text form of a rating used for fingerprinting and storage.
///
/// Whole numbers print without a fractional part (`5.0` becomes `"5"`).
#[must_use]
pub fn format_rating(rating: Option<&RatingValue>) -> String {
    match rating {
        Some(RatingValue::Number(n)) => n.to_string(),
        Some(RatingValue::Text(s)) => s.trim().to_string(),
        None => String::new(),
    }
}

/// Convert a stored rating cell to a star value in `0.0..=5.0`.
///
/// Fractional ratings are kept as given; unparsable cells become `0.0`.
#[must_use]
pub fn parse_rating(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.clamp(0.0, 5.0),
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// Typed view of one row of a monthly raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRecord {
    pub received_at: Option<DateTime<FixedOffset>>,
    pub review_created_at: String,
    pub brand_name: String,
    pub store_name: String,
    pub platform: String,
    pub rating: f64,
    pub review_id: String,
    pub review_text: String,
    pub status: ReviewStatus,
    pub sentiment: Option<Sentiment>,
    pub summary: String,
    pub keywords: Vec<String>,
    pub processed_at: Option<DateTime<FixedOffset>>,
    pub attempts: u32,
    pub review_url: String,
    pub image_url: String,
}

impl ReviewRecord {
    /// Sentiment used by aggregation; rows without one count as neutral.
    #[must_use]
    pub fn effective_sentiment(&self) -> Sentiment {
        self.sentiment.unwrap_or(Sentiment::Neutral)
    }

    /// Star count when the rating is a whole number, `None` for fractional
    /// ratings such as `1.4`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
    pub fn whole_stars(&self) -> Option<u8> {
        (self.rating.fract() == 0.0).then_some(self.rating as u8)
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Output of the enrichment collaborator for one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub sentiment: Sentiment,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Review metadata passed alongside the text to the enricher.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentContext {
    pub brand_name: String,
    pub store_name: String,
    pub platform: String,
    pub rating: f64,
}
