//! Keyword counting and the discriminative-keyword filter.

use std::collections::HashMap;

use revdoc_core::{ReviewRecord, Sentiment};

use crate::types::{KeywordStat, SentimentDistribution};

/// Delivery platforms whose names are never reported as keywords.
pub const PLATFORM_NAMES: &[&str] = &[
    "배달의민족",
    "배민",
    "쿠팡이츠",
    "쿠팡",
    "요기요",
    "땡겨요",
    "네이버",
    "카카오",
    "baemin",
    "coupang",
    "coupangeats",
    "yogiyo",
    "naver",
    "kakao",
];

/// Praise too generic to say anything about a specific store.
pub const GENERIC_POSITIVE: &[&str] = &[
    "좋아요", "좋음", "좋다", "최고", "만족", "굿", "good", "great", "nice", "best",
];

/// Complaints too generic to act on.
pub const GENERIC_NEGATIVE: &[&str] = &[
    "별로", "나쁨", "싫어요", "최악", "불만", "bad", "worst", "poor", "terrible",
];

fn fold(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Removes keywords that restate the brand or the platform, or that carry no
/// specific signal.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    brand: String,
    brand_tokens: Vec<String>,
    platforms: Vec<String>,
}

impl KeywordFilter {
    /// Filter for `brand`, also excluding every platform name seen in `reviews`.
    #[must_use]
    pub fn new(brand: &str, reviews: &[ReviewRecord]) -> Self {
        let mut platforms: Vec<String> = PLATFORM_NAMES.iter().map(|p| fold(p)).collect();
        for review in reviews {
            let platform = fold(&review.platform);
            if !platform.is_empty() && !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        Self {
            brand: fold(brand),
            brand_tokens: brand
                .split_whitespace()
                .filter(|t| t.chars().count() >= 2)
                .map(fold)
                .collect(),
            platforms,
        }
    }

    #[must_use]
    pub fn excludes(&self, keyword: &str) -> bool {
        let kw = fold(keyword);
        if kw.is_empty() {
            return true;
        }
        if !self.brand.is_empty() && (kw.contains(&self.brand) || self.brand.contains(&kw)) {
            return true;
        }
        if self.brand_tokens.iter().any(|t| *t == kw) {
            return true;
        }
        if self.platforms.iter().any(|p| *p == kw) {
            return true;
        }
        GENERIC_POSITIVE
            .iter()
            .chain(GENERIC_NEGATIVE)
            .any(|g| fold(g) == kw)
    }
}

/// Keyword occurrences across `reviews`, trimmed.
#[must_use]
pub fn keyword_counts(reviews: &[ReviewRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for keyword in reviews.iter().flat_map(|r| &r.keywords) {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            *counts.entry(keyword.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Highest count wins; ties prefer positive, then negative.
fn dominant(dist: &SentimentDistribution) -> Sentiment {
    if dist.positive >= dist.negative && dist.positive >= dist.neutral {
        Sentiment::Positive
    } else if dist.negative >= dist.neutral {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Per-keyword statistics sorted by descending count; ties keep first-seen order.
///
/// `prior` holds last week's keyword counts; when present every stat gets a trend.
#[must_use]
pub fn keyword_stats(
    reviews: &[ReviewRecord],
    prior: Option<&HashMap<String, usize>>,
) -> Vec<KeywordStat> {
    let mut order: Vec<String> = Vec::new();
    let mut dists: HashMap<String, SentimentDistribution> = HashMap::new();

    for review in reviews {
        let sentiment = review.effective_sentiment();
        for keyword in &review.keywords {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                continue;
            }
            if !dists.contains_key(keyword) {
                order.push(keyword.to_string());
            }
            dists.entry(keyword.to_string()).or_default().add(sentiment);
        }
    }

    let mut stats: Vec<KeywordStat> = order
        .into_iter()
        .map(|keyword| {
            let dist = dists.get(&keyword).copied().unwrap_or_default();
            let total = dist.total();
            let trend = prior.map(|p| {
                let before = p.get(&keyword).copied().unwrap_or(0);
                i64::try_from(total)
                    .unwrap_or(i64::MAX)
                    .saturating_sub(i64::try_from(before).unwrap_or(i64::MAX))
            });
            KeywordStat {
                keyword,
                total,
                dominant: dominant(&dist),
                sentiment: dist,
                trend,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

/// The `n` most frequent keywords in `reviews` that `filter` keeps.
#[must_use]
pub fn top_keywords(reviews: &[&ReviewRecord], filter: &KeywordFilter, n: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for keyword in reviews.iter().flat_map(|r| &r.keywords) {
        let keyword = keyword.trim();
        if filter.excludes(keyword) {
            continue;
        }
        if !counts.contains_key(keyword) {
            order.push(keyword.to_string());
        }
        *counts.entry(keyword.to_string()).or_insert(0) += 1;
    }
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(n);
    order
}
