//! Pure weekly aggregation over one brand's enriched reviews.

use std::collections::HashMap;

use revdoc_core::{format_timestamp, ReviewRecord, Sentiment};

use crate::keywords::{keyword_counts, keyword_stats, top_keywords, KeywordFilter};
use crate::types::{
    average_rating, rate, round1, BrandWeeklyAggregation, NegativeReview, NegativeStoreAnalysis,
    PlatformStat, Priority, SentimentDistribution, StoreStat, WeekOverWeek,
};

const HEADLINE_KEYWORDS: usize = 5;
const KEYWORD_TABLE_ROWS: usize = 20;
const GROUP_TOP_KEYWORDS: usize = 3;
const ACTION_NEGATIVE_RATIO: f64 = 0.4;
const NEGATIVE_STORE_LIMIT: usize = 10;
const NEGATIVE_STORE_KEYWORDS: usize = 5;
const NEGATIVE_STORE_SAMPLES: usize = 3;

/// Keyword fragments that escalate a negative review to [`Priority::High`].
pub const SAFETY_KEYWORDS: &[&str] = &[
    "트러블",
    "알러지",
    "알레르기",
    "자극",
    "피부",
    "따가움",
    "부작용",
    "allergy",
    "allergic",
    "irritation",
    "side effect",
    "rash",
];

/// Aggregate one brand's week.
///
/// `prior` is last week's reviews for the same brand group; an empty slice
/// counts as absent, so the week-over-week delta is `None` rather than zero.
#[must_use]
pub fn aggregate_brand(
    brand: &str,
    week_label: &str,
    reviews: &[ReviewRecord],
    prior: Option<&[ReviewRecord]>,
) -> BrandWeeklyAggregation {
    let prior = prior.filter(|p| !p.is_empty());
    let filter = KeywordFilter::new(brand, reviews);

    let sentiment = SentimentDistribution::from_reviews(reviews);
    let avg_rating = average_rating(reviews.iter());

    let prior_counts = prior.map(keyword_counts);
    let stats = keyword_stats(reviews, prior_counts.as_ref());

    let headline = |wanted: Sentiment| {
        stats
            .iter()
            .filter(|k| k.dominant == wanted && !filter.excludes(&k.keyword))
            .take(HEADLINE_KEYWORDS)
            .cloned()
            .collect::<Vec<_>>()
    };
    let top_keywords = headline(Sentiment::Positive);
    let issue_keywords = headline(Sentiment::Negative);

    let week_over_week = prior.map(|p| week_over_week(reviews, &sentiment, avg_rating, p));

    BrandWeeklyAggregation {
        brand_name: brand.to_string(),
        week_label: week_label.to_string(),
        total_reviews: reviews.len(),
        avg_rating,
        sentiment,
        top_keywords,
        issue_keywords,
        keyword_table: stats.into_iter().take(KEYWORD_TABLE_ROWS).collect(),
        store_stats: store_stats(reviews, &filter),
        platform_stats: platform_stats(reviews, &filter),
        negative_reviews: negative_reviews(reviews),
        negative_stores: negative_stores(reviews, &filter),
        week_over_week,
        raw: reviews.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Grouped statistics
// ---------------------------------------------------------------------------

/// Reviews bucketed by `key`, buckets in first-seen order.
fn bucket<'a>(
    reviews: &'a [ReviewRecord],
    key: impl Fn(&ReviewRecord) -> &str,
) -> Vec<(String, Vec<&'a ReviewRecord>)> {
    let mut buckets: Vec<(String, Vec<&ReviewRecord>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for review in reviews {
        let k = key(review).trim().to_string();
        match index.get(&k) {
            Some(&i) => buckets[i].1.push(review),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![review]));
            }
        }
    }
    buckets
}

fn distribution(reviews: &[&ReviewRecord]) -> SentimentDistribution {
    let mut dist = SentimentDistribution::default();
    for review in reviews {
        dist.add(review.effective_sentiment());
    }
    dist
}

fn store_stats(reviews: &[ReviewRecord], filter: &KeywordFilter) -> Vec<StoreStat> {
    let mut stats: Vec<StoreStat> = bucket(reviews, |r| r.store_name.as_str())
        .into_iter()
        .map(|(store_name, members)| {
            let sentiment = distribution(&members);
            StoreStat {
                store_name,
                avg_rating: average_rating(members.iter().copied()),
                top_keywords: top_keywords(&members, filter, GROUP_TOP_KEYWORDS),
                action_needed: rate(sentiment.negative, sentiment.total()) / 100.0
                    >= ACTION_NEGATIVE_RATIO,
                sentiment,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.total().cmp(&a.total()));
    stats
}

fn platform_stats(reviews: &[ReviewRecord], filter: &KeywordFilter) -> Vec<PlatformStat> {
    let mut stats: Vec<PlatformStat> = bucket(reviews, |r| r.platform.as_str())
        .into_iter()
        .map(|(platform, members)| PlatformStat {
            platform,
            sentiment: distribution(&members),
            avg_rating: average_rating(members.iter().copied()),
            top_keywords: top_keywords(&members, filter, GROUP_TOP_KEYWORDS),
        })
        .collect();
    stats.sort_by(|a, b| b.total().cmp(&a.total()));
    stats
}

// ---------------------------------------------------------------------------
// Negative reviews
// ---------------------------------------------------------------------------

fn has_safety_keyword(keywords: &[String]) -> bool {
    keywords.iter().any(|k| {
        let k = k.to_lowercase();
        SAFETY_KEYWORDS.iter().any(|s| k.contains(s))
    })
}

/// High for a 1-star rating or a safety keyword, Medium for 2 stars, else Low.
///
/// Star matches are exact, so a `1.4` rating is Low unless a safety keyword
/// is present.
#[must_use]
pub fn priority_for(review: &ReviewRecord) -> Priority {
    let stars = review.whole_stars();
    if stars == Some(1) || has_safety_keyword(&review.keywords) {
        Priority::High
    } else if stars == Some(2) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn is_negative(review: &ReviewRecord) -> bool {
    review.effective_sentiment() == Sentiment::Negative
}

fn negative_reviews(reviews: &[ReviewRecord]) -> Vec<NegativeReview> {
    let mut out: Vec<NegativeReview> = reviews
        .iter()
        .filter(|r| is_negative(r))
        .map(|r| NegativeReview {
            received_at: r.received_at.as_ref().map(format_timestamp).unwrap_or_default(),
            store_name: r.store_name.clone(),
            platform: r.platform.clone(),
            rating: r.rating,
            summary: r.summary.clone(),
            keywords: r.keywords.clone(),
            text: r.review_text.clone(),
            priority: priority_for(r),
        })
        .collect();
    out.sort_by_key(|r| r.priority);
    out
}

fn negative_stores(reviews: &[ReviewRecord], filter: &KeywordFilter) -> Vec<NegativeStoreAnalysis> {
    let negatives: Vec<ReviewRecord> = reviews.iter().filter(|r| is_negative(r)).cloned().collect();
    let mut stores: Vec<NegativeStoreAnalysis> = bucket(&negatives, |r| r.store_name.as_str())
        .into_iter()
        .map(|(store_name, members)| {
            let mut rating_breakdown = [0usize; 4];
            for review in &members {
                if let Some(stars @ 1..=4) = review.whole_stars() {
                    rating_breakdown[usize::from(stars) - 1] += 1;
                }
            }
            let samples = members
                .iter()
                .map(|r| {
                    if r.summary.trim().is_empty() {
                        r.review_text.trim().to_string()
                    } else {
                        r.summary.trim().to_string()
                    }
                })
                .filter(|s| !s.is_empty())
                .take(NEGATIVE_STORE_SAMPLES)
                .collect();
            NegativeStoreAnalysis {
                store_name,
                negative_count: members.len(),
                rating_breakdown,
                top_keywords: top_keywords(&members, filter, NEGATIVE_STORE_KEYWORDS),
                samples,
            }
        })
        .collect();
    stores.sort_by(|a, b| b.negative_count.cmp(&a.negative_count));
    stores.truncate(NEGATIVE_STORE_LIMIT);
    stores
}

// ---------------------------------------------------------------------------
// Week over week
// ---------------------------------------------------------------------------

#[allow(clippy::cast_possible_truncation)]
fn week_over_week(
    reviews: &[ReviewRecord],
    sentiment: &SentimentDistribution,
    avg_rating: f64,
    prior: &[ReviewRecord],
) -> WeekOverWeek {
    let prior_sentiment = SentimentDistribution::from_reviews(prior);
    let prior_avg = average_rating(prior.iter());

    let current = i64::try_from(reviews.len()).unwrap_or(i64::MAX);
    let before = i64::try_from(prior.len()).unwrap_or(i64::MAX);
    let review_change = current.saturating_sub(before);
    #[allow(clippy::cast_precision_loss)]
    let review_change_pct = (review_change as f64 / before.max(1) as f64 * 100.0).round() as i64;

    let rate1 = |count: usize, total: usize| round1(rate(count, total));

    WeekOverWeek {
        review_change,
        review_change_pct,
        avg_rating_change: round1(avg_rating - prior_avg),
        positive_rate_up: rate1(sentiment.positive, sentiment.total())
            >= rate1(prior_sentiment.positive, prior_sentiment.total()),
        negative_rate_up: rate1(sentiment.negative, sentiment.total())
            >= rate1(prior_sentiment.negative, prior_sentiment.total()),
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
