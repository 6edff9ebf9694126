//! Report notifications: the summary handed to channels and the collaborator trait.

use async_trait::async_trait;
use revdoc_store::{ArtifactRef, NotificationConfig, NotificationLevel};
use serde::Serialize;

use crate::types::BrandWeeklyAggregation;
use crate::NotifyError;

const SUMMARY_NEGATIVE_REVIEWS: usize = 3;

/// Compact view of a brand's week for chat-style channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub brand_name: String,
    pub week_label: String,
    pub total_reviews: usize,
    pub avg_rating: f64,
    pub positive_rate: String,
    pub negative_rate: String,
    pub top_keywords: Vec<(String, usize)>,
    pub issue_keywords: Vec<(String, usize)>,
    /// `[store] summary (priority)` for the most urgent negative reviews.
    pub urgent_reviews: Vec<String>,
}

impl From<&BrandWeeklyAggregation> for WeeklySummary {
    fn from(agg: &BrandWeeklyAggregation) -> Self {
        let pairs = |stats: &[crate::KeywordStat]| {
            stats
                .iter()
                .map(|k| (k.keyword.clone(), k.total))
                .collect::<Vec<_>>()
        };
        Self {
            brand_name: agg.brand_name.clone(),
            week_label: agg.week_label.clone(),
            total_reviews: agg.total_reviews,
            avg_rating: agg.avg_rating,
            positive_rate: agg.sentiment.positive_rate(),
            negative_rate: agg.sentiment.negative_rate(),
            top_keywords: pairs(&agg.top_keywords),
            issue_keywords: pairs(&agg.issue_keywords),
            urgent_reviews: agg
                .negative_reviews
                .iter()
                .take(SUMMARY_NEGATIVE_REVIEWS)
                .map(|r| format!("[{}] {} ({})", r.store_name, r.summary, r.priority.label()))
                .collect(),
        }
    }
}

fn ranked(keywords: &[(String, usize)], empty: &str) -> String {
    if keywords.is_empty() {
        return empty.to_string();
    }
    keywords
        .iter()
        .enumerate()
        .map(|(i, (k, n))| format!("{}. {k}({n}건)", i + 1))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl WeeklySummary {
    /// Message lines for `level`; the report location is always the last line.
    #[must_use]
    pub fn render(&self, level: NotificationLevel, artifact: &ArtifactRef) -> Vec<String> {
        let (start, end) = self
            .week_label
            .split_once('_')
            .unwrap_or((self.week_label.as_str(), ""));
        let mut lines = vec![format!("{} 주간 리포트 ({start} ~ {end})", self.brand_name)];

        if level != NotificationLevel::UrlOnly {
            lines.push(format!(
                "리뷰 {}건 | 평점 {}점 | 긍정 {} | 부정 {}",
                self.total_reviews, self.avg_rating, self.positive_rate, self.negative_rate
            ));
        }
        if level == NotificationLevel::All {
            lines.push(format!("TOP 키워드: {}", ranked(&self.top_keywords, "데이터 없음")));
            lines.push(format!(
                "부정 키워드: {}",
                ranked(&self.issue_keywords, "이번 주 부정 키워드 없음")
            ));
            if self.urgent_reviews.is_empty() {
                lines.push("이번 주 부정 리뷰 없음".to_string());
            } else {
                lines.extend(self.urgent_reviews.iter().cloned());
            }
        }
        lines.push(artifact.location.clone());
        lines
    }
}

/// Delivers a finished report to a brand's configured channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        config: &NotificationConfig,
        summary: &WeeklySummary,
        artifact: &ArtifactRef,
    ) -> Result<(), NotifyError>;
}

/// Writes notifications to the tracing log instead of an external channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        config: &NotificationConfig,
        summary: &WeeklySummary,
        artifact: &ArtifactRef,
    ) -> Result<(), NotifyError> {
        if config.webhook_url.trim().is_empty() {
            return Err(NotifyError::Config(format!(
                "no webhook url for brand {}",
                config.brand_name
            )));
        }
        let message = summary.render(config.level, artifact).join("\n");
        tracing::info!(
            brand = %summary.brand_name,
            level = %config.level,
            webhook = %config.webhook_url,
            body = %message,
            "notify: weekly report delivered"
        );
        Ok(())
    }
}
