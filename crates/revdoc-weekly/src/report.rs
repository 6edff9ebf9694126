//! Maps a [`BrandWeeklyAggregation`] onto the six report sections and writes
//! them through a [`ReportSink`].

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use revdoc_core::{format_timestamp, now_kst, WeekRange};
use revdoc_store::naming::{report_folder, report_name};
use revdoc_store::{ArtifactRef, ReportSection, ReportSink, StoreError};

use crate::types::{BrandWeeklyAggregation, WeekOverWeek};

pub const OVERVIEW: &str = "대시보드";
pub const STORES: &str = "매장별 분석";
pub const KEYWORDS: &str = "키워드 분석";
pub const NEGATIVE_REVIEWS: &str = "부정 리뷰 상세";
pub const PLATFORMS: &str = "플랫폼별 분석";
pub const RAW_DATA: &str = "원본 데이터";

const OVERVIEW_ISSUE_KEYWORDS: usize = 3;

pub struct ReportAssembler {
    sink: Arc<dyn ReportSink>,
    root_folder: String,
}

impl std::fmt::Debug for ReportAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAssembler")
            .field("root_folder", &self.root_folder)
            .finish_non_exhaustive()
    }
}

impl ReportAssembler {
    #[must_use]
    pub fn new(sink: Arc<dyn ReportSink>, root_folder: impl Into<String>) -> Self {
        Self {
            sink,
            root_folder: root_folder.into(),
        }
    }

    /// Create the artifact for `agg` and write every section in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`]; a failed section fails the whole report.
    pub async fn assemble(
        &self,
        agg: &BrandWeeklyAggregation,
        week: &WeekRange,
    ) -> Result<ArtifactRef, StoreError> {
        let folder = report_folder(&self.root_folder, &agg.brand_name, week);
        let name = report_name(&agg.brand_name, week);
        let artifact = self.sink.create_artifact(&folder, &name).await?;

        for (index, section) in build_sections(agg, &now_kst()).iter().enumerate() {
            self.sink.write_section(&artifact, index, section).await?;
        }

        tracing::info!(
            brand = %agg.brand_name,
            artifact = %artifact.location,
            "report: weekly report written"
        );
        Ok(artifact)
    }
}

/// All six sections, in tab order.
#[must_use]
pub fn build_sections(
    agg: &BrandWeeklyAggregation,
    generated_at: &DateTime<FixedOffset>,
) -> Vec<ReportSection> {
    vec![
        overview(agg, generated_at),
        stores(agg),
        keywords(agg),
        negative_reviews(agg),
        platforms(agg),
        raw_data(agg),
    ]
}

fn overview(agg: &BrandWeeklyAggregation, generated_at: &DateTime<FixedOffset>) -> ReportSection {
    let (start, end) = agg
        .week_label
        .split_once('_')
        .unwrap_or((agg.week_label.as_str(), ""));
    let wow = agg.week_over_week.as_ref();
    let or_dash = |f: &dyn Fn(&WeekOverWeek) -> String| wow.map_or_else(|| "-".to_string(), f);

    let title = format!("{} 주간 리포트", agg.brand_name);
    let mut s = ReportSection::new(OVERVIEW, &[title.as_str()]);
    s.push_row(["기간".to_string(), format!("{start} (월) ~ {end} (일)")]);
    s.push_row(["생성일시".to_string(), format_timestamp(generated_at)]);
    s.push_row(Vec::<String>::new());

    s.push_row(["핵심 지표", "", "", "", ""]);
    s.push_row([
        "총 리뷰 수".to_string(),
        format!("{}건", agg.total_reviews),
        String::new(),
        "지난주 대비".to_string(),
        or_dash(&WeekOverWeek::review_change_label),
    ]);
    s.push_row([
        "평균 별점".to_string(),
        format!("{}점", agg.avg_rating),
        String::new(),
        "지난주 대비".to_string(),
        or_dash(&WeekOverWeek::avg_rating_change_label),
    ]);
    s.push_row(Vec::<String>::new());

    s.push_row(["감정 분포", "건수", "비율", "변화"]);
    let d = &agg.sentiment;
    s.push_row([
        "긍정".to_string(),
        d.positive.to_string(),
        d.positive_rate(),
        or_dash(&|w: &WeekOverWeek| WeekOverWeek::arrow(w.positive_rate_up).to_string()),
    ]);
    s.push_row([
        "부정".to_string(),
        d.negative.to_string(),
        d.negative_rate(),
        or_dash(&|w: &WeekOverWeek| WeekOverWeek::arrow(w.negative_rate_up).to_string()),
    ]);
    s.push_row([
        "중립".to_string(),
        d.neutral.to_string(),
        d.neutral_rate(),
        "-".to_string(),
    ]);
    s.push_row(Vec::<String>::new());

    s.push_row(["이번주 TOP 키워드"]);
    for (i, kw) in agg.top_keywords.iter().enumerate() {
        s.push_row([format!("{}위", i + 1), format!("{} ({}건)", kw.keyword, kw.total)]);
    }
    s.push_row(Vec::<String>::new());

    s.push_row(["주의 키워드 (부정 연관)"]);
    for (i, kw) in agg.issue_keywords.iter().take(OVERVIEW_ISSUE_KEYWORDS).enumerate() {
        s.push_row([format!("{}위", i + 1), format!("{} ({}건)", kw.keyword, kw.total)]);
    }
    s.push_row(Vec::<String>::new());

    s.push_row(["부정 리뷰 매장", "부정 건수", "1점", "2점", "3점", "4점", "주요 키워드", "샘플"]);
    for store in &agg.negative_stores {
        let [r1, r2, r3, r4] = store.rating_breakdown;
        s.push_row([
            store.store_name.clone(),
            store.negative_count.to_string(),
            r1.to_string(),
            r2.to_string(),
            r3.to_string(),
            r4.to_string(),
            store.top_keywords.join(", "),
            store.samples.join(" / "),
        ]);
    }
    s
}

fn stores(agg: &BrandWeeklyAggregation) -> ReportSection {
    let mut s = ReportSection::new(
        STORES,
        &[
            "store_name",
            "total_reviews",
            "positive",
            "negative",
            "neutral",
            "positive_rate",
            "negative_rate",
            "avg_rating",
            "top_keywords",
            "action_needed",
        ],
    );
    for st in &agg.store_stats {
        s.push_row([
            st.store_name.clone(),
            st.total().to_string(),
            st.sentiment.positive.to_string(),
            st.sentiment.negative.to_string(),
            st.sentiment.neutral.to_string(),
            st.sentiment.positive_rate(),
            st.sentiment.negative_rate(),
            st.avg_rating.to_string(),
            st.top_keywords.join(", "),
            if st.action_needed {
                "부정비율 높음".to_string()
            } else {
                String::new()
            },
        ]);
    }
    s
}

fn keywords(agg: &BrandWeeklyAggregation) -> ReportSection {
    let mut s = ReportSection::new(
        KEYWORDS,
        &[
            "rank",
            "keyword",
            "total_count",
            "positive_count",
            "negative_count",
            "neutral_count",
            "main_sentiment",
            "sentiment_ratio",
            "trend_vs_last_week",
        ],
    );
    for (i, kw) in agg.keyword_table.iter().enumerate() {
        s.push_row([
            (i + 1).to_string(),
            kw.keyword.clone(),
            kw.total.to_string(),
            kw.sentiment.positive.to_string(),
            kw.sentiment.negative.to_string(),
            kw.sentiment.neutral.to_string(),
            kw.dominant.korean_label().to_string(),
            kw.ratio_label(),
            kw.trend_label(),
        ]);
    }
    s
}

fn negative_reviews(agg: &BrandWeeklyAggregation) -> ReportSection {
    let mut s = ReportSection::new(
        NEGATIVE_REVIEWS,
        &[
            "received_at",
            "store_name",
            "platform",
            "rating",
            "summary",
            "keywords",
            "original_text",
            "priority",
        ],
    );
    for r in &agg.negative_reviews {
        s.push_row([
            r.received_at.clone(),
            r.store_name.clone(),
            r.platform.clone(),
            r.rating.to_string(),
            r.summary.clone(),
            r.keywords.join(", "),
            r.text.clone(),
            r.priority.label().to_string(),
        ]);
    }
    s
}

fn platforms(agg: &BrandWeeklyAggregation) -> ReportSection {
    let mut s = ReportSection::new(
        PLATFORMS,
        &[
            "platform",
            "total_reviews",
            "positive",
            "negative",
            "neutral",
            "positive_rate",
            "avg_rating",
            "top_keywords",
        ],
    );
    for p in &agg.platform_stats {
        s.push_row([
            p.platform.clone(),
            p.total().to_string(),
            p.sentiment.positive.to_string(),
            p.sentiment.negative.to_string(),
            p.sentiment.neutral.to_string(),
            p.sentiment.positive_rate(),
            p.avg_rating.to_string(),
            p.top_keywords.join(", "),
        ]);
    }
    s
}

fn raw_data(agg: &BrandWeeklyAggregation) -> ReportSection {
    let mut s = ReportSection::new(
        RAW_DATA,
        &[
            "received_at",
            "store_name",
            "platform",
            "rating",
            "review_text",
            "sentiment",
            "summary",
            "keywords",
        ],
    );
    for r in &agg.raw {
        s.push_row([
            r.received_at.as_ref().map(format_timestamp).unwrap_or_default(),
            r.store_name.clone(),
            r.platform.clone(),
            r.rating.to_string(),
            r.review_text.clone(),
            r.effective_sentiment().korean_label().to_string(),
            r.summary.clone(),
            r.keywords.join(", "),
        ]);
    }
    s
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use revdoc_core::{parse_timestamp, ReviewRecord, ReviewStatus, Sentiment};
    use revdoc_store::MemoryStore;

    use super::*;
    use crate::aggregate_brand;

    fn review(store: &str, rating: u8, sentiment: Sentiment) -> ReviewRecord {
        ReviewRecord {
            received_at: parse_timestamp("2025-01-07T12:00:00+09:00"),
            review_created_at: String::new(),
            brand_name: "Foo".into(),
            store_name: store.into(),
            platform: "PlatformX".into(),
            rating: f64::from(rating),
            review_id: store.into(),
            review_text: "text".into(),
            status: ReviewStatus::Done,
            sentiment: Some(sentiment),
            summary: "sum".into(),
            keywords: vec!["바삭".into()],
            processed_at: None,
            attempts: 0,
            review_url: String::new(),
            image_url: String::new(),
        }
    }

    fn week() -> WeekRange {
        WeekRange::containing(chrono::NaiveDate::from_ymd_opt(2025, 1, 8).unwrap())
    }

    #[test]
    fn sections_come_in_fixed_order() {
        let agg = aggregate_brand("Foo", &week().label(), &[], None);
        let titles: Vec<_> = build_sections(&agg, &now_kst())
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(
            titles,
            vec![OVERVIEW, STORES, KEYWORDS, NEGATIVE_REVIEWS, PLATFORMS, RAW_DATA]
        );
    }

    #[test]
    fn overview_shows_dash_without_prior_week() {
        let agg = aggregate_brand("Foo", &week().label(), &[], None);
        let overview = &build_sections(&agg, &now_kst())[0];
        let total_row = overview
            .rows
            .iter()
            .find(|r| r.first().is_some_and(|c| c == "총 리뷰 수"))
            .unwrap();
        assert_eq!(total_row[1], "0건");
        assert_eq!(total_row[4], "-");
    }

    #[test]
    fn tables_have_one_row_per_item() {
        let reviews = vec![
            review("원주점", 5, Sentiment::Positive),
            review("강릉점", 1, Sentiment::Negative),
        ];
        let agg = aggregate_brand("Foo", &week().label(), &reviews, None);
        let sections = build_sections(&agg, &now_kst());
        assert_eq!(sections[1].rows.len(), 2);
        assert_eq!(sections[2].rows.len(), 1);
        assert_eq!(sections[3].rows.len(), 1);
        assert_eq!(sections[3].rows[0][7], "🔴 높음");
        assert_eq!(sections[4].rows.len(), 1);
        assert_eq!(sections[5].rows.len(), 2);
        assert_eq!(sections[5].rows[0][5], "긍정");
    }

    #[tokio::test]
    async fn assemble_writes_every_section_under_brand_folder() {
        let store = Arc::new(MemoryStore::new());
        let assembler = ReportAssembler::new(store.clone(), "WeeklyReports");
        let agg = aggregate_brand(
            "Foo",
            &week().label(),
            &[review("원주점", 4, Sentiment::Positive)],
            None,
        );

        let artifact = assembler.assemble(&agg, &week()).await.unwrap();
        assert_eq!(artifact.name, "Foo_Weekly_2025-01-06_2025-01-12");
        let stored = store.artifact(&artifact.id).unwrap();
        assert_eq!(stored.folder, vec!["WeeklyReports", "Foo", "2025", "01월"]);
        assert_eq!(stored.sections.len(), 6);
        assert_eq!(stored.sections[&0].title, OVERVIEW);
    }

    struct FailingSink;

    #[async_trait]
    impl ReportSink for FailingSink {
        async fn create_artifact(
            &self,
            _folder: &[String],
            name: &str,
        ) -> Result<ArtifactRef, StoreError> {
            Ok(ArtifactRef {
                id: "x".into(),
                name: name.into(),
                location: name.into(),
            })
        }

        async fn write_section(
            &self,
            _artifact: &ArtifactRef,
            index: usize,
            _section: &ReportSection,
        ) -> Result<(), StoreError> {
            if index == 2 {
                return Err(StoreError::Unavailable("rate limited".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn section_failure_fails_the_report() {
        let assembler = ReportAssembler::new(Arc::new(FailingSink), "WeeklyReports");
        let agg = aggregate_brand("Foo", &week().label(), &[], None);
        let err = assembler.assemble(&agg, &week()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
