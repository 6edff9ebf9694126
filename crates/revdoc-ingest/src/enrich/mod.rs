//! Sentiment/keyword enrichment: collaborator contract, output validation,
//! the pending-row batch, and a local lexicon implementation.

mod batch;
mod lexicon;

use async_trait::async_trait;
use revdoc_core::{Enrichment, EnrichmentContext, Sentiment};

use crate::EnrichError;

pub use batch::{EnrichmentBatch, EnrichmentSettings, EnrichmentSummary};
pub use lexicon::LexiconEnricher;

pub const MAX_KEYWORDS: usize = 5;

/// Produces sentiment, a one-line summary, and keywords for a review text.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(
        &self,
        text: &str,
        context: &EnrichmentContext,
    ) -> Result<Enrichment, EnrichError>;
}

/// Map a collaborator's free-form sentiment label; anything unrecognized is neutral.
#[must_use]
pub fn sentiment_from_label(label: &str) -> Sentiment {
    Sentiment::parse(label).unwrap_or(Sentiment::Neutral)
}

/// Trim the summary and keywords, drop blank or repeated keywords, keep at
/// most [`MAX_KEYWORDS`].
#[must_use]
pub fn sanitize_enrichment(raw: Enrichment) -> Enrichment {
    let mut keywords: Vec<String> = Vec::with_capacity(MAX_KEYWORDS);
    for keyword in raw.keywords.iter().map(|k| k.trim()) {
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
        if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    Enrichment {
        sentiment: raw.sentiment,
        summary: raw.summary.trim().to_string(),
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_is_neutral() {
        assert_eq!(sentiment_from_label("부정"), Sentiment::Negative);
        assert_eq!(sentiment_from_label("positive"), Sentiment::Positive);
        assert_eq!(sentiment_from_label("매우좋음"), Sentiment::Neutral);
    }

    #[test]
    fn sanitize_trims_dedups_and_caps() {
        let raw = Enrichment {
            sentiment: Sentiment::Positive,
            summary: "  맛있어요 ".to_string(),
            keywords: ["맛", " 맛 ", "", "양", "배달", "친절", "가격", "포장"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        };
        let clean = sanitize_enrichment(raw);
        assert_eq!(clean.summary, "맛있어요");
        assert_eq!(clean.keywords, vec!["맛", "양", "배달", "친절", "가격"]);
    }
}
