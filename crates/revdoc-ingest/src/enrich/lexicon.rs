//! Lexicon-based enricher for Korean and English delivery-app reviews.

use async_trait::async_trait;
use revdoc_core::{Enrichment, EnrichmentContext, Sentiment};

use super::{Enricher, MAX_KEYWORDS};
use crate::EnrichError;

/// Word weights. Values in `(0.0, 1.0]` are positive, in `[-1.0, 0.0)` are
/// negative. Korean stems are matched as substrings, English words as tokens.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("맛있", 0.5),
    ("최고", 0.5),
    ("친절", 0.4),
    ("빠르", 0.3),
    ("바삭", 0.3),
    ("신선", 0.3),
    ("추천", 0.4),
    ("만족", 0.4),
    ("재주문", 0.5),
    ("푸짐", 0.3),
    ("good", 0.3),
    ("great", 0.4),
    ("delicious", 0.5),
    ("fresh", 0.3),
    ("friendly", 0.4),
    ("fast", 0.3),
    ("love", 0.5),
    ("best", 0.5),
    // Negative signals
    ("별로", -0.4),
    ("최악", -0.7),
    ("늦", -0.3),
    ("식었", -0.4),
    ("차갑", -0.3),
    ("짜요", -0.3),
    ("불친절", -0.6),
    ("눅눅", -0.4),
    ("이물질", -0.8),
    ("머리카락", -0.7),
    ("환불", -0.5),
    ("실망", -0.5),
    ("알러지", -0.6),
    ("배탈", -0.7),
    ("bad", -0.4),
    ("cold", -0.3),
    ("late", -0.3),
    ("rude", -0.5),
    ("terrible", -0.6),
    ("worst", -0.6),
    ("refund", -0.4),
];

const SENTIMENT_CUTOFF: f32 = 0.15;
const RATING_WEIGHT: f32 = 0.15;
const SUMMARY_CHARS: usize = 40;

fn is_ascii_word(word: &str) -> bool {
    word.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Matched lexicon words in lexicon order, with the clamped score.
fn score_text(text: &str) -> (f32, Vec<&'static str>) {
    let lower = text.to_lowercase();
    let tokens: Vec<String> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()).to_string())
        .collect();

    let mut score = 0.0_f32;
    let mut matched = Vec::new();
    for &(word, weight) in LEXICON {
        let hit = if is_ascii_word(word) {
            tokens.iter().any(|t| t == word)
        } else {
            // "불친절" must not also count as "친절".
            lower.contains(word)
                && !(word == "친절" && lower.matches("친절").count() == lower.matches("불친절").count())
        };
        if hit {
            score += weight;
            matched.push(word);
        }
    }
    (score.clamp(-1.0, 1.0), matched)
}

fn summarize(text: &str) -> String {
    let first = text
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    first.chars().take(SUMMARY_CHARS).collect()
}

/// Local [`Enricher`] that needs no external service.
///
/// The star rating nudges the text score: each star above or below 3 adds
/// or subtracts a fixed weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconEnricher;

impl LexiconEnricher {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn analyze(text: &str, rating: f64) -> Enrichment {
        let (text_score, matched) = score_text(text);
        let rating_bias = if rating <= 0.0 {
            0.0
        } else {
            (rating as f32 - 3.0) * RATING_WEIGHT
        };
        let score = (text_score + rating_bias).clamp(-1.0, 1.0);

        let sentiment = if score > SENTIMENT_CUTOFF {
            Sentiment::Positive
        } else if score < -SENTIMENT_CUTOFF {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        };

        Enrichment {
            sentiment,
            summary: summarize(text),
            keywords: matched
                .into_iter()
                .take(MAX_KEYWORDS)
                .map(str::to_string)
                .collect(),
        }
    }
}

#[async_trait]
impl Enricher for LexiconEnricher {
    async fn enrich(
        &self,
        text: &str,
        context: &EnrichmentContext,
    ) -> Result<Enrichment, EnrichError> {
        Ok(Self::analyze(text, context.rating))
    }
}
