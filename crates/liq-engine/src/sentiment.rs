//! Lexical headline sentiment
//!
//! Headlines are tokenized, matched against disjoint positive and negative
//! word lists, and each match is flipped when a negation or contrast word
//! appears in the few tokens before it ("not", "without", "despite", ...).

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{HeadlineItem, Impact, NewsAnalysis, Sentiment};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9]+(?:['’][a-z]+)?").expect("token pattern is valid")
});

const POSITIVE_TERMS: &[&str] = &[
    "adopt", "adopts", "adoption", "approval", "approve", "approved", "approves", "boost",
    "boosts", "boosted", "breakout", "breakthrough", "bullish", "expands", "expansion", "gain",
    "gains", "growth", "inflow", "inflows", "integration", "integrates", "launch", "launches",
    "launched", "listing", "mainnet", "milestone", "outperform", "outperforms", "partnership",
    "partnerships", "rally", "rallies", "rebound", "rebounds", "record", "recovers", "recovery",
    "soar", "soars", "strong", "success", "successful", "support", "supports", "surge",
    "surges", "upgrade", "upgrades", "win", "wins",
];

const NEGATIVE_TERMS: &[&str] = &[
    "attack", "ban", "banned", "bans", "bankrupt", "bankruptcy", "bearish", "breach", "bug",
    "collapse", "collapses", "concern", "concerns", "crackdown", "crash", "crashes", "decline",
    "declines", "delist", "delisted", "delisting", "drop", "drops", "dump", "dumps", "exploit",
    "exploited", "fear", "fears", "fine", "fined", "fraud", "hack", "hacked", "hacks", "halt",
    "halted", "halts", "insolvency", "investigation", "lawsuit", "liquidation", "liquidations",
    "loss", "losses", "outage", "outflow", "outflows", "plunge", "plunges", "probe", "risk",
    "risks", "risky", "sanctions", "scam", "slump", "slumps", "stolen", "sue", "sues", "suffer",
    "suffers", "theft", "vulnerability", "warning", "warns", "weak",
];

const MODIFIERS: &[&str] = &[
    "not", "no", "never", "nor", "without", "despite", "hardly", "isn't", "wasn't", "aren't",
    "doesn't", "didn't", "won't", "cannot", "denies", "denied", "avoid", "avoids", "avoided",
];

/// Lexical sentiment classifier and aggregator
#[derive(Debug, Clone, Copy)]
pub struct SentimentScorer {
    /// |polarity| above which a headline is non-neutral
    threshold: f64,
    /// Tokens before a match inspected for modifiers
    window: usize,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            window: 3,
        }
    }
}

impl SentimentScorer {
    pub fn new(threshold: f64, window: usize) -> Self {
        Self { threshold, window }
    }

    /// Classify a single piece of text
    pub fn classify(&self, text: &str) -> Sentiment {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN.find_iter(&lowered).map(|m| m.as_str()).collect();

        let mut positive = 0_u32;
        let mut negative = 0_u32;
        for (i, token) in tokens.iter().enumerate() {
            let mut polarity = if POSITIVE_TERMS.contains(token) {
                1
            } else if NEGATIVE_TERMS.contains(token) {
                -1
            } else {
                continue;
            };

            let start = i.saturating_sub(self.window);
            if tokens[start..i].iter().any(|w| MODIFIERS.contains(w)) {
                polarity = -polarity;
            }

            if polarity > 0 {
                positive += 1;
            } else {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 {
            return Sentiment::Neutral;
        }

        let polarity = (f64::from(positive) - f64::from(negative)) / f64::from(total);
        if polarity > self.threshold {
            Sentiment::Positive
        } else if polarity < -self.threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Fill in the sentiment of each headline from its title
    pub fn classify_headlines(&self, headlines: Vec<HeadlineItem>) -> Vec<HeadlineItem> {
        headlines
            .into_iter()
            .map(|mut item| {
                item.sentiment = self.classify(&item.title);
                item
            })
            .collect()
    }

    /// Deterministic news analysis over already-classified headlines
    pub fn analyze(&self, headlines: &[HeadlineItem]) -> NewsAnalysis {
        let score = aggregate(headlines.iter().map(|h| h.sentiment));

        let confidence = if headlines.is_empty() {
            0.0
        } else {
            let net: i32 = headlines
                .iter()
                .map(|h| i32::from(h.sentiment.direction()))
                .sum();
            0.4 + 0.5 * f64::from(net.unsigned_abs()) / headlines.len() as f64
        };

        let short_term = (2.0 * score - 1.0).abs();
        NewsAnalysis {
            score,
            sentiment: sentiment_from_score(score),
            confidence,
            impact: Impact {
                short_term,
                long_term: short_term / 2.0,
            },
        }
    }
}

/// Mean of +1/-1/0 rescaled to [0, 1]; 0.5 for no items
pub fn aggregate(items: impl IntoIterator<Item = Sentiment>) -> f64 {
    let (sum, count) = items
        .into_iter()
        .fold((0_i64, 0_u32), |(sum, count), s| {
            (sum + i64::from(s.direction()), count + 1)
        });
    if count == 0 {
        return 0.5;
    }
    let mean = sum as f64 / f64::from(count);
    ((mean + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Scores within this distance of a threshold count as on it
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Label for an aggregate score
pub fn sentiment_from_score(score: f64) -> Sentiment {
    if score > 0.6 + THRESHOLD_EPSILON {
        Sentiment::Positive
    } else if score < 0.4 - THRESHOLD_EPSILON {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reference_headlines() {
        let scorer = SentimentScorer::default();
        assert_eq!(
            scorer.classify("Major partnership and mainnet launch boosts adoption"),
            Sentiment::Positive
        );
        assert_eq!(
            scorer.classify("Exchange suffers hack, funds at risk"),
            Sentiment::Negative
        );
        assert_eq!(
            scorer.classify("Routine network maintenance update"),
            Sentiment::Neutral
        );
    }

    #[test]
    fn test_case_insensitive() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.classify("ETH SURGES AFTER UPGRADE"), Sentiment::Positive);
    }

    #[test]
    fn test_negation_flips_contribution() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.classify("Bridge was not hacked"), Sentiment::Positive);
        assert_eq!(scorer.classify("Price rallies despite lawsuit"), Sentiment::Positive);
        assert_eq!(scorer.classify("Upgrade delayed without approval"), Sentiment::Neutral);
    }

    #[test]
    fn test_modifier_outside_window_is_ignored() {
        let scorer = SentimentScorer::default();
        assert_eq!(
            scorer.classify("Not one of the big exchanges but suffers hack"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_mixed_headline_is_neutral() {
        let scorer = SentimentScorer::default();
        assert_eq!(scorer.classify("Rally fades into crash"), Sentiment::Neutral);
    }

    #[test]
    fn test_term_sets_are_disjoint() {
        for term in POSITIVE_TERMS {
            assert!(!NEGATIVE_TERMS.contains(term), "{term} in both sets");
            assert!(!MODIFIERS.contains(term), "{term} is also a modifier");
        }
        for term in NEGATIVE_TERMS {
            assert!(!MODIFIERS.contains(term), "{term} is also a modifier");
        }
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(aggregate([Sentiment::Positive, Sentiment::Negative]), 0.5);
        assert_eq!(aggregate([Sentiment::Positive, Sentiment::Positive]), 1.0);
        assert_eq!(aggregate([Sentiment::Negative]), 0.0);
        assert_eq!(aggregate([Sentiment::Positive, Sentiment::Neutral]), 0.75);
        assert_eq!(aggregate(Vec::new()), 0.5);
    }

    #[test]
    fn test_sentiment_thresholds_are_exclusive() {
        assert_eq!(sentiment_from_score(0.6), Sentiment::Neutral);
        assert_eq!(sentiment_from_score((0.8 + 0.4) / 2.0), Sentiment::Neutral);
        assert_eq!(sentiment_from_score(0.4), Sentiment::Neutral);
        assert_eq!(sentiment_from_score((0.2 + 0.6) / 2.0), Sentiment::Neutral);
        assert_eq!(sentiment_from_score(0.61), Sentiment::Positive);
        assert_eq!(sentiment_from_score(0.39), Sentiment::Negative);
    }

    #[test]
    fn test_analyze_headlines() {
        let scorer = SentimentScorer::default();
        let headlines = scorer.classify_headlines(vec![
            HeadlineItem::new("Mainnet launch boosts adoption", "https://a"),
            HeadlineItem::new("ETF inflows surge to record", "https://b"),
            HeadlineItem::new("Routine network maintenance update", "https://c"),
        ]);

        assert_eq!(headlines[0].sentiment, Sentiment::Positive);
        assert_eq!(headlines[2].sentiment, Sentiment::Neutral);

        let analysis = scorer.analyze(&headlines);
        assert!((analysis.score - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(analysis.sentiment, Sentiment::Positive);
        assert!((0.0..=1.0).contains(&analysis.confidence));
        assert!(analysis.impact.long_term < analysis.impact.short_term);
    }

    #[test]
    fn test_analyze_without_headlines() {
        let analysis = SentimentScorer::default().analyze(&[]);
        assert_eq!(analysis.score, 0.5);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.confidence, 0.0);
        assert_eq!(analysis.impact.short_term, 0.0);
    }
}
