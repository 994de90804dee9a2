//! User messages for the analysis tasks

use serde_json::json;

use crate::model::{HeadlineItem, MarketSnapshot, NewsAnalysis, TechnicalAnalysis};

/// Snapshot plus the deterministic indicator readings
pub fn technical_request(snapshot: &MarketSnapshot, deterministic: &TechnicalAnalysis) -> String {
    json!({
        "snapshot": snapshot,
        "indicators": deterministic.indicators,
        "overallSentiment": deterministic.overall_sentiment,
        "priceRange": deterministic.price_range,
    })
    .to_string()
}

/// Classified headlines
pub fn news_request(headlines: &[HeadlineItem]) -> String {
    json!({ "headlines": headlines }).to_string()
}

/// Current price with both analyses
pub fn prediction_request(
    price: f64,
    technical: &TechnicalAnalysis,
    news: &NewsAnalysis,
) -> String {
    json!({
        "price": price,
        "technical": technical,
        "news": news,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;
    use serde_json::Value;

    #[test]
    fn test_news_request_is_json() {
        let mut item = HeadlineItem::new("Mainnet launch", "https://x");
        item.sentiment = Sentiment::Positive;

        let message: Value = serde_json::from_str(&news_request(&[item])).unwrap();
        assert_eq!(message["headlines"][0]["title"], "Mainnet launch");
        assert_eq!(message["headlines"][0]["sentiment"], "positive");
    }
}
