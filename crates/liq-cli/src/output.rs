//! Table rendering for command results

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use liq_engine::{Prediction, SentimentReport, TechnicalReport};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn technical(report: &TechnicalReport) -> String {
    let mut summary = table(vec!["Price", "24h change", "Volume (buy / sell)", "Sentiment", "Range"]);
    summary.add_row(vec![
        format!("{:.4}", report.price_24h.current),
        format!(
            "{:+.4} ({:+.2}%)",
            report.price_24h.change, report.price_24h.change_percentage
        ),
        format!(
            "{:.0} ({:.0} / {:.0})",
            report.volume_24h.total, report.volume_24h.buy, report.volume_24h.sell
        ),
        format!("{:+.3}", report.sentiment),
        format!(
            "{:.4} - {:.4} ({:.0}%)",
            report.price_range.low,
            report.price_range.high,
            report.price_range.confidence * 100.0
        ),
    ]);

    let mut indicators = table(vec!["Indicator", "Value", "Signal", "Confidence", "Description"]);
    for indicator in &report.indicators {
        indicators.add_row(vec![
            indicator.name.clone(),
            format!("{:.4}", indicator.value),
            format!("{:?}", indicator.signal).to_lowercase(),
            format!("{:.2}", indicator.confidence),
            indicator.description.clone(),
        ]);
    }

    format!("{summary}\n{indicators}")
}

pub fn sentiment(report: &SentimentReport) -> String {
    let analysis = &report.analysis;
    let mut summary = table(vec!["Score", "Sentiment", "Confidence", "Impact (short / long)"]);
    summary.add_row(vec![
        format!("{:.3}", analysis.score),
        analysis.sentiment.to_string(),
        format!("{:.2}", analysis.confidence),
        format!(
            "{:.2} / {:.2}",
            analysis.impact.short_term, analysis.impact.long_term
        ),
    ]);

    let mut headlines = table(vec!["Headline", "Sentiment"]);
    for item in &report.news.headlines {
        headlines.add_row(vec![item.title.clone(), item.sentiment.to_string()]);
    }

    format!("{summary}\n{headlines}")
}

pub fn prediction(prediction: &Prediction) -> String {
    let mut out = table(vec!["Low", "High", "Confidence", "Source", "At"]);
    out.add_row(vec![
        format!("{:.4}", prediction.range_low),
        format!("{:.4}", prediction.range_high),
        format!("{:.0}%", prediction.confidence),
        format!("{:?}", prediction.source).to_lowercase(),
        prediction.timestamp.to_rfc3339(),
    ]);

    match &prediction.explanation {
        Some(explanation) => format!("{out}\n{explanation}"),
        None => out.to_string(),
    }
}
