//! Indicator engine
//!
//! Computes the fixed set of eight indicators from a single
//! [`MarketSnapshot`]. There is no price history here, so every formula is a
//! closed-form function of the current price, the 24h change and the 24h
//! volume. The previous close is recovered as `p0 = p / (1 + change/100)`
//! and the moving averages are the one-step update from `p0` towards `p`.
//!
//! The engine never fails: a degenerate snapshot (price <= 0 or NaN) yields
//! eight neutral, zero-confidence entries, and a missing volume only degrades
//! VPVR.

use tracing::warn;

use crate::model::{
    Indicator, IndicatorKind, MarketSnapshot, Price24h, PriceRange, Signal, TechnicalAnalysis,
    TechnicalReport, Volume24h, INDICATOR_COUNT, non_zero_sentiment,
};

const EMA_PERIOD: usize = 20;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MAX_EMA_DEVIATION: f64 = 0.05;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;
const STOCH_OVERBOUGHT: f64 = 80.0;
const STOCH_OVERSOLD: f64 = 20.0;

const BB_STD_DEV: f64 = 0.01;
const BB_WIDTH_FACTOR: f64 = 2.0;

const ATR_MIN_RATIO: f64 = 0.01;
const ATR_MAX_RATIO: f64 = 0.03;
const ATR_HIGH_BAND: f64 = 0.025;
const ATR_LOW_BAND: f64 = 0.012;

const FIB_RATIO: f64 = 0.618;
const FIB_MIN_SWING: f64 = 0.02;

const VPVR_HIGH_TURNOVER: f64 = 0.10;
const VPVR_LOW_TURNOVER: f64 = 0.02;
const VPVR_HIGH_VOLUME: f64 = 1e9;
const VPVR_LOW_VOLUME: f64 = 1e7;

/// Confidence carried by every neutral signal
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Minimum half-width of the deterministic price range, as a fraction of price
const MIN_RANGE_SPREAD: f64 = 0.05;

/// Price range emitted when the snapshot price is unusable
const DEGENERATE_RANGE: PriceRange = PriceRange {
    low: 1e-8,
    high: 2e-8,
    confidence: 0.0,
};

/// Deterministic indicator calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine {
    /// Let RSI span the full [0, 100] range instead of [20, 80]
    strict_rsi: bool,
}

impl IndicatorEngine {
    pub fn new(strict_rsi: bool) -> Self {
        Self { strict_rsi }
    }

    /// Compute all eight indicators
    pub fn compute(&self, snapshot: &MarketSnapshot) -> [Indicator; INDICATOR_COUNT] {
        if snapshot.is_degenerate() {
            warn!(
                price = snapshot.price,
                "Degenerate snapshot, emitting neutral indicators"
            );
            return IndicatorKind::ALL.map(|kind| Indicator::degenerate(kind, "invalid price"));
        }

        let inputs = Inputs::from_snapshot(snapshot);
        IndicatorKind::ALL.map(|kind| match kind {
            IndicatorKind::Ema => ema(&inputs),
            IndicatorKind::Macd => macd(&inputs),
            IndicatorKind::Rsi => rsi(&inputs, self.strict_rsi),
            IndicatorKind::StochRsi => stoch_rsi(&inputs),
            IndicatorKind::BollingerBands => bollinger(&inputs),
            IndicatorKind::Atr => atr(&inputs),
            IndicatorKind::Fibonacci => fibonacci(&inputs),
            IndicatorKind::Vpvr => vpvr(snapshot, &inputs),
        })
    }

    /// Compute indicators plus overall sentiment and price range
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> TechnicalAnalysis {
        let indicators = self.compute(snapshot);

        if snapshot.is_degenerate() {
            return TechnicalAnalysis {
                indicators,
                overall_sentiment: non_zero_sentiment(0.0),
                price_range: DEGENERATE_RANGE,
            };
        }

        let overall_sentiment = overall_sentiment(&indicators);
        let price_range = deterministic_range(snapshot.price, &indicators);

        TechnicalAnalysis {
            indicators,
            overall_sentiment,
            price_range,
        }
    }
}

/// Confidence-weighted vote over all indicators, never exactly zero
pub fn overall_sentiment(indicators: &[Indicator]) -> f64 {
    if indicators.is_empty() {
        return non_zero_sentiment(0.0);
    }
    let sum: f64 = indicators
        .iter()
        .map(|i| f64::from(i.signal.direction()) * i.confidence)
        .sum();
    non_zero_sentiment(sum / indicators.len() as f64)
}

/// Band of `max(2 * ATR/price, 5%)` on either side of the price
fn deterministic_range(price: f64, indicators: &[Indicator]) -> PriceRange {
    let atr_ratio = indicators
        .iter()
        .find(|i| i.name == IndicatorKind::Atr.name())
        .map_or(ATR_MIN_RATIO, |i| i.value / price);
    let spread = (2.0 * atr_ratio).max(MIN_RANGE_SPREAD);
    let confidence =
        indicators.iter().map(|i| i.confidence).sum::<f64>() / indicators.len().max(1) as f64;

    PriceRange {
        low: price * (1.0 - spread),
        high: price * (1.0 + spread),
        confidence: confidence.clamp(0.0, 1.0),
    }
}

/// Assemble the produced report from a snapshot and its (merged) analysis
///
/// The buy/sell volume split leans towards the side of the 24h move, by at
/// most 25 points either way. The reported change is the source value; the
/// cap applied by the indicator math does not leak into it.
pub fn build_report(snapshot: &MarketSnapshot, analysis: &TechnicalAnalysis) -> TechnicalReport {
    let change_pct = effective_change(snapshot.price_change_24h);
    let reported_pct = if snapshot.price_change_24h.is_finite() {
        snapshot.price_change_24h
    } else {
        0.0
    };
    let change = if snapshot.is_degenerate() {
        0.0
    } else if reported_pct > -100.0 {
        snapshot.price - previous_close(snapshot.price, reported_pct)
    } else {
        snapshot.price - previous_close(snapshot.price, change_pct)
    };
    let total = if snapshot.has_volume() {
        snapshot.volume_24h
    } else {
        0.0
    };
    let buy_share = 0.5 + (change_pct / 200.0).clamp(-0.25, 0.25);

    TechnicalReport {
        price_24h: Price24h {
            current: snapshot.price,
            change,
            change_percentage: reported_pct,
        },
        volume_24h: Volume24h {
            total,
            buy: total * buy_share,
            sell: total * (1.0 - buy_share),
        },
        indicators: analysis.indicators.clone(),
        sentiment: analysis.overall_sentiment,
        price_range: analysis.price_range,
    }
}

/// Derived quantities shared by the formulas
struct Inputs {
    price: f64,
    prev_close: f64,
    change_pct: f64,
}

impl Inputs {
    fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        let change_pct = effective_change(snapshot.price_change_24h);
        Self {
            price: snapshot.price,
            prev_close: previous_close(snapshot.price, change_pct),
            change_pct,
        }
    }
}

/// NaN change counts as flat; extreme moves are capped
fn effective_change(change_pct: f64) -> f64 {
    if change_pct.is_finite() {
        change_pct.clamp(-50.0, 100.0)
    } else {
        0.0
    }
}

fn previous_close(price: f64, change_pct: f64) -> f64 {
    price / (1.0 + change_pct / 100.0)
}

fn one_step_ema(prev: f64, price: f64, period: usize) -> f64 {
    let alpha = 2.0 / (period as f64 + 1.0);
    prev + alpha * (price - prev)
}

/// How far past a threshold, as a fraction of `full_scale`, saturating at 1
fn strength(excess: f64, full_scale: f64) -> f64 {
    (excess / full_scale).clamp(0.0, 1.0)
}

/// Sell above `upper`, buy below `lower`; confidence saturates at `ceil` / `floor`
fn band_signal(value: f64, lower: f64, upper: f64, floor: f64, ceil: f64) -> (Signal, f64) {
    if value > upper {
        (Signal::Sell, strength(value - upper, (ceil - upper).max(f64::EPSILON)))
    } else if value < lower {
        (Signal::Buy, strength(lower - value, (lower - floor).max(f64::EPSILON)))
    } else {
        (Signal::Neutral, NEUTRAL_CONFIDENCE)
    }
}

fn ema(inputs: &Inputs) -> Indicator {
    let p = inputs.price;
    let value = one_step_ema(inputs.prev_close, p, EMA_PERIOD)
        .clamp(p * (1.0 - MAX_EMA_DEVIATION), p * (1.0 + MAX_EMA_DEVIATION));
    let deviation = (p - value) / p;

    let (signal, confidence) = if deviation.abs() < 0.001 {
        (Signal::Neutral, NEUTRAL_CONFIDENCE)
    } else if deviation > 0.0 {
        (Signal::Buy, strength(deviation - 0.001, 0.02))
    } else {
        (Signal::Sell, strength(-deviation - 0.001, 0.02))
    };

    Indicator::new(
        IndicatorKind::Ema,
        value,
        signal,
        confidence,
        format!(
            "EMA({EMA_PERIOD}) at {value:.4}, price {:.2}% {}",
            deviation.abs() * 100.0,
            if deviation >= 0.0 { "above" } else { "below" }
        ),
    )
}

fn macd(inputs: &Inputs) -> Indicator {
    let p = inputs.price;
    let fast = one_step_ema(inputs.prev_close, p, MACD_FAST);
    let slow = one_step_ema(inputs.prev_close, p, MACD_SLOW);
    let value = fast - slow;
    let relative = value / p;

    let (signal, confidence) = if relative.abs() < 0.0005 {
        (Signal::Neutral, NEUTRAL_CONFIDENCE)
    } else if relative > 0.0 {
        (Signal::Buy, strength(relative - 0.0005, 0.005))
    } else {
        (Signal::Sell, strength(-relative - 0.0005, 0.005))
    };

    let trend = match signal {
        Signal::Buy => "bullish",
        Signal::Sell => "bearish",
        Signal::Neutral => "flat",
    };
    Indicator::new(
        IndicatorKind::Macd,
        value,
        signal,
        confidence,
        format!("MACD({MACD_FAST},{MACD_SLOW}) {value:.4}, momentum {trend}"),
    )
}

fn rsi(inputs: &Inputs, strict: bool) -> Indicator {
    let (amplitude, floor, ceil) = if strict {
        (50.0, 0.0, 100.0)
    } else {
        (30.0, 20.0, 80.0)
    };
    let value = 50.0 + amplitude * (inputs.change_pct / 10.0).tanh();
    let (signal, confidence) = band_signal(value, RSI_OVERSOLD, RSI_OVERBOUGHT, floor, ceil);

    let zone = match signal {
        Signal::Sell => "overbought",
        Signal::Buy => "oversold",
        Signal::Neutral => "neutral zone",
    };
    Indicator::new(
        IndicatorKind::Rsi,
        value,
        signal,
        confidence,
        format!("RSI {value:.1} ({zone})"),
    )
}

fn stoch_rsi(inputs: &Inputs) -> Indicator {
    let value = 50.0 + 35.0 * (inputs.change_pct / 5.0).tanh();
    let (signal, confidence) = band_signal(value, STOCH_OVERSOLD, STOCH_OVERBOUGHT, 15.0, 85.0);

    Indicator::new(
        IndicatorKind::StochRsi,
        value,
        signal,
        confidence,
        format!("Stochastic RSI {value:.1}"),
    )
}

fn bollinger(inputs: &Inputs) -> Indicator {
    let p = inputs.price;
    let middle = (p + inputs.prev_close) / 2.0;
    let width = middle * BB_STD_DEV * BB_WIDTH_FACTOR;
    let upper = middle + width;
    let lower = middle - width;
    let (signal, confidence) = band_signal(p, lower, upper, lower - width, upper + width);

    let position = match signal {
        Signal::Sell => "above upper band",
        Signal::Buy => "below lower band",
        Signal::Neutral => "inside bands",
    };
    Indicator::new(
        IndicatorKind::BollingerBands,
        middle,
        signal,
        confidence,
        format!("Bands {lower:.4} / {middle:.4} / {upper:.4}, price {position}"),
    )
}

fn atr(inputs: &Inputs) -> Indicator {
    let ratio = (ATR_MIN_RATIO + inputs.change_pct.abs() / 100.0 * 0.5)
        .clamp(ATR_MIN_RATIO, ATR_MAX_RATIO);
    let value = inputs.price * ratio;

    let (signal, confidence) = if ratio >= ATR_HIGH_BAND {
        (
            Signal::Sell,
            strength(ratio - ATR_HIGH_BAND, ATR_MAX_RATIO - ATR_HIGH_BAND),
        )
    } else if ratio <= ATR_LOW_BAND {
        (
            Signal::Buy,
            strength(ATR_LOW_BAND - ratio, ATR_LOW_BAND - ATR_MIN_RATIO),
        )
    } else {
        (Signal::Neutral, NEUTRAL_CONFIDENCE)
    };

    Indicator::new(
        IndicatorKind::Atr,
        value,
        signal,
        confidence,
        format!("ATR {value:.4} ({:.2}% of price)", ratio * 100.0),
    )
}

fn fibonacci(inputs: &Inputs) -> Indicator {
    let p = inputs.price;
    let mut high = p.max(inputs.prev_close);
    let mut low = p.min(inputs.prev_close);
    if high - low < p * FIB_MIN_SWING {
        let mid = (high + low) / 2.0;
        high = mid + p * FIB_MIN_SWING / 2.0;
        low = mid - p * FIB_MIN_SWING / 2.0;
    }
    let level = low + (high - low) * FIB_RATIO;
    let ratio = p / level;

    let (signal, confidence) = if ratio > 1.05 {
        (Signal::Buy, strength(ratio - 1.05, 0.05))
    } else if ratio < 0.95 {
        (Signal::Sell, strength(0.95 - ratio, 0.05))
    } else {
        (Signal::Neutral, NEUTRAL_CONFIDENCE)
    };

    Indicator::new(
        IndicatorKind::Fibonacci,
        level,
        signal,
        confidence,
        format!("61.8% retracement at {level:.4}"),
    )
}

fn vpvr(snapshot: &MarketSnapshot, inputs: &Inputs) -> Indicator {
    if !snapshot.has_volume() {
        warn!(volume = snapshot.volume_24h, "Missing volume, VPVR unavailable");
        return Indicator::degenerate(IndicatorKind::Vpvr, "missing volume");
    }

    let volume = snapshot.volume_24h;
    let value = volume / inputs.price;

    let (high_participation, low_participation, excess) =
        if snapshot.market_cap.is_finite() && snapshot.market_cap > 0.0 {
            let turnover = volume / snapshot.market_cap;
            (
                turnover >= VPVR_HIGH_TURNOVER,
                turnover <= VPVR_LOW_TURNOVER,
                strength(turnover - VPVR_HIGH_TURNOVER, VPVR_HIGH_TURNOVER),
            )
        } else {
            (
                volume >= VPVR_HIGH_VOLUME,
                volume <= VPVR_LOW_VOLUME,
                strength(volume - VPVR_HIGH_VOLUME, VPVR_HIGH_VOLUME),
            )
        };

    let direction = if inputs.change_pct > 0.0 {
        Signal::Buy
    } else if inputs.change_pct < 0.0 {
        Signal::Sell
    } else {
        Signal::Neutral
    };

    let (signal, confidence, note) = if high_participation && direction != Signal::Neutral {
        (direction, excess, "high participation confirms the move")
    } else if low_participation {
        (Signal::Neutral, NEUTRAL_CONFIDENCE, "thin volume")
    } else {
        (Signal::Neutral, NEUTRAL_CONFIDENCE, "average participation")
    };

    Indicator::new(
        IndicatorKind::Vpvr,
        value,
        signal,
        confidence,
        format!("{value:.2} units traded, {note}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(price: f64, change: f64) -> MarketSnapshot {
        MarketSnapshot::new(price, 1_000_000.0, change, 0.0)
    }

    fn find(indicators: &[Indicator], kind: IndicatorKind) -> &Indicator {
        indicators
            .iter()
            .find(|i| i.name == kind.name())
            .expect("indicator present")
    }

    #[test]
    fn test_fixed_shape_for_positive_prices() {
        let engine = IndicatorEngine::default();
        for price in [1e-6, 0.5, 1.0, 2000.0, 65_000.0, 1e9] {
            for change in [-80.0, -20.0, -3.0, 0.0, 0.5, 7.0, 25.0, 400.0, f64::NAN] {
                let indicators = engine.compute(&snapshot(price, change));
                let names: Vec<_> = indicators.iter().map(|i| i.name.as_str()).collect();
                let expected: Vec<_> = IndicatorKind::ALL.iter().map(|k| k.name()).collect();
                assert_eq!(names, expected);
                for ind in &indicators {
                    assert!(
                        (0.0..=1.0).contains(&ind.confidence),
                        "{} confidence {} out of range",
                        ind.name,
                        ind.confidence
                    );
                    assert!(ind.value.is_finite());
                }
            }
        }
    }

    #[test]
    fn test_degenerate_price_yields_neutral_entries() {
        let engine = IndicatorEngine::default();
        for price in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let indicators = engine.compute(&snapshot(price, 3.0));
            assert_eq!(indicators.len(), INDICATOR_COUNT);
            assert!(indicators.iter().all(|i| i.signal == Signal::Neutral));
            assert!(indicators.iter().all(|i| i.confidence == 0.0));
        }
    }

    #[test]
    fn test_degenerate_analysis_keeps_invariants() {
        let analysis = IndicatorEngine::default().analyze(&snapshot(0.0, 0.0));
        assert_ne!(analysis.overall_sentiment, 0.0);
        assert!(analysis.price_range.low > 0.0);
        assert!(analysis.price_range.high > analysis.price_range.low);
    }

    #[test]
    fn test_missing_volume_only_degrades_vpvr() {
        let snap = MarketSnapshot::new(2000.0, f64::NAN, 4.0, 0.0);
        let indicators = IndicatorEngine::default().compute(&snap);
        assert_eq!(find(&indicators, IndicatorKind::Vpvr).confidence, 0.0);
        assert!(find(&indicators, IndicatorKind::Rsi).confidence > 0.0);
    }

    #[test]
    fn test_deterministic() {
        let engine = IndicatorEngine::default();
        let snap = snapshot(1834.2, -2.7);
        assert_eq!(engine.compute(&snap), engine.compute(&snap));
    }

    #[test]
    fn test_rsi_bounds_and_signals() {
        let engine = IndicatorEngine::default();
        let strict = IndicatorEngine::new(true);
        for change in [-50.0, -12.0, 0.0, 12.0, 100.0] {
            let rsi = find(&engine.compute(&snapshot(100.0, change)), IndicatorKind::Rsi).value;
            assert!((20.0..=80.0).contains(&rsi));
            let rsi = find(&strict.compute(&snapshot(100.0, change)), IndicatorKind::Rsi).value;
            assert!((0.0..=100.0).contains(&rsi));
        }

        let up = engine.compute(&snapshot(100.0, 15.0));
        assert_eq!(find(&up, IndicatorKind::Rsi).signal, Signal::Sell);
        let down = engine.compute(&snapshot(100.0, -15.0));
        assert_eq!(find(&down, IndicatorKind::Rsi).signal, Signal::Buy);
        let flat = engine.compute(&snapshot(100.0, 0.0));
        let rsi = find(&flat, IndicatorKind::Rsi);
        assert_eq!(rsi.signal, Signal::Neutral);
        assert_eq!(rsi.confidence, NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_stoch_rsi_bounds() {
        let engine = IndicatorEngine::default();
        for change in [-50.0, -10.0, 10.0, 100.0] {
            let stoch =
                find(&engine.compute(&snapshot(100.0, change)), IndicatorKind::StochRsi).value;
            assert!((15.0..=85.0).contains(&stoch));
        }
        let hot = engine.compute(&snapshot(100.0, 10.0));
        assert_eq!(find(&hot, IndicatorKind::StochRsi).signal, Signal::Sell);
    }

    #[test]
    fn test_trend_indicators_follow_direction() {
        let engine = IndicatorEngine::default();
        let up = engine.compute(&snapshot(2000.0, 5.0));
        assert_eq!(find(&up, IndicatorKind::Ema).signal, Signal::Buy);
        assert_eq!(find(&up, IndicatorKind::Macd).signal, Signal::Buy);
        assert!(find(&up, IndicatorKind::Macd).value > 0.0);

        let down = engine.compute(&snapshot(2000.0, -5.0));
        assert_eq!(find(&down, IndicatorKind::Ema).signal, Signal::Sell);
        assert_eq!(find(&down, IndicatorKind::Macd).signal, Signal::Sell);
    }

    #[test]
    fn test_ema_deviation_is_bounded() {
        let indicators = IndicatorEngine::default().compute(&snapshot(100.0, 100.0));
        let ema = find(&indicators, IndicatorKind::Ema).value;
        assert!((ema - 100.0).abs() <= 100.0 * MAX_EMA_DEVIATION + 1e-9);
    }

    #[test]
    fn test_atr_is_one_to_three_percent() {
        let engine = IndicatorEngine::default();
        for change in [0.0, 2.0, -6.0, 40.0] {
            let atr = find(&engine.compute(&snapshot(500.0, change)), IndicatorKind::Atr).value;
            assert!((5.0..=15.0).contains(&atr), "atr {atr}");
        }
    }

    #[test]
    fn test_large_moves_break_bollinger_bands() {
        let engine = IndicatorEngine::default();
        let up = engine.compute(&snapshot(100.0, 10.0));
        assert_eq!(find(&up, IndicatorKind::BollingerBands).signal, Signal::Sell);
        let down = engine.compute(&snapshot(100.0, -10.0));
        assert_eq!(find(&down, IndicatorKind::BollingerBands).signal, Signal::Buy);
        let calm = engine.compute(&snapshot(100.0, 1.0));
        assert_eq!(find(&calm, IndicatorKind::BollingerBands).signal, Signal::Neutral);
    }

    #[test]
    fn test_fibonacci_continuation() {
        let engine = IndicatorEngine::default();
        let up = engine.compute(&snapshot(100.0, 20.0));
        assert_eq!(find(&up, IndicatorKind::Fibonacci).signal, Signal::Buy);
        let down = engine.compute(&snapshot(100.0, -20.0));
        assert_eq!(find(&down, IndicatorKind::Fibonacci).signal, Signal::Sell);
    }

    #[test]
    fn test_vpvr_turnover() {
        let engine = IndicatorEngine::default();
        let busy = MarketSnapshot::new(10.0, 3e9, 4.0, 1e10);
        let vpvr = engine.compute(&busy)[7].clone();
        assert_eq!(vpvr.name, "VPVR");
        assert_eq!(vpvr.signal, Signal::Buy);
        assert_eq!(vpvr.value, 3e8);

        let thin = MarketSnapshot::new(10.0, 1e6, 4.0, 1e10);
        assert_eq!(engine.compute(&thin)[7].signal, Signal::Neutral);
    }

    #[test]
    fn test_overall_sentiment_never_zero() {
        let engine = IndicatorEngine::default();
        for change in [-30.0, -1.0, 0.0, 1.0, 30.0] {
            let analysis = engine.analyze(&snapshot(2000.0, change));
            assert_ne!(analysis.overall_sentiment, 0.0);
            assert!((-1.0..=1.0).contains(&analysis.overall_sentiment));
        }
    }

    #[test]
    fn test_price_range_brackets_price() {
        let analysis = IndicatorEngine::default().analyze(&snapshot(2000.0, 0.0));
        assert!(analysis.price_range.low <= 2000.0 * 0.95 + 1e-9);
        assert!(analysis.price_range.high >= 2000.0 * 1.05 - 1e-9);
        assert!((0.0..=1.0).contains(&analysis.price_range.confidence));
    }

    #[test]
    fn test_report_volume_split() {
        let snap = MarketSnapshot::new(2000.0, 1_000_000.0, 10.0, 0.0);
        let analysis = IndicatorEngine::default().analyze(&snap);
        let report = build_report(&snap, &analysis);

        assert_eq!(report.volume_24h.total, 1_000_000.0);
        assert!((report.volume_24h.buy - 550_000.0).abs() < 1e-6);
        assert!((report.volume_24h.buy + report.volume_24h.sell - 1_000_000.0).abs() < 1e-6);
        assert!(report.price_24h.change > 0.0);
        assert_eq!(report.price_24h.change_percentage, 10.0);
        assert_eq!(report.sentiment, analysis.overall_sentiment);
    }

    #[test]
    fn test_report_keeps_uncapped_change() {
        let snap = MarketSnapshot::new(500.0, 1_000_000.0, 400.0, 0.0);
        let analysis = IndicatorEngine::default().analyze(&snap);
        let report = build_report(&snap, &analysis);

        assert_eq!(report.price_24h.change_percentage, 400.0);
        assert!((report.price_24h.change - 400.0).abs() < 1e-9);
        assert!((report.volume_24h.buy - 750_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_report_without_change() {
        let snap = MarketSnapshot::new(2000.0, 1_000_000.0, f64::NAN, 0.0);
        let analysis = IndicatorEngine::default().analyze(&snap);
        let report = build_report(&snap, &analysis);

        assert_eq!(report.price_24h.change_percentage, 0.0);
        assert_eq!(report.price_24h.change, 0.0);
    }
}
