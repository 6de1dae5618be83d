//! Weighted quant/quality/catalyst score for a fetched quote.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use stockron_market_data::RawQuote;

/// RSI used for the catalyst score. Indicators are not computed, so the
/// catalyst component sits at its neutral value.
pub const NEUTRAL_RSI: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Scores {
    pub quant: f64,
    pub quality: f64,
    pub catalyst: f64,
    pub overall_score: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Stance {
    Buy,
    Hold,
    Wait,
}

impl Stance {
    pub fn from_overall(score: f64) -> Self {
        if score >= 75.0 {
            Stance::Buy
        } else if score >= 50.0 {
            Stance::Hold
        } else {
            Stance::Wait
        }
    }
}

pub fn compute_scores(pe: f64, eps: f64, pm: f64, roe: f64, rsi: f64) -> Scores {
    let quant = (100.0 - pe.min(200.0) / 2.0).max(0.0);
    let quality = ((eps + pm + roe) / 3.0).min(100.0);
    let catalyst = 100.0 - (rsi - 50.0).abs();
    let overall_score = round2(quant * 0.4 + quality * 0.4 + catalyst * 0.2);

    Scores {
        quant,
        quality,
        catalyst,
        overall_score,
    }
}

/// Score a quote. Growth ratios are scaled to percentages and market cap
/// to trillions.
pub fn score_quote(quote: &RawQuote) -> Scores {
    let eps = quote.eps_growth * 100.0;
    let pm = quote.revenue_growth * 100.0;
    let roe = quote.market_cap.to_f64().unwrap_or_default() / 1e12;

    compute_scores(quote.pe, eps, pm, roe, NEUTRAL_RSI)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
