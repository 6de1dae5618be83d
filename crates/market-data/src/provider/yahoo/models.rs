//! Yahoo Finance quoteSummary response models.
//!
//! Yahoo wraps most numbers as `{"raw": 123.45, "fmt": "123.45"}` and sends
//! an empty object `{}` when it has no value, so every numeric field is an
//! optional [`YahooValue`].

use serde::Deserialize;

/// Main response wrapper for quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<YahooQuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct YahooErrorBody {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Individual result, one per requested module set
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResult {
    pub price: Option<YahooPriceData>,
    pub summary_detail: Option<YahooSummaryDetail>,
    pub financial_data: Option<YahooFinancialData>,
    pub default_key_statistics: Option<YahooKeyStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooPriceData {
    pub regular_market_price: Option<YahooValue>,
    pub regular_market_day_high: Option<YahooValue>,
    pub regular_market_day_low: Option<YahooValue>,
    pub market_cap: Option<YahooValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSummaryDetail {
    pub market_cap: Option<YahooValue>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<YahooValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooFinancialData {
    pub current_price: Option<YahooValue>,
    pub revenue_growth: Option<YahooValue>,
    pub earnings_growth: Option<YahooValue>,
    pub profit_margins: Option<YahooValue>,
    pub return_on_equity: Option<YahooValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooKeyStatistics {
    pub earnings_quarterly_growth: Option<YahooValue>,
}

/// Numeric value with raw and formatted forms
#[derive(Debug, Deserialize, Clone, Default)]
pub struct YahooValue {
    pub raw: Option<f64>,
}

/// Extract the raw value from an optional wrapped number.
pub fn raw(value: &Option<YahooValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_value() {
        let json = r#"{"raw": 150.25, "fmt": "150.25"}"#;
        let value: YahooValue = serde_json::from_str(json).unwrap();
        assert_eq!(value.raw, Some(150.25));
    }

    #[test]
    fn test_deserialize_empty_value() {
        let value: YahooValue = serde_json::from_str("{}").unwrap();
        assert_eq!(value.raw, None);
    }

    #[test]
    fn test_deserialize_error_body() {
        let json = r#"{
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}
            }
        }"#;
        let response: YahooQuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert!(response.quote_summary.result.is_none());
        assert_eq!(
            response.quote_summary.error.and_then(|e| e.code),
            Some("Not Found".to_string())
        );
    }

    #[test]
    fn test_deserialize_financial_data() {
        let json = r#"{
            "currentPrice": {"raw": 450.0, "fmt": "450.00"},
            "revenueGrowth": {"raw": 0.265, "fmt": "26.50%"},
            "profitMargins": {},
            "returnOnEquity": {"raw": 0.91, "fmt": "91.00%"}
        }"#;
        let data: YahooFinancialData = serde_json::from_str(json).unwrap();
        assert_eq!(raw(&data.current_price), Some(450.0));
        assert_eq!(raw(&data.revenue_growth), Some(0.265));
        assert_eq!(raw(&data.profit_margins), None);
        assert_eq!(raw(&data.earnings_growth), None);
    }
}
