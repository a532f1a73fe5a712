//! Input data for one ticker
//!
//! Field names follow the camelCase keys of the market-data info map so a
//! snapshot can be deserialized straight from a dump of it. Statement series
//! are ordered newest first.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Company info and statement figures for one ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialSnapshot {
    pub symbol: String,
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,

    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    #[serde(rename = "priceToSalesTrailing12Months")]
    pub price_to_sales: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub return_on_capital: Option<f64>,
    pub gross_margins: Option<f64>,
    pub operating_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,

    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub enterprise_to_ebitda: Option<f64>,
    pub enterprise_to_revenue: Option<f64>,

    pub forward_eps: Option<f64>,
    pub revenue_estimate: Option<f64>,
    #[serde(rename = "longTermPotentialGrowthRate")]
    pub long_term_growth_rate: Option<f64>,

    /// Unix seconds
    pub last_fiscal_year_end: Option<i64>,

    pub revenue_history: Vec<f64>,
    pub net_income_history: Vec<f64>,
    pub free_cash_flow: Option<f64>,
}

impl FinancialSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
