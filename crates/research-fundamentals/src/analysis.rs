//! Complete fundamental analysis of one snapshot

use crate::dcf::{DcfAssumptions, simple_dcf};
use crate::metrics::{FutureEstimates, GrowthRates, KeyRatios, ValuationMetrics};
use crate::snapshot::FinancialSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Plain-language reading of the headline metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretations {
    pub pe_ratio: &'static str,
    pub debt_to_equity: &'static str,
    pub roe: &'static str,
    pub revenue_growth: &'static str,
}

impl Interpretations {
    /// Threshold readings; a missing value reads as 0
    pub fn new(ratios: &KeyRatios, growth: &GrowthRates) -> Self {
        let pe = ratios.pe_ratio.unwrap_or(0.0);
        let debt_to_equity = ratios.debt_to_equity.unwrap_or(0.0);
        let roe = ratios.roe.unwrap_or(0.0);
        let revenue_growth = growth.revenue_growth_yoy.unwrap_or(0.0);

        Self {
            pe_ratio: if pe > 20.0 {
                "High P/E might indicate overvaluation or high growth expectations"
            } else {
                "Low P/E might indicate undervaluation or low growth expectations"
            },
            debt_to_equity: if debt_to_equity > 2.0 {
                "High leverage"
            } else {
                "Conservative capital structure"
            },
            roe: if roe > 0.15 {
                "Strong returns"
            } else {
                "Potential profitability issues"
            },
            revenue_growth: if revenue_growth > 0.1 {
                "Strong growth"
            } else {
                "Slowing growth"
            },
        }
    }
}

/// Result of [`analyze`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalAnalysis {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub key_ratios: KeyRatios,
    pub growth_rates: GrowthRates,
    pub valuation: ValuationMetrics,
    pub estimates: FutureEstimates,
    /// `None` when free cash flow is missing or the assumptions are invalid
    pub dcf_value: Option<f64>,
    pub assumptions: DcfAssumptions,
    pub last_updated: NaiveDate,
    pub retrieved_on: NaiveDate,
    pub interpretations: Interpretations,
}

/// Analyze a snapshot as of today (UTC)
pub fn analyze(snapshot: &FinancialSnapshot, assumptions: DcfAssumptions) -> FundamentalAnalysis {
    analyze_on(snapshot, assumptions, Utc::now().date_naive())
}

/// Analyze a snapshot with an explicit retrieval date
pub fn analyze_on(
    snapshot: &FinancialSnapshot,
    assumptions: DcfAssumptions,
    retrieved_on: NaiveDate,
) -> FundamentalAnalysis {
    let key_ratios = KeyRatios::from_snapshot(snapshot);
    let growth_rates = GrowthRates::from_snapshot(snapshot);
    let valuation = ValuationMetrics::from_snapshot(snapshot);
    let estimates = FutureEstimates::from_snapshot(snapshot);

    let growth = snapshot
        .long_term_growth_rate
        .unwrap_or(assumptions.default_growth);

    let dcf_value = match snapshot.free_cash_flow {
        Some(fcf) => match simple_dcf(fcf, growth, assumptions.wacc, assumptions.years) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Skipping DCF for {}: {}", snapshot.symbol, e);
                None
            }
        },
        None => {
            debug!("No free cash flow for {}", snapshot.symbol);
            None
        }
    };

    let last_updated = DateTime::from_timestamp(snapshot.last_fiscal_year_end.unwrap_or(0), 0)
        .unwrap_or_default()
        .date_naive();

    let interpretations = Interpretations::new(&key_ratios, &growth_rates);

    FundamentalAnalysis {
        symbol: snapshot.symbol.clone(),
        company_name: snapshot.long_name.clone(),
        sector: snapshot.sector.clone(),
        industry: snapshot.industry.clone(),
        key_ratios,
        growth_rates,
        valuation,
        estimates,
        dcf_value,
        assumptions,
        last_updated,
        retrieved_on,
        interpretations,
    }
}
