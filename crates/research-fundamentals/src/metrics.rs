//! Ratio, growth, and valuation metrics

use crate::snapshot::FinancialSnapshot;
use serde::Serialize;

/// Key ratios copied from the snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyRatios {
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub roic: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_profit_margin: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub payout_ratio: Option<f64>,
}

impl KeyRatios {
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        Self {
            pe_ratio: snapshot.trailing_pe,
            forward_pe: snapshot.forward_pe,
            pb_ratio: snapshot.price_to_book,
            ps_ratio: snapshot.price_to_sales,
            peg_ratio: snapshot.peg_ratio,
            debt_to_equity: snapshot.debt_to_equity,
            current_ratio: snapshot.current_ratio,
            quick_ratio: snapshot.quick_ratio,
            roe: snapshot.return_on_equity,
            roa: snapshot.return_on_assets,
            roic: snapshot.return_on_capital,
            gross_margin: snapshot.gross_margins,
            operating_margin: snapshot.operating_margins,
            net_profit_margin: snapshot.profit_margins,
            dividend_yield: snapshot.dividend_yield,
            payout_ratio: snapshot.payout_ratio,
        }
    }
}

/// Year-over-year growth
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrowthRates {
    pub revenue_growth_yoy: Option<f64>,
    pub net_income_growth_yoy: Option<f64>,
}

impl GrowthRates {
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        Self {
            revenue_growth_yoy: yoy_growth(&snapshot.revenue_history),
            net_income_growth_yoy: yoy_growth(&snapshot.net_income_history),
        }
    }
}

/// Size and enterprise-value multiples
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValuationMetrics {
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub ev_to_revenue: Option<f64>,
}

impl ValuationMetrics {
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        Self {
            market_cap: snapshot.market_cap,
            enterprise_value: snapshot.enterprise_value,
            ev_to_ebitda: snapshot.enterprise_to_ebitda,
            ev_to_revenue: snapshot.enterprise_to_revenue,
        }
    }
}

/// Forward-looking estimates
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FutureEstimates {
    pub next_year_eps: Option<f64>,
    pub next_year_revenue: Option<f64>,
    pub long_term_growth_rate: Option<f64>,
}

impl FutureEstimates {
    pub fn from_snapshot(snapshot: &FinancialSnapshot) -> Self {
        Self {
            next_year_eps: snapshot.forward_eps,
            next_year_revenue: snapshot.revenue_estimate,
            long_term_growth_rate: snapshot.long_term_growth_rate,
        }
    }
}

/// Growth of the newest value over the one before it
///
/// `series` is ordered newest first. Returns `None` with fewer than two
/// points or a zero base.
pub fn yoy_growth(series: &[f64]) -> Option<f64> {
    match series {
        [latest, previous, ..] if *previous != 0.0 => Some((latest - previous) / previous),
        _ => None,
    }
}

/// Format market cap in human-readable form
pub fn format_market_cap(cap: f64) -> String {
    if cap >= 1_000_000_000_000.0 {
        format!("${:.2}T", cap / 1_000_000_000_000.0)
    } else if cap >= 1_000_000_000.0 {
        format!("${:.2}B", cap / 1_000_000_000.0)
    } else if cap >= 1_000_000.0 {
        format!("${:.2}M", cap / 1_000_000.0)
    } else {
        format!("${cap:.2}")
    }
}
