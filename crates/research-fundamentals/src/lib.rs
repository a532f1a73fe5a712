//! Fundamental analysis for stock research
//!
//! Pure calculations over a [`FinancialSnapshot`] of one ticker:
//!
//! - Key ratios (P/E, P/B, margins, returns, leverage)
//! - Year-over-year revenue and net income growth
//! - Valuation multiples and forward estimates
//! - A simple discounted cash flow valuation
//! - Threshold-based interpretations of the headline metrics
//!
//! Fetching the snapshot is left to the caller.
//!
//! # Example
//!
//! ```
//! use research_fundamentals::{DcfAssumptions, FinancialSnapshot, analyze};
//!
//! let snapshot = FinancialSnapshot::from_json(
//!     r#"{"symbol": "ACME", "trailingPE": 18.0, "freeCashFlow": 1.0e9}"#,
//! )?;
//! let analysis = analyze(&snapshot, DcfAssumptions::default());
//! assert!(analysis.dcf_value.is_some());
//! # Ok::<(), research_fundamentals::FundamentalsError>(())
//! ```

pub mod analysis;
pub mod dcf;
pub mod error;
pub mod metrics;
pub mod snapshot;

pub use analysis::{FundamentalAnalysis, Interpretations, analyze, analyze_on};
pub use dcf::{DcfAssumptions, simple_dcf};
pub use error::{FundamentalsError, Result};
pub use metrics::{
    FutureEstimates, GrowthRates, KeyRatios, ValuationMetrics, format_market_cap, yoy_growth,
};
pub use snapshot::FinancialSnapshot;
