//! Simple discounted cash flow valuation
//!
//! Free cash flow grows at a constant rate for a fixed horizon, then a
//! Gordon-growth terminal value is added. Both parts are discounted at WACC.

use crate::error::{FundamentalsError, Result};
use serde::{Deserialize, Serialize};

/// Assumptions for [`simple_dcf`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    /// Weighted average cost of capital
    pub wacc: f64,
    /// Growth used when the snapshot has no long-term growth estimate
    pub default_growth: f64,
    /// Explicit forecast horizon in years
    pub years: u32,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            wacc: 0.1,
            default_growth: 0.03,
            years: 5,
        }
    }
}

/// Present value of `fcf` growing at `growth`, discounted at `wacc`
///
/// ```
/// use research_fundamentals::simple_dcf;
///
/// let value = simple_dcf(100.0, 0.03, 0.1, 5).unwrap();
/// assert!((value - 1_325.91).abs() < 0.01);
/// ```
pub fn simple_dcf(fcf: f64, growth: f64, wacc: f64, years: u32) -> Result<f64> {
    if years == 0 {
        return Err(FundamentalsError::InvalidAssumption(
            "forecast horizon must be at least one year".to_string(),
        ));
    }
    if wacc <= growth {
        return Err(FundamentalsError::InvalidAssumption(format!(
            "wacc ({wacc}) must exceed growth ({growth})"
        )));
    }
    if wacc <= -1.0 || !fcf.is_finite() || !growth.is_finite() || !wacc.is_finite() {
        return Err(FundamentalsError::InvalidAssumption(
            "inputs must be finite and wacc above -100%".to_string(),
        ));
    }

    let explicit: f64 = (1..=years)
        .map(|i| {
            let i = i as i32;
            fcf * (1.0 + growth).powi(i) / (1.0 + wacc).powi(i)
        })
        .sum();

    let terminal_value = fcf * (1.0 + growth) / (wacc - growth);
    let discounted_terminal = terminal_value / (1.0 + wacc).powi(years as i32);

    Ok(explicit + discounted_terminal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn test_single_year() {
        // 100 * 1.03 / 1.1 + (100 * 1.03 / 0.07) / 1.1
        let expected = 103.0 / 1.1 + (103.0 / 0.07) / 1.1;
        assert!(approx(simple_dcf(100.0, 0.03, 0.1, 1).unwrap(), expected));
    }

    #[test]
    fn test_five_years() {
        let mut expected = 0.0;
        for i in 1..=5 {
            expected += 100.0 * 1.03_f64.powi(i) / 1.1_f64.powi(i);
        }
        expected += (100.0 * 1.03 / 0.07) / 1.1_f64.powi(5);

        assert!(approx(simple_dcf(100.0, 0.03, 0.1, 5).unwrap(), expected));
    }

    #[test]
    fn test_zero_growth_is_perpetuity() {
        // With g = 0 the total equals fcf / wacc
        assert!(approx(simple_dcf(50.0, 0.0, 0.1, 10).unwrap(), 500.0));
    }

    #[test]
    fn test_scales_linearly_with_fcf() {
        let one = simple_dcf(1.0, 0.02, 0.09, 5).unwrap();
        let many = simple_dcf(1_000.0, 0.02, 0.09, 5).unwrap();
        assert!(approx(many, one * 1_000.0));
    }

    #[test]
    fn test_rejects_growth_at_or_above_wacc() {
        assert!(simple_dcf(100.0, 0.1, 0.1, 5).is_err());
        assert!(simple_dcf(100.0, 0.12, 0.1, 5).is_err());
    }

    #[test]
    fn test_rejects_zero_years_and_nan() {
        assert!(simple_dcf(100.0, 0.03, 0.1, 0).is_err());
        assert!(simple_dcf(f64::NAN, 0.03, 0.1, 5).is_err());
    }
}
