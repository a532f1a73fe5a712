//! Error types for fundamental analysis

use thiserror::Error;

/// Fundamental analysis errors
#[derive(Debug, Error)]
pub enum FundamentalsError {
    /// Valuation assumptions that make the formula meaningless
    #[error("Invalid assumption: {0}")]
    InvalidAssumption(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for fundamental analysis
pub type Result<T> = std::result::Result<T, FundamentalsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FundamentalsError::InvalidAssumption("wacc must exceed growth".to_string());
        assert_eq!(err.to_string(), "Invalid assumption: wacc must exceed growth");

        let err = FundamentalsError::from(serde_json::from_str::<u32>("x").unwrap_err());
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
