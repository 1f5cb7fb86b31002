//! Error types for exchange interaction.
//!
//! The taxonomy separates transport failures (retry next tick), business
//! rejections reported by an exchange (log and drop the affected call), and
//! protocol violations (a parsing/shape assumption broke — surfaced, never
//! swallowed).

use thiserror::Error;

/// Errors that can occur when talking to an exchange.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// Network-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Login / session failure.
    #[error("login failed: {0}")]
    Login(String),

    /// The exchange accepted the request but rejected it for business
    /// reasons (account restricted, market closed, and so on).
    #[error("exchange rejected request: {code} - {message}")]
    Rejected {
        /// Exchange error code.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The response shape violated a protocol assumption (missing fields,
    /// request/response count mismatch).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// An order failed local validation before submission.
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

impl ExchangeError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Creates a business rejection.
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol violation.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Creates a local validation error.
    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::InvalidOrder(message.into())
    }

    /// Returns true for failures worth retrying on a later tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }

    /// Returns true for rejections the exchange itself reported.
    #[must_use]
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Result type alias for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_transient() {
        assert!(ExchangeError::network("connection refused").is_transient());
        assert!(ExchangeError::timeout("deadline exceeded").is_transient());
    }

    #[test]
    fn test_rejection_is_business_not_transient() {
        let err = ExchangeError::rejected("EX014", "market suspended");
        assert!(err.is_business());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_protocol_violation_is_neither() {
        let err = ExchangeError::protocol("response count 3 for 4 requests");
        assert!(!err.is_transient());
        assert!(!err.is_business());
    }

    #[test]
    fn test_display_includes_details() {
        let err = ExchangeError::rejected("EX014", "market suspended");
        let text = err.to_string();
        assert!(text.contains("EX014"));
        assert!(text.contains("market suspended"));
    }
}
