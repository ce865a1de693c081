//! Ledger client error types.

use thiserror::Error;

/// Errors from the points ledger.
///
/// `Rejected` is a business decision by the ledger and is never retried;
/// `Unavailable` and `Timeout` are transient and eligible for backoff.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The ledger refused the movement, e.g. `INSUFFICIENT_BALANCE`.
    #[error("Ledger rejected request ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The ledger could not be reached or answered with a server error.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// The call exceeded the configured timeout.
    #[error("Ledger request timed out")]
    Timeout,

    /// The ledger answered with a body the client could not interpret.
    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// Returns true if the error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Timeout)
    }

    /// Returns the rejection code, if this is a rejection.
    pub fn rejection_code(&self) -> Option<&str> {
        match self {
            LedgerError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LedgerError::Timeout.is_transient());
        assert!(LedgerError::Unavailable("503".to_string()).is_transient());
        assert!(
            !LedgerError::Rejected {
                code: "INSUFFICIENT_BALANCE".to_string(),
                message: "balance too low".to_string(),
            }
            .is_transient()
        );
        assert!(!LedgerError::InvalidResponse("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_rejection_code() {
        let err = LedgerError::Rejected {
            code: "INSUFFICIENT_BALANCE".to_string(),
            message: "balance too low".to_string(),
        };
        assert_eq!(err.rejection_code(), Some("INSUFFICIENT_BALANCE"));
        assert_eq!(LedgerError::Timeout.rejection_code(), None);
    }
}
