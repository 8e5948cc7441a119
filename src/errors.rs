//! Typed errors for the back-office layer.
//!
//! Minting failures live in `mintdesk_common::MintError`; this enum covers
//! lookups, input validation and the database lock.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackofficeError {
    #[error("Project {id} not found")]
    ProjectNotFound { id: String },

    #[error("Investor {id} not found")]
    InvestorNotFound { id: String },

    #[error("Subscription {id} not found")]
    SubscriptionNotFound { id: String },

    #[error("Subscription {subscription_id} belongs to project {actual}, not {expected}")]
    ProjectMismatch {
        subscription_id: String,
        expected: String,
        actual: String,
    },

    #[error("Token amount must be a non-negative number, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

impl BackofficeError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BackofficeError::ProjectNotFound { .. }
                | BackofficeError::InvestorNotFound { .. }
                | BackofficeError::SubscriptionNotFound { .. }
        )
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            BackofficeError::InvalidAmount { .. }
                | BackofficeError::BadRequest(_)
                | BackofficeError::ProjectMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_not_found_carries_id() {
        let err = BackofficeError::ProjectNotFound { id: "proj-42".into() };
        assert!(err.to_string().contains("proj-42"));
        assert!(err.is_not_found());
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn invalid_amount_is_input_error() {
        let err = BackofficeError::InvalidAmount { amount: -5.0 };
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn survives_anyhow_round_trip() {
        let err: anyhow::Error = BackofficeError::SubscriptionNotFound { id: "s1".into() }.into();
        let back = err.downcast_ref::<BackofficeError>().expect("downcast");
        assert!(back.is_not_found());
    }

    #[test]
    fn lock_poisoned_is_matchable() {
        let err = BackofficeError::LockPoisoned;
        assert!(matches!(err, BackofficeError::LockPoisoned));
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&err);
    }
}
