//! Error types for the meal planner core

use thiserror::Error;

/// Errors raised by the analyzer and the meal selector
///
/// Every variant is a precondition failure. Invariant violations found while
/// building a plan are reported through `ImageClassValidation` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Cannot analyze an empty list of health records")]
    EmptyRecords,

    #[error(
        "Insufficient meal pool: {available} meals with images available, at least {required} required"
    )]
    InsufficientPool { available: usize, required: usize },

    #[error("Invalid analysis: {0}")]
    InvalidAnalysis(String),

    #[error("Invalid health record: {0}")]
    InvalidRecord(String),

    #[error("Invalid meal: {0}")]
    InvalidMeal(String),
}

impl PlannerError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::EmptyRecords => "EMPTY_RECORDS",
            PlannerError::InsufficientPool { .. } => "INSUFFICIENT_POOL",
            PlannerError::InvalidAnalysis(_) => "INVALID_ANALYSIS",
            PlannerError::InvalidRecord(_) => "INVALID_RECORD",
            PlannerError::InvalidMeal(_) => "INVALID_MEAL",
        }
    }
}

/// Result alias for core operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_pool_message_contains_counts() {
        let err = PlannerError::InsufficientPool {
            available: 15,
            required: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("15"));
        assert!(msg.contains("20"));
        assert_eq!(err.code(), "INSUFFICIENT_POOL");
    }
}
