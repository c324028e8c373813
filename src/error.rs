//! Error taxonomy for the mining core.
//!
//! Every core operation either returns a complete result or one of these
//! variants. Nothing is retried internally: the pipeline is deterministic, so
//! the same input fails the same way.

use thiserror::Error;

/// Result type used by the basket, itemset, rule and recommendation stages.
pub type CoreResult<T> = std::result::Result<T, RecommendError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecommendError {
    /// A transaction record is malformed or incomplete.
    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    /// A support or metric threshold is outside its valid range.
    #[error("invalid threshold `{name}` = {value}: {reason}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: String,
    },

    /// Confidence or lift would be undefined for a rule.
    #[error("degenerate rule {antecedent:?} -> {consequent:?}: {reason}")]
    DegenerateRule {
        antecedent: Vec<String>,
        consequent: Vec<String>,
        reason: String,
    },

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RecommendError {
    pub fn invalid_record(row: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            row,
            reason: reason.into(),
        }
    }

    pub fn invalid_threshold(name: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidThreshold {
            name,
            value,
            reason: reason.into(),
        }
    }

    pub fn degenerate_rule(
        antecedent: &[String],
        consequent: &[String],
        reason: impl Into<String>,
    ) -> Self {
        Self::DegenerateRule {
            antecedent: antecedent.to_vec(),
            consequent: consequent.to_vec(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
