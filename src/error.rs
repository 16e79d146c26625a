//! Scoring error types.

use thiserror::Error;

/// Errors raised while validating responses or computing summaries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Score {score} for question {label} is outside 0-10")]
    ScoreOutOfRange { label: String, score: u8 },

    #[error("Unknown domain: {0}")]
    UnknownDomain(u8),

    #[error("Domain {domain} has no question {question}")]
    UnknownQuestion { domain: u8, question: u8 },

    #[error("Duplicate response for question {domain}.{question}")]
    DuplicateResponse { domain: u8, question: u8 },

    #[error("Missing response for question {domain}.{question}")]
    MissingResponse { domain: u8, question: u8 },

    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),
}

impl ScoringError {
    /// Check if this error comes from the shape of the input rather than a value.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ScoringError::InvalidInput(_)
                | ScoringError::MissingResponse { .. }
                | ScoringError::InvalidTaxonomy(_)
        )
    }
}
