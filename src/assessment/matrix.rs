//! Typed response matrix.
//!
//! Maps `(domain, question)` keys to responses for one assessment,
//! validated against a taxonomy.

use crate::error::ScoringError;
use crate::models::{Assessment, Domain, Response, ResponseKey, MAX_SCORE};
use crate::taxonomy::Taxonomy;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// How unanswered questions are treated when building a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillPolicy {
    /// Score given to unanswered questions.
    pub default_score: u8,
    /// Reject unanswered questions instead of filling them.
    pub strict: bool,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            default_score: 5,
            strict: false,
        }
    }
}

impl From<&crate::config::ScoringConfig> for FillPolicy {
    fn from(config: &crate::config::ScoringConfig) -> Self {
        Self {
            default_score: config.default_score,
            strict: config.strict,
        }
    }
}

/// Validated responses for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMatrix {
    entries: BTreeMap<ResponseKey, Response>,
    defaulted: BTreeSet<ResponseKey>,
}

impl ResponseMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the matrix for an assessment.
    ///
    /// Every record must name a known question with a score in 0-10, at
    /// most once. Questions without a record are filled with the default
    /// score, or rejected when the policy is strict.
    pub fn build(
        taxonomy: &Taxonomy,
        assessment: &Assessment,
        policy: FillPolicy,
    ) -> Result<Self, ScoringError> {
        if policy.default_score > MAX_SCORE {
            return Err(ScoringError::InvalidInput(format!(
                "default score {} is outside 0-10",
                policy.default_score
            )));
        }

        let mut matrix = Self::new();

        for record in &assessment.responses {
            let domain = taxonomy
                .domain(record.domain)
                .ok_or(ScoringError::UnknownDomain(record.domain))?;
            let question =
                domain
                    .question(record.question)
                    .ok_or(ScoringError::UnknownQuestion {
                        domain: record.domain,
                        question: record.question,
                    })?;

            if record.score > MAX_SCORE {
                return Err(ScoringError::ScoreOutOfRange {
                    label: question.label(),
                    score: record.score,
                });
            }

            matrix.insert(
                record.key(),
                Response {
                    score: record.score,
                    note: record.note.clone(),
                },
            )?;
        }

        for domain in taxonomy.domains() {
            for question in &domain.questions {
                let key = question.key();
                if matrix.entries.contains_key(&key) {
                    continue;
                }
                if policy.strict {
                    return Err(ScoringError::MissingResponse {
                        domain: key.domain,
                        question: key.question,
                    });
                }
                matrix
                    .entries
                    .insert(key, Response::new(policy.default_score));
                matrix.defaulted.insert(key);
            }
        }

        debug!(
            "Built response matrix: {} responses, {} defaulted",
            matrix.len(),
            matrix.defaulted_count()
        );

        Ok(matrix)
    }

    /// Insert a response, rejecting a second response for the same question.
    pub fn insert(&mut self, key: ResponseKey, response: Response) -> Result<(), ScoringError> {
        if self.entries.contains_key(&key) {
            return Err(ScoringError::DuplicateResponse {
                domain: key.domain,
                question: key.question,
            });
        }
        self.entries.insert(key, response);
        Ok(())
    }

    pub fn get(&self, key: ResponseKey) -> Option<&Response> {
        self.entries.get(&key)
    }

    /// Responses for a domain's questions, in question order.
    pub fn domain_responses(&self, domain: &Domain) -> Result<Vec<Response>, ScoringError> {
        domain
            .questions
            .iter()
            .map(|q| {
                self.get(q.key())
                    .cloned()
                    .ok_or(ScoringError::MissingResponse {
                        domain: domain.id,
                        question: q.position,
                    })
            })
            .collect()
    }

    /// Whether the response for `key` was filled with the default score.
    pub fn is_defaulted(&self, key: ResponseKey) -> bool {
        self.defaulted.contains(&key)
    }

    pub fn defaulted_count(&self) -> usize {
        self.defaulted.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
