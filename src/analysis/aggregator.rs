//! Domain score aggregation.
//!
//! Turns per-question responses into per-domain summaries: rounded mean,
//! ranking label, and every question tied for the lowest score. All
//! functions here are pure.

use crate::assessment::ResponseMatrix;
use crate::error::ScoringError;
use crate::models::{Domain, DomainSummary, RankingLabel, Response, MAX_SCORE};
use std::collections::BTreeMap;

/// Decimal places used for domain means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    OneDecimal,
    TwoDecimals,
}

impl Precision {
    /// Map a configured number of decimals to a precision.
    pub fn from_decimals(decimals: u32) -> Result<Self, ScoringError> {
        match decimals {
            1 => Ok(Precision::OneDecimal),
            2 => Ok(Precision::TwoDecimals),
            other => Err(ScoringError::InvalidInput(format!(
                "unsupported precision of {} decimals (use 1 or 2)",
                other
            ))),
        }
    }

    pub fn decimals(&self) -> usize {
        match self {
            Precision::OneDecimal => 1,
            Precision::TwoDecimals => 2,
        }
    }

    fn scale(&self) -> u64 {
        10u64.pow(self.decimals() as u32)
    }
}

/// Classify a mean score.
///
/// | mean    | label     |
/// |---------|-----------|
/// | < 2     | Very Low  |
/// | [2, 4)  | Low       |
/// | [4, 6)  | Average   |
/// | [6, 8)  | High      |
/// | >= 8    | Very High |
pub fn classify(mean_score: f64) -> RankingLabel {
    if mean_score < 2.0 {
        RankingLabel::VeryLow
    } else if mean_score < 4.0 {
        RankingLabel::Low
    } else if mean_score < 6.0 {
        RankingLabel::Average
    } else if mean_score < 8.0 {
        RankingLabel::High
    } else {
        RankingLabel::VeryHigh
    }
}

/// Arithmetic mean of `scores`, rounded half away from zero.
///
/// Computed on integers so `6.25` always rounds to `6.3`.
/// `scores` must be non-empty.
fn rounded_mean(scores: &[u8], precision: Precision) -> f64 {
    let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
    let count = scores.len() as u64;
    let scale = precision.scale();

    let scaled = (2 * sum * scale + count) / (2 * count);
    scaled as f64 / scale as f64
}

/// Computes domain summaries at a fixed precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreAggregator {
    precision: Precision,
}

impl ScoreAggregator {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Summarise one domain from the responses to its questions, given
    /// in question order.
    pub fn domain_summary(
        &self,
        domain: &Domain,
        responses: &[Response],
    ) -> Result<DomainSummary, ScoringError> {
        if domain.questions.is_empty() {
            return Err(ScoringError::InvalidInput(format!(
                "domain '{}' has no questions",
                domain.title()
            )));
        }
        if responses.len() != domain.questions.len() {
            return Err(ScoringError::InvalidInput(format!(
                "domain '{}' has {} questions but {} responses",
                domain.title(),
                domain.questions.len(),
                responses.len()
            )));
        }

        for (question, response) in domain.questions.iter().zip(responses) {
            if response.score > MAX_SCORE {
                return Err(ScoringError::ScoreOutOfRange {
                    label: question.label(),
                    score: response.score,
                });
            }
        }

        let scores: Vec<u8> = responses.iter().map(|r| r.score).collect();
        let mean_score = rounded_mean(&scores, self.precision);
        let min_score = scores.iter().copied().min().unwrap_or(0);

        // All ties, in question order
        let lowest_questions = domain
            .questions
            .iter()
            .zip(&scores)
            .filter(|(_, score)| **score == min_score)
            .map(|(q, _)| q.label())
            .collect();

        Ok(DomainSummary {
            domain_id: domain.id,
            title: domain.title(),
            mean_score,
            ranking: classify(mean_score),
            min_score,
            lowest_questions,
        })
    }

    /// Summarise every domain, preserving domain order.
    pub fn overall_summary(
        &self,
        domains: &[Domain],
        responses: &ResponseMatrix,
    ) -> Result<Vec<DomainSummary>, ScoringError> {
        domains
            .iter()
            .map(|domain| {
                let domain_responses = responses.domain_responses(domain)?;
                self.domain_summary(domain, &domain_responses)
            })
            .collect()
    }
}

/// The `n` lowest-scoring domains, lowest first. Ties keep domain order.
pub fn weakest_domains(summaries: &[DomainSummary], n: usize) -> Vec<&DomainSummary> {
    let mut sorted: Vec<&DomainSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.mean_score.total_cmp(&b.mean_score));
    sorted.truncate(n);
    sorted
}

/// Domains ranked strictly below `level`.
pub fn domains_below(summaries: &[DomainSummary], level: RankingLabel) -> Vec<&DomainSummary> {
    summaries.iter().filter(|s| s.ranking < level).collect()
}

/// Number of domains per ranking label. Every label is present.
pub fn ranking_distribution(summaries: &[DomainSummary]) -> BTreeMap<RankingLabel, usize> {
    let mut dist: BTreeMap<RankingLabel, usize> =
        RankingLabel::ALL.iter().map(|&label| (label, 0)).collect();

    for summary in summaries {
        *dist.entry(summary.ranking).or_default() += 1;
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::FillPolicy;
    use crate::models::{Assessment, ResponseRecord};
    use crate::taxonomy::{Taxonomy, TaxonomyPreset};

    fn leadership() -> Domain {
        Taxonomy::preset(TaxonomyPreset::Canonical)
            .domain(1)
            .cloned()
            .unwrap()
    }

    fn responses(scores: &[u8]) -> Vec<Response> {
        scores.iter().map(|&s| Response::new(s)).collect()
    }

    fn summarise(scores: &[u8]) -> DomainSummary {
        ScoreAggregator::default()
            .domain_summary(&leadership(), &responses(scores))
            .unwrap()
    }

    #[test]
    fn test_single_low_question() {
        let summary = summarise(&[10, 10, 10, 2]);

        assert_eq!(summary.domain_id, 1);
        assert_eq!(summary.title, "1. LEADERSHIP & GOVERNANCE");
        assert_eq!(summary.mean_score, 8.0);
        assert_eq!(summary.ranking, RankingLabel::VeryHigh);
        assert_eq!(summary.min_score, 2);
        assert_eq!(
            summary.lowest_questions,
            vec!["1.4 Is PS integrated into strategic planning?"]
        );
    }

    #[test]
    fn test_all_tied() {
        let summary = summarise(&[5, 5, 5, 5]);

        assert_eq!(summary.mean_score, 5.0);
        assert_eq!(summary.ranking, RankingLabel::Average);
        assert_eq!(summary.lowest_questions.len(), 4);
        assert!(summary.lowest_questions[0].starts_with("1.1 "));
        assert!(summary.lowest_questions[3].starts_with("1.4 "));
    }

    #[test]
    fn test_all_zero() {
        let summary = summarise(&[0, 0, 0, 0]);

        assert_eq!(summary.mean_score, 0.0);
        assert_eq!(summary.ranking, RankingLabel::VeryLow);
        assert_eq!(summary.min_score, 0);
    }

    #[test]
    fn test_partial_tie_keeps_question_order() {
        let summary = summarise(&[7, 2, 9, 2]);

        assert_eq!(
            summary.lowest_questions,
            vec![
                "1.2 Is there a PS committee or team that meets regularly?",
                "1.4 Is PS integrated into strategic planning?",
            ]
        );
    }

    #[test]
    fn test_rounding() {
        // 25 / 4 = 6.25
        assert_eq!(summarise(&[6, 6, 6, 7]).mean_score, 6.3);
        // 22 / 3 = 7.333...
        let aggregator = ScoreAggregator::new(Precision::TwoDecimals);
        let domain = Domain::new(9, "THREE", &["a", "b", "c"]);
        let summary = aggregator
            .domain_summary(&domain, &responses(&[7, 7, 8]))
            .unwrap();
        assert_eq!(summary.mean_score, 7.33);

        let summary = ScoreAggregator::default()
            .domain_summary(&domain, &responses(&[7, 7, 8]))
            .unwrap();
        assert_eq!(summary.mean_score, 7.3);

        // 1.666... rounds up
        let summary = ScoreAggregator::default()
            .domain_summary(&domain, &responses(&[1, 2, 2]))
            .unwrap();
        assert_eq!(summary.mean_score, 1.7);
        assert_eq!(summary.ranking, RankingLabel::VeryLow);
    }

    #[test]
    fn test_mean_within_bounds() {
        let domain = Domain::new(1, "ONE", &["a", "b", "c"]);
        let aggregator = ScoreAggregator::new(Precision::TwoDecimals);

        for a in 0..=10u8 {
            for b in 0..=10u8 {
                let scores = [a, b, 10 - a];
                let summary = aggregator
                    .domain_summary(&domain, &responses(&scores))
                    .unwrap();
                let exact = f64::from(a + b + (10 - a)) / 3.0;

                assert!((0.0..=10.0).contains(&summary.mean_score));
                assert!((summary.mean_score - exact).abs() <= 0.005 + f64::EPSILON);
                assert_eq!(summary.min_score, *scores.iter().min().unwrap());
            }
        }
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0.0), RankingLabel::VeryLow);
        assert_eq!(classify(1.99), RankingLabel::VeryLow);
        assert_eq!(classify(2.0), RankingLabel::Low);
        assert_eq!(classify(3.999), RankingLabel::Low);
        assert_eq!(classify(4.0), RankingLabel::Average);
        assert_eq!(classify(5.99), RankingLabel::Average);
        assert_eq!(classify(6.0), RankingLabel::High);
        assert_eq!(classify(7.99), RankingLabel::High);
        assert_eq!(classify(8.0), RankingLabel::VeryHigh);
        assert_eq!(classify(10.0), RankingLabel::VeryHigh);
    }

    #[test]
    fn test_invalid_input() {
        let aggregator = ScoreAggregator::default();
        let domain = leadership();

        let err = aggregator.domain_summary(&domain, &[]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));

        let err = aggregator
            .domain_summary(&domain, &responses(&[1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));

        let err = aggregator
            .domain_summary(&domain, &responses(&[1, 2, 3, 11]))
            .unwrap_err();
        assert!(matches!(err, ScoringError::ScoreOutOfRange { score: 11, .. }));

        let empty = Domain::new::<&str>(5, "EMPTY", &[]);
        let err = aggregator.domain_summary(&empty, &[]).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidInput(_)));
    }

    #[test]
    fn test_idempotent() {
        let aggregator = ScoreAggregator::default();
        let domain = leadership();
        let input = responses(&[3, 8, 3, 6]);

        let first = serde_json::to_string(&aggregator.domain_summary(&domain, &input).unwrap())
            .unwrap();
        let second = serde_json::to_string(&aggregator.domain_summary(&domain, &input).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overall_summary_preserves_order() {
        let taxonomy = Taxonomy::preset(TaxonomyPreset::Canonical);
        let assessment = Assessment {
            project_name: "Ward 3".to_string(),
            responses: vec![
                ResponseRecord {
                    domain: 7,
                    question: 1,
                    score: 0,
                    note: None,
                },
                ResponseRecord {
                    domain: 2,
                    question: 3,
                    score: 10,
                    note: None,
                },
            ],
            ..Default::default()
        };
        let matrix = ResponseMatrix::build(&taxonomy, &assessment, FillPolicy::default()).unwrap();

        let summaries = ScoreAggregator::default()
            .overall_summary(taxonomy.domains(), &matrix)
            .unwrap();

        let ids: Vec<u8> = summaries.iter().map(|s| s.domain_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(summaries[1].mean_score, 6.3);
        assert_eq!(summaries[6].mean_score, 3.8);
        assert_eq!(summaries[6].ranking, RankingLabel::Low);
        assert_eq!(summaries[6].lowest_questions.len(), 1);
    }

    #[test]
    fn test_overall_summary_missing_response() {
        let taxonomy = Taxonomy::preset(TaxonomyPreset::Foundation);
        let result =
            ScoreAggregator::default().overall_summary(taxonomy.domains(), &ResponseMatrix::new());
        assert!(matches!(
            result,
            Err(ScoringError::MissingResponse {
                domain: 1,
                question: 1
            })
        ));
    }

    #[test]
    fn test_weakest_and_below() {
        let aggregator = ScoreAggregator::default();
        let domain = leadership();
        let summaries = vec![
            aggregator.domain_summary(&domain, &responses(&[9, 9, 9, 9])).unwrap(),
            aggregator.domain_summary(&domain, &responses(&[3, 3, 3, 3])).unwrap(),
            aggregator.domain_summary(&domain, &responses(&[1, 1, 1, 1])).unwrap(),
            aggregator.domain_summary(&domain, &responses(&[3, 3, 3, 3])).unwrap(),
        ];

        let weakest = weakest_domains(&summaries, 3);
        assert_eq!(weakest.len(), 3);
        assert_eq!(weakest[0].mean_score, 1.0);
        assert!(std::ptr::eq(weakest[1], &summaries[1]));
        assert!(std::ptr::eq(weakest[2], &summaries[3]));

        assert_eq!(domains_below(&summaries, RankingLabel::Average).len(), 3);
        assert_eq!(domains_below(&summaries, RankingLabel::Low).len(), 1);
        assert!(domains_below(&summaries, RankingLabel::VeryLow).is_empty());

        let dist = ranking_distribution(&summaries);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[&RankingLabel::Low], 2);
        assert_eq!(dist[&RankingLabel::VeryHigh], 1);
        assert_eq!(dist[&RankingLabel::High], 0);
    }

    #[test]
    fn test_precision_from_decimals() {
        assert_eq!(Precision::from_decimals(1).unwrap(), Precision::OneDecimal);
        assert_eq!(Precision::from_decimals(2).unwrap().decimals(), 2);
        assert!(Precision::from_decimals(3).is_err());
    }
}
