//! Data models for the assessment scorer.
//!
//! This module contains the core data structures used throughout
//! the application for representing the taxonomy, submitted
//! responses, computed summaries, and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest score a question can receive.
pub const MAX_SCORE: u8 = 10;

/// A single evaluation item within a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Ordinal of the owning domain.
    pub domain: u8,
    /// 1-based position within the domain.
    pub position: u8,
    /// Prompt text.
    pub text: String,
}

impl Question {
    /// Display label, e.g. `1.4 Is PS integrated into strategic planning?`.
    pub fn label(&self) -> String {
        format!("{}.{} {}", self.domain, self.position, self.text)
    }

    /// Typed key used to look up this question's response.
    pub fn key(&self) -> ResponseKey {
        ResponseKey {
            domain: self.domain,
            question: self.position,
        }
    }
}

/// One evaluation category with its ordered questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// 1-based ordinal.
    pub id: u8,
    /// Name without the ordinal prefix.
    pub name: String,
    /// Questions in display order.
    pub questions: Vec<Question>,
}

impl Domain {
    /// Build a domain, numbering the questions from 1.
    pub fn new<S: AsRef<str>>(id: u8, name: &str, questions: &[S]) -> Self {
        let questions = questions
            .iter()
            .zip(1..=u8::MAX)
            .map(|(text, position)| Question {
                domain: id,
                position,
                text: text.as_ref().to_string(),
            })
            .collect();

        Self {
            id,
            name: name.to_string(),
            questions,
        }
    }

    /// Title with ordinal prefix, e.g. `1. LEADERSHIP & GOVERNANCE`.
    pub fn title(&self) -> String {
        format!("{}. {}", self.id, self.name)
    }

    /// Look up a question by its 1-based position.
    pub fn question(&self, position: u8) -> Option<&Question> {
        self.questions.iter().find(|q| q.position == position)
    }
}

/// Key of a response: domain ordinal and 1-based question position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResponseKey {
    pub domain: u8,
    pub question: u8,
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.question)
    }
}

/// A submitted score with an optional note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Response {
    /// Create a response without a note.
    pub fn new(score: u8) -> Self {
        Self { score, note: None }
    }
}

/// Serialized form of one response inside an assessment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub domain: u8,
    pub question: u8,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResponseRecord {
    pub fn key(&self) -> ResponseKey {
        ResponseKey {
            domain: self.domain,
            question: self.question,
        }
    }
}

/// Improvement plan metadata for one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprovementPlan {
    /// Domain ordinal the plan belongs to.
    pub domain: u8,
    /// Planned improvement action.
    #[serde(default)]
    pub action: String,
    /// Responsible person or team.
    #[serde(default)]
    pub responsible: String,
    /// Date the plan will be reviewed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,
}

/// The full set of inputs for one project evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Name of the assessed project.
    pub project_name: String,
    /// Free-text project objectives.
    #[serde(default)]
    pub objectives: String,
    /// Person who filled in the assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessor: Option<String>,
    /// Submitted scores.
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
    /// Per-domain improvement plans.
    #[serde(default)]
    pub plans: Vec<ImprovementPlan>,
}

impl Assessment {
    /// Returns the improvement plan recorded for a domain, if any.
    pub fn plan_for(&self, domain: u8) -> Option<&ImprovementPlan> {
        self.plans.iter().find(|p| p.domain == domain)
    }
}

/// Classification of a domain's mean score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RankingLabel {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl fmt::Display for RankingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingLabel::VeryLow => write!(f, "Very Low"),
            RankingLabel::Low => write!(f, "Low"),
            RankingLabel::Average => write!(f, "Average"),
            RankingLabel::High => write!(f, "High"),
            RankingLabel::VeryHigh => write!(f, "Very High"),
        }
    }
}

impl RankingLabel {
    /// All labels from lowest to highest.
    pub const ALL: [RankingLabel; 5] = [
        RankingLabel::VeryLow,
        RankingLabel::Low,
        RankingLabel::Average,
        RankingLabel::High,
        RankingLabel::VeryHigh,
    ];

    /// Returns an emoji representation of the label.
    pub fn emoji(&self) -> &'static str {
        match self {
            RankingLabel::VeryLow => "🔴",
            RankingLabel::Low => "🟠",
            RankingLabel::Average => "🟡",
            RankingLabel::High => "🟢",
            RankingLabel::VeryHigh => "🔵",
        }
    }

    /// Chart colour for the label.
    pub fn color(&self) -> &'static str {
        match self {
            RankingLabel::VeryLow => "#FF7F7F",
            RankingLabel::Low => "#FFD580",
            RankingLabel::Average => "#FFFF99",
            RankingLabel::High => "#90EE90",
            RankingLabel::VeryHigh => "#87CEEB",
        }
    }
}

/// Computed result for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSummary {
    /// Ordinal of the domain.
    pub domain_id: u8,
    /// Domain title with ordinal prefix.
    pub title: String,
    /// Rounded arithmetic mean of the scores.
    pub mean_score: f64,
    /// Classification of `mean_score`.
    pub ranking: RankingLabel,
    /// Lowest score in the domain.
    pub min_score: u8,
    /// Labels of every question scoring `min_score`, in domain order.
    pub lowest_questions: Vec<String>,
}

/// Flat per-domain record handed to report writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub domain: String,
    pub score: f64,
    pub ranking: RankingLabel,
    /// Comma-joined lowest question labels.
    pub lowest_questions: String,
    pub action: String,
    pub responsible: String,
    /// Review date as `YYYY-MM-DD`, empty when not set.
    pub review_date: String,
}

/// Score of one question as shown in the detailed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub domain_id: u8,
    pub label: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Whether the score was filled in with the default value.
    pub defaulted: bool,
}

/// One axis of the domain chart, in taxonomy order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub axis: String,
    pub value: f64,
    pub color: String,
}

/// Metadata about the assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Name of the assessed project.
    pub project_name: String,
    /// Free-text project objectives.
    pub objectives: String,
    /// Person who filled in the assessment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessor: Option<String>,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Name of the taxonomy used.
    pub taxonomy: String,
    /// Decimal places used for mean scores.
    pub decimals: usize,
    /// Number of domains scored.
    pub domains_scored: usize,
    /// Number of questions scored.
    pub questions_scored: usize,
    /// Number of unanswered questions filled with the default score.
    pub defaulted_responses: usize,
}

/// The complete assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Per-domain summaries in taxonomy order.
    pub summaries: Vec<DomainSummary>,
    /// Export rows in taxonomy order.
    pub rows: Vec<ExportRow>,
    /// Individual question scores.
    pub questions: Vec<QuestionScore>,
    /// Chart data for radar/bar renderers.
    pub chart: Vec<ChartPoint>,
    /// Improvement recommendations.
    pub recommendations: Vec<String>,
}
