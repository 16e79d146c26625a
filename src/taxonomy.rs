//! Domain and question taxonomies.
//!
//! The taxonomy is data: two compiled-in presets plus custom domain
//! tables loaded from `.pspa.toml`. One aggregator serves all of them.

use crate::config::TaxonomyConfig;
use crate::error::ScoringError;
use crate::models::Domain;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Built-in taxonomy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyPreset {
    /// Seven domains, four questions each
    #[default]
    Canonical,
    /// The first two canonical domains only
    Foundation,
}

impl fmt::Display for TaxonomyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyPreset::Canonical => write!(f, "canonical"),
            TaxonomyPreset::Foundation => write!(f, "foundation"),
        }
    }
}

/// An ordered, immutable set of domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    name: String,
    domains: Vec<Domain>,
}

const CANONICAL: &[(&str, [&str; 4])] = &[
    (
        "LEADERSHIP & GOVERNANCE",
        [
            "Are PS responsibilities clearly assigned?",
            "Is there a PS committee or team that meets regularly?",
            "Are there PS indicators being tracked?",
            "Is PS integrated into strategic planning?",
        ],
    ),
    (
        "STAFFING, SKILLS & SAFETY CULTURE",
        [
            "Is there a shortage of critical staff?",
            "Do staff feel safe to report incidents?",
            "Are regular trainings on PS and IPC conducted?",
            "Do staff feel supported to raise concerns?",
        ],
    ),
    (
        "RISK MANAGEMENT & INCIDENT REPORTING",
        [
            "Is there a functioning incident reporting system?",
            "Are incidents analysed to identify root causes?",
            "Is feedback given to staff after incidents are reported?",
            "Is a risk register maintained and reviewed?",
        ],
    ),
    (
        "INFECTION PREVENTION & CONTROL",
        [
            "Are hand hygiene facilities available at points of care?",
            "Is hand hygiene compliance monitored?",
            "Are IPC guidelines available and followed?",
            "Is PPE consistently available?",
        ],
    ),
    (
        "MEDICATION SAFETY",
        [
            "Are high-alert medications identified and managed?",
            "Are medication errors reported and reviewed?",
            "Is medication reconciliation performed at transitions of care?",
            "Are storage and labelling practices safe?",
        ],
    ),
    (
        "PATIENT & FAMILY ENGAGEMENT",
        [
            "Are patients informed about their care and risks?",
            "Can patients and families raise safety concerns?",
            "Are patients involved in safety improvement activities?",
            "Is patient feedback used to improve safety?",
        ],
    ),
    (
        "MONITORING, EVALUATION & SUSTAINABILITY",
        [
            "Are project objectives measurable?",
            "Is progress reviewed against a baseline?",
            "Are results shared with staff and leadership?",
            "Is there a plan to sustain improvements?",
        ],
    ),
];

impl Taxonomy {
    /// Build a taxonomy from domains, validating its shape.
    pub fn new(name: impl Into<String>, domains: Vec<Domain>) -> Result<Self, ScoringError> {
        let taxonomy = Self {
            name: name.into(),
            domains,
        };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load a preset.
    pub fn preset(preset: TaxonomyPreset) -> Self {
        let count = match preset {
            TaxonomyPreset::Canonical => CANONICAL.len(),
            TaxonomyPreset::Foundation => 2,
        };

        let domains = CANONICAL
            .iter()
            .take(count)
            .zip(1..=u8::MAX)
            .map(|((name, questions), id)| Domain::new(id, name, questions))
            .collect();

        Self {
            name: preset.to_string(),
            domains,
        }
    }

    /// Resolve the taxonomy described by configuration.
    ///
    /// Custom domain tables take precedence over the preset.
    pub fn from_config(config: &TaxonomyConfig) -> Result<Self, ScoringError> {
        if config.domains.is_empty() {
            debug!("Using {} taxonomy preset", config.preset);
            return Ok(Self::preset(config.preset));
        }

        debug!("Using custom taxonomy with {} domains", config.domains.len());
        if let Some(d) = config
            .domains
            .iter()
            .find(|d| d.questions.len() > u8::MAX as usize)
        {
            return Err(ScoringError::InvalidTaxonomy(format!(
                "domain '{}' has more than {} questions",
                d.name,
                u8::MAX
            )));
        }

        let domains = config
            .domains
            .iter()
            .map(|d| Domain::new(d.id, &d.name, d.questions.as_slice()))
            .collect();

        Self::new("custom", domains)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Look up a domain by ordinal.
    pub fn domain(&self, id: u8) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id == id)
    }

    /// Total number of questions across all domains.
    pub fn question_count(&self) -> usize {
        self.domains.iter().map(|d| d.questions.len()).sum()
    }

    fn validate(&self) -> Result<(), ScoringError> {
        if self.domains.is_empty() {
            return Err(ScoringError::InvalidTaxonomy(
                "taxonomy has no domains".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for domain in &self.domains {
            if domain.id == 0 {
                return Err(ScoringError::InvalidTaxonomy(format!(
                    "domain '{}' has ordinal 0; ordinals start at 1",
                    domain.name
                )));
            }
            if !seen.insert(domain.id) {
                return Err(ScoringError::InvalidTaxonomy(format!(
                    "duplicate domain ordinal {}",
                    domain.id
                )));
            }
            if domain.questions.is_empty() {
                return Err(ScoringError::InvalidTaxonomy(format!(
                    "domain '{}' has no questions",
                    domain.title()
                )));
            }
        }

        Ok(())
    }
}
