//! Assessment file import and export.

use crate::error::ScoringError;
use crate::models::{Assessment, ImprovementPlan, ResponseRecord, MAX_SCORE};
use crate::taxonomy::Taxonomy;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Load an assessment from a JSON file.
pub fn load_assessment(path: &Path) -> Result<Assessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assessment: {}", path.display()))?;

    let assessment: Assessment = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse assessment: {}", path.display()))?;

    debug!(
        "Loaded assessment '{}' with {} responses",
        assessment.project_name,
        assessment.responses.len()
    );

    Ok(assessment)
}

/// Save an assessment as pretty-printed JSON.
pub fn save_assessment(assessment: &Assessment, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(assessment)?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write assessment: {}", path.display()))?;

    info!("Saved assessment to {}", path.display());
    Ok(())
}

/// A blank assessment with every question set to `default_score`
/// and an empty improvement plan per domain.
pub fn template(taxonomy: &Taxonomy, default_score: u8) -> Result<Assessment, ScoringError> {
    if default_score > MAX_SCORE {
        return Err(ScoringError::InvalidInput(format!(
            "default score {} is outside 0-10",
            default_score
        )));
    }

    let responses = taxonomy
        .domains()
        .iter()
        .flat_map(|d| &d.questions)
        .map(|q| ResponseRecord {
            domain: q.domain,
            question: q.position,
            score: default_score,
            note: None,
        })
        .collect();

    let plans = taxonomy
        .domains()
        .iter()
        .map(|d| ImprovementPlan {
            domain: d.id,
            ..Default::default()
        })
        .collect();

    Ok(Assessment {
        project_name: String::new(),
        objectives: String::new(),
        assessor: None,
        responses,
        plans,
    })
}
