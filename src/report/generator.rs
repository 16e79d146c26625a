//! Report assembly and rendering.
//!
//! This module builds the report structure from computed domain
//! summaries and renders it as Markdown, JSON, or CSV.

use crate::analysis::{ranking_distribution, weakest_domains, Precision};
use crate::assessment::ResponseMatrix;
use crate::config::ReportConfig;
use crate::models::{
    Assessment, ChartPoint, DomainSummary, ExportRow, QuestionScore, RankingLabel, Report,
    ReportMetadata,
};
use crate::taxonomy::Taxonomy;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

/// Assemble the full report for one scored assessment.
pub fn build_report(
    assessment: &Assessment,
    taxonomy: &Taxonomy,
    matrix: &ResponseMatrix,
    summaries: Vec<DomainSummary>,
    precision: Precision,
) -> Report {
    let questions: Vec<QuestionScore> = taxonomy
        .domains()
        .iter()
        .flat_map(|d| &d.questions)
        .filter_map(|q| {
            matrix.get(q.key()).map(|response| QuestionScore {
                domain_id: q.domain,
                label: q.label(),
                score: response.score,
                note: response.note.clone(),
                defaulted: matrix.is_defaulted(q.key()),
            })
        })
        .collect();

    let metadata = ReportMetadata {
        project_name: assessment.project_name.clone(),
        objectives: assessment.objectives.clone(),
        assessor: assessment.assessor.clone(),
        generated_at: Utc::now(),
        taxonomy: taxonomy.name().to_string(),
        decimals: precision.decimals(),
        domains_scored: summaries.len(),
        questions_scored: questions.len(),
        defaulted_responses: matrix.defaulted_count(),
    };

    let chart = summaries
        .iter()
        .map(|s| ChartPoint {
            axis: s.title.clone(),
            value: s.mean_score,
            color: s.ranking.color().to_string(),
        })
        .collect();

    Report {
        rows: export_rows(&summaries, assessment),
        recommendations: build_recommendations(&summaries, assessment, precision, &metadata),
        metadata,
        summaries,
        questions,
        chart,
    }
}

/// Flatten summaries and improvement plans into one row per domain.
pub fn export_rows(summaries: &[DomainSummary], assessment: &Assessment) -> Vec<ExportRow> {
    summaries
        .iter()
        .map(|summary| {
            let plan = assessment.plan_for(summary.domain_id);
            ExportRow {
                domain: summary.title.clone(),
                score: summary.mean_score,
                ranking: summary.ranking,
                lowest_questions: summary.lowest_questions.join(", "),
                action: plan.map(|p| p.action.clone()).unwrap_or_default(),
                responsible: plan.map(|p| p.responsible.clone()).unwrap_or_default(),
                review_date: plan
                    .and_then(|p| p.review_date)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn build_recommendations(
    summaries: &[DomainSummary],
    assessment: &Assessment,
    precision: Precision,
    metadata: &ReportMetadata,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    let decimals = precision.decimals();

    let below: Vec<&DomainSummary> = weakest_domains(summaries, summaries.len())
        .into_iter()
        .filter(|s| s.ranking < RankingLabel::Average)
        .collect();

    for summary in &below {
        recommendations.push(format!(
            "Prioritise {} ({:.*}/10, {}): start with {}.",
            summary.title,
            decimals,
            summary.mean_score,
            summary.ranking,
            summary.lowest_questions.join("; ")
        ));

        match assessment.plan_for(summary.domain_id) {
            Some(plan) if !plan.action.trim().is_empty() => {
                if plan.review_date.is_none() {
                    recommendations.push(format!(
                        "Set a review date for the {} improvement action.",
                        summary.title
                    ));
                }
            }
            _ => recommendations.push(format!(
                "Record an improvement action and owner for {}.",
                summary.title
            )),
        }
    }

    if below.is_empty() {
        if let Some(weakest) = weakest_domains(summaries, 1).first() {
            recommendations.push(format!(
                "All domains are rated Average or above. Keep tracking {} ({:.*}/10).",
                weakest.title, decimals, weakest.mean_score
            ));
        }
    }

    if metadata.defaulted_responses > 0 {
        recommendations.push(format!(
            "{} questions were unanswered and scored with the default value; complete them for an accurate picture.",
            metadata.defaulted_responses
        ));
    }

    recommendations
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Patient Safety Project Adequacy Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(report));

    if config.include_chart {
        output.push_str(&generate_chart_section(report, config.chart_width));
    }

    output.push_str(&generate_details_section(report, config.include_notes));
    output.push_str(&generate_plan_section(&report.rows));
    output.push_str(&generate_recommendations_section(&report.recommendations));
    output.push_str(&generate_footer());

    output
}

/// Generate the project and metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Project\n\n");
    section.push_str(&format!("- **Project:** {}\n", metadata.project_name));
    if let Some(ref assessor) = metadata.assessor {
        section.push_str(&format!("- **Assessor:** {}\n", assessor));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Taxonomy:** {} ({} domains, {} questions)\n",
        metadata.taxonomy, metadata.domains_scored, metadata.questions_scored
    ));
    if metadata.defaulted_responses > 0 {
        section.push_str(&format!(
            "- **Unanswered (defaulted):** {}\n",
            metadata.defaulted_responses
        ));
    }
    section.push('\n');

    section.push_str("### Objectives\n\n");
    if metadata.objectives.trim().is_empty() {
        section.push_str("_None recorded._\n\n");
    } else {
        section.push_str(metadata.objectives.trim());
        section.push_str("\n\n");
    }

    section
}

/// Generate the domain summary table.
fn generate_summary_section(report: &Report) -> String {
    let mut section = String::new();
    let decimals = report.metadata.decimals;

    section.push_str("## Summary of Scores by Domain\n\n");
    section.push_str("| Domain | Score | Ranking | Lowest Question(s) |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");

    for summary in &report.summaries {
        section.push_str(&format!(
            "| {} | {:.*}/10 | {} {} | {} |\n",
            table_cell(&summary.title),
            decimals,
            summary.mean_score,
            summary.ranking.emoji(),
            summary.ranking,
            table_cell(&summary.lowest_questions.join("<br>")),
        ));
    }
    section.push('\n');

    let dist = ranking_distribution(&report.summaries);
    section.push_str("### Ranking Distribution\n\n");
    let header: Vec<String> = dist
        .keys()
        .map(|label| format!("{} {}", label.emoji(), label))
        .collect();
    let counts: Vec<String> = dist.values().map(|c| c.to_string()).collect();
    section.push_str(&format!("| {} |\n", header.join(" | ")));
    section.push_str(&format!("|{}\n", ":---:|".repeat(dist.len())));
    section.push_str(&format!("| {} |\n\n", counts.join(" | ")));

    section
}

/// Generate a text bar chart of domain means.
fn generate_chart_section(report: &Report, width: usize) -> String {
    let mut section = String::new();
    let decimals = report.metadata.decimals;

    section.push_str("## Score Chart\n\n```text\n");

    let label_width = report
        .chart
        .iter()
        .map(|p| p.axis.chars().count())
        .max()
        .unwrap_or(0);

    for (point, summary) in report.chart.iter().zip(&report.summaries) {
        section.push_str(&format!(
            "{:<label_width$}  {}  {:.*} {}\n",
            point.axis,
            score_bar(point.value, width),
            decimals,
            point.value,
            summary.ranking,
        ));
    }

    section.push_str("```\n\n");
    section
}

/// Render a score in [0, 10] as a bar `width` characters wide.
fn score_bar(score: f64, width: usize) -> String {
    let filled = ((score.clamp(0.0, 10.0) / 10.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Generate per-question detail for each domain.
fn generate_details_section(report: &Report, include_notes: bool) -> String {
    let mut section = String::new();

    section.push_str("## Domain Details\n\n");

    for summary in &report.summaries {
        section.push_str(&format!("### {}\n\n", summary.title));

        if include_notes {
            section.push_str("| Question | Score | Note |\n");
            section.push_str("|:---|:---:|:---|\n");
        } else {
            section.push_str("| Question | Score |\n");
            section.push_str("|:---|:---:|\n");
        }

        for question in report
            .questions
            .iter()
            .filter(|q| q.domain_id == summary.domain_id)
        {
            let marker = if question.defaulted { " *" } else { "" };
            let lowest = if question.score == summary.min_score {
                " ⬇"
            } else {
                ""
            };

            if include_notes {
                section.push_str(&format!(
                    "| {}{} | {}{} | {} |\n",
                    table_cell(&question.label),
                    lowest,
                    question.score,
                    marker,
                    table_cell(question.note.as_deref().unwrap_or(""))
                ));
            } else {
                section.push_str(&format!(
                    "| {}{} | {}{} |\n",
                    table_cell(&question.label),
                    lowest,
                    question.score,
                    marker
                ));
            }
        }
        section.push('\n');
    }

    if report.questions.iter().any(|q| q.defaulted) {
        section.push_str("_\\* unanswered, scored with the default value. ⬇ lowest in domain._\n\n");
    } else {
        section.push_str("_⬇ lowest in domain._\n\n");
    }

    section
}

/// Generate the improvement plan table.
fn generate_plan_section(rows: &[ExportRow]) -> String {
    let mut section = String::new();

    section.push_str("## Improvement Plan\n\n");

    if rows
        .iter()
        .all(|r| r.action.is_empty() && r.responsible.is_empty() && r.review_date.is_empty())
    {
        section.push_str("No improvement actions recorded.\n\n");
        return section;
    }

    section.push_str("| Domain | Action | Responsible | Review Date |\n");
    section.push_str("|:---|:---|:---|:---:|\n");

    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            table_cell(&row.domain),
            table_cell(&row.action),
            table_cell(&row.responsible),
            row.review_date
        ));
    }
    section.push('\n');

    section
}

/// Generate the recommendations section.
fn generate_recommendations_section(recommendations: &[String]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by PSPA v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Escape text for a Markdown table cell.
fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// One CSV record, with the column headers of the export table.
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Domain")]
    domain: &'a str,
    #[serde(rename = "Score")]
    score: String,
    #[serde(rename = "Ranking")]
    ranking: RankingLabel,
    #[serde(rename = "Lowest Questions")]
    lowest_questions: &'a str,
    #[serde(rename = "Improvement Action")]
    action: &'a str,
    #[serde(rename = "Responsible")]
    responsible: &'a str,
    #[serde(rename = "Review Date")]
    review_date: &'a str,
}

/// Generate a CSV table with one export row per domain.
pub fn generate_csv_report(report: &Report) -> Result<String> {
    let decimals = report.metadata.decimals;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(vec![]);

    for row in &report.rows {
        writer.serialize(CsvRow {
            domain: &row.domain,
            score: format!("{:.*}", decimals, row.score),
            ranking: row.ranking,
            lowest_questions: &row.lowest_questions,
            action: &row.action,
            responsible: &row.responsible,
            review_date: &row.review_date,
        })?;
    }

    writer.flush()?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Default report file name: `<date>_<Project_Name>_PSPA_Report.<ext>`.
///
/// Whitespace, control characters and characters that are not allowed in
/// file names become `_`.
pub fn default_report_filename(project_name: &str, date: NaiveDate, extension: &str) -> String {
    let project = project_name.trim();
    let project: String = if project.is_empty() {
        "Untitled".to_string()
    } else {
        project
            .chars()
            .map(|c| {
                if c.is_whitespace() || c.is_control() || "<>:\"/\\|?*".contains(c) {
                    '_'
                } else {
                    c
                }
            })
            .collect()
    };

    format!(
        "{}_{}_PSPA_Report.{}",
        date.format("%Y-%m-%d"),
        project,
        extension
    )
}
