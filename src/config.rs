//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.pspa.toml` files.

use crate::taxonomy::TaxonomyPreset;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".pspa.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Taxonomy settings.
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Batch scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory batch reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Decimal places for mean scores (1 or 2).
    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Score given to unanswered questions.
    #[serde(default = "default_score")]
    pub default_score: u8,

    /// Reject assessments with unanswered questions instead of filling them.
    #[serde(default)]
    pub strict: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            default_score: default_score(),
            strict: false,
        }
    }
}

fn default_decimals() -> u32 {
    1
}

fn default_score() -> u8 {
    5 // slider mid-point
}

/// Taxonomy settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    /// Built-in preset used when no custom domains are given.
    #[serde(default)]
    pub preset: TaxonomyPreset,

    /// Custom domains, replacing the preset when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<DomainConfig>,
}

/// One custom domain table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// 1-based ordinal.
    pub id: u8,
    /// Name without the ordinal prefix.
    pub name: String,
    /// Question prompts in display order.
    pub questions: Vec<String>,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include per-question notes in the Markdown report.
    #[serde(default = "default_true")]
    pub include_notes: bool,

    /// Include the text bar chart in the Markdown report.
    #[serde(default = "default_true")]
    pub include_chart: bool,

    /// Width of a full-score bar, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_notes: true,
            include_chart: true,
            chart_width: default_chart_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chart_width() -> usize {
    20
}

/// Batch scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum assessment files per batch.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File extensions treated as assessments.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory or file names to skip.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    500
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

fn default_excludes() -> Vec<String> {
    vec!["node_modules", "target", "reports"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1MB
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // An explicit preset replaces any custom domain tables
        if let Some(preset) = args.taxonomy {
            self.taxonomy.preset = preset;
            self.taxonomy.domains.clear();
        }

        if let Some(decimals) = args.decimals {
            self.scoring.decimals = decimals;
        }

        if args.strict {
            self.scoring.strict = true;
        }

        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scoring.decimals, 1);
        assert_eq!(config.scoring.default_score, 5);
        assert!(!config.scoring.strict);
        assert_eq!(config.taxonomy.preset, TaxonomyPreset::Canonical);
        assert!(config.scanner.extensions.contains(&"json".to_string()));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output_dir = "reports"

[scoring]
decimals = 2
strict = true

[taxonomy]
preset = "foundation"

[[taxonomy.domains]]
id = 1
name = "TEAMWORK"
questions = ["Are handovers structured?", "Are huddles held daily?"]

[report]
chart_width = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output_dir, "reports");
        assert_eq!(config.scoring.decimals, 2);
        assert_eq!(config.scoring.default_score, 5);
        assert!(config.scoring.strict);
        assert_eq!(config.taxonomy.preset, TaxonomyPreset::Foundation);
        assert_eq!(config.taxonomy.domains.len(), 1);
        assert_eq!(config.taxonomy.domains[0].questions.len(), 2);
        assert_eq!(config.report.chart_width, 10);
        assert!(config.report.include_notes);
    }

    #[test]
    fn test_merge_with_args() {
        use clap::Parser;

        let mut config: Config = toml::from_str(
            r#"
[scoring]
decimals = 1

[[taxonomy.domains]]
id = 1
name = "TEAMWORK"
questions = ["Are handovers structured?"]
"#,
        )
        .unwrap();

        let args = crate::cli::Args::try_parse_from([
            "pspa",
            "--input-dir",
            "evaluations",
            "--output-dir",
            "reports",
            "--taxonomy",
            "foundation",
            "--decimals",
            "2",
            "--strict",
            "--verbose",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.general.output_dir, "reports");
        assert_eq!(config.scoring.decimals, 2);
        assert!(config.scoring.strict);
        assert_eq!(config.taxonomy.preset, TaxonomyPreset::Foundation);
        assert!(config.taxonomy.domains.is_empty());
        assert!(!Config::default_toml().contains("verbose"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scoring]"));
        assert!(toml_str.contains("[taxonomy]"));
        assert!(toml_str.contains("preset = \"canonical\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scoring.decimals, 1);
    }
}
