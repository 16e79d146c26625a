//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::taxonomy::TaxonomyPreset;
use clap::Parser;
use std::path::PathBuf;

/// PSPA - Patient safety project adequacy scorer
///
/// Scores saved self-assessments per domain (mean, ranking, lowest
/// questions) and writes Markdown, JSON or CSV reports.
///
/// Examples:
///   pspa --input ward3.json
///   pspa --input ward3.json --format csv --output ward3.csv
///   pspa --input-dir ./evaluations --output-dir ./reports
///   pspa --init-assessment ward3.json --taxonomy foundation
///   pspa --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Assessment JSON file to score
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present_any = ["input_dir", "init_config", "init_assessment", "list_domains"]
    )]
    pub input: Option<PathBuf>,

    /// Directory of assessment JSON files to score in one run
    #[arg(long, value_name = "DIR", conflicts_with = "input")]
    pub input_dir: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to <date>_<Project_Name>_PSPA_Report.<ext>
    #[arg(short, long, value_name = "FILE", conflicts_with = "input_dir")]
    pub output: Option<PathBuf>,

    /// Directory for reports written in batch mode
    #[arg(long, value_name = "DIR", requires = "input_dir")]
    pub output_dir: Option<PathBuf>,

    /// Output format (markdown, json, csv)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pspa.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Built-in taxonomy to score against
    #[arg(long, value_name = "PRESET", env = "PSPA_TAXONOMY")]
    pub taxonomy: Option<TaxonomyPreset>,

    /// Decimal places for domain means (1 or 2)
    #[arg(long, value_name = "N")]
    pub decimals: Option<u32>,

    /// Fail on unanswered questions instead of using the default score
    #[arg(long)]
    pub strict: bool,

    /// Fail if any domain is ranked below this level
    ///
    /// Exit code 2 when the threshold is not met.
    /// Values: very-low, low, average, high, very-high
    #[arg(long, value_name = "LEVEL")]
    pub fail_below: Option<RankLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .pspa.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Write a blank assessment with every question at the default score
    #[arg(long, value_name = "FILE")]
    pub init_assessment: Option<PathBuf>,

    /// Print the domains and questions of the active taxonomy
    #[arg(long)]
    pub list_domains: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// Comma-separated values, one row per domain
    Csv,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Ranking level for --fail-below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum RankLevel {
    VeryLow,
    Low,
    Average,
    High,
    VeryHigh,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(decimals) = self.decimals {
            if !(1..=2).contains(&decimals) {
                return Err("Decimals must be 1 or 2".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Assessment file does not exist: {}", input.display()));
            }
        }

        if let Some(ref dir) = self.input_dir {
            if !dir.exists() {
                return Err(format!("Input directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Input path is not a directory: {}", dir.display()));
            }
        }

        if let Some(ref target) = self.init_assessment {
            if target.exists() {
                return Err(format!(
                    "{} already exists. Remove it first or choose another path.",
                    target.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
