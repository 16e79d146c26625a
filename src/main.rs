//! PSPA - Patient Safety Project Adequacy scorer
//!
//! A CLI tool that scores saved patient safety self-assessments
//! per domain and generates Markdown, JSON, or CSV reports.
//!
//! Exit codes:
//!   0 - Success (no domain below threshold, or no --fail-below set)
//!   1 - Runtime error (bad input, config, I/O, etc.)
//!   2 - A domain is ranked below the --fail-below threshold

mod analysis;
mod assessment;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod taxonomy;

use analysis::{domains_below, Precision, ScoreAggregator};
use anyhow::{Context, Result};
use assessment::{AssessmentScanner, FillPolicy, ResponseMatrix, ScanConfig};
use chrono::{Local, NaiveDate};
use cli::{Args, OutputFormat, RankLevel};
use config::{Config, ReportConfig, CONFIG_FILE_NAME};
use error::ScoringError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{Assessment, RankingLabel, Report};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use taxonomy::Taxonomy;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("PSPA v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Scoring failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .pspa.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize precision, taxonomy, and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Everything needed to score one assessment.
struct Scorer {
    taxonomy: Taxonomy,
    aggregator: ScoreAggregator,
    policy: FillPolicy,
}

impl Scorer {
    fn score(&self, assessment: &Assessment) -> Result<Report, ScoringError> {
        let matrix = ResponseMatrix::build(&self.taxonomy, assessment, self.policy)?;
        if matrix.defaulted_count() > 0 {
            warn!(
                "'{}': {} unanswered questions scored as {}",
                assessment.project_name,
                matrix.defaulted_count(),
                self.policy.default_score
            );
        }

        let summaries = self
            .aggregator
            .overall_summary(self.taxonomy.domains(), &matrix)?;

        Ok(report::build_report(
            assessment,
            &self.taxonomy,
            &matrix,
            summaries,
            self.aggregator.precision(),
        ))
    }
}

/// Run the selected command. Returns exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let taxonomy = Taxonomy::from_config(&config.taxonomy)?;
    info!(
        "Taxonomy: {} ({} domains, {} questions)",
        taxonomy.name(),
        taxonomy.domains().len(),
        taxonomy.question_count()
    );

    if args.list_domains {
        print_taxonomy(&taxonomy);
        return Ok(0);
    }

    if let Some(ref path) = args.init_assessment {
        let template = assessment::template(&taxonomy, config.scoring.default_score)?;
        assessment::save_assessment(&template, path)?;
        println!(
            "✅ Created {} with {} questions at score {}.",
            path.display(),
            template.responses.len(),
            config.scoring.default_score
        );
        return Ok(0);
    }

    let scorer = Scorer {
        taxonomy,
        aggregator: ScoreAggregator::new(Precision::from_decimals(config.scoring.decimals)?),
        policy: FillPolicy::from(&config.scoring),
    };

    if let Some(ref dir) = args.input_dir {
        return run_batch(&args, &config, &scorer, dir);
    }

    let input = args
        .input
        .as_ref()
        .context("An assessment file is required (--input)")?;
    run_single(&args, &config, &scorer, input)
}

/// Score one assessment file and write its report.
fn run_single(args: &Args, config: &Config, scorer: &Scorer, input: &Path) -> Result<i32> {
    println!("📥 Loading assessment: {}", input.display());
    let assessment = assessment::load_assessment(input)?;

    let report = match scorer.score(&assessment) {
        Ok(report) => report,
        Err(e) => {
            if e.is_structural() {
                eprintln!("   Hint: run `pspa --init-assessment <FILE>` for a complete template.");
            }
            return Err(e)
                .with_context(|| format!("Failed to score {}", input.display()));
        }
    };

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(report::default_report_filename(
            &assessment.project_name,
            Local::now().date_naive(),
            args.format.extension(),
        ))
    });

    let content = render(&report, args.format, &config.report)?;
    std::fs::write(&output, &content)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    print_summary(&report);
    println!("\n✅ Report saved to: {}", output.display());

    Ok(check_threshold(args.fail_below, &[&report]))
}

/// Score every assessment below a directory.
fn run_batch(args: &Args, config: &Config, scorer: &Scorer, dir: &Path) -> Result<i32> {
    let scan_config = ScanConfig::from(&config.scanner);
    let files = AssessmentScanner::new(dir.to_path_buf(), scan_config).scan()?;

    if files.is_empty() {
        println!("   No assessment files found in {}", dir.display());
        return Ok(0);
    }

    let output_dir = PathBuf::from(&config.general.output_dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    println!("📥 Scoring {} assessments from {}", files.len(), dir.display());

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let today = Local::now().date_naive();
    let mut used_names = HashSet::new();
    let mut reports = Vec::new();
    let mut failed = 0usize;

    for file in &files {
        progress.set_message(file.relative.clone());
        debug!("Scoring {} ({} bytes)", file.relative, file.size);

        let result = assessment::load_assessment(&file.path).and_then(|a| {
            let report = scorer.score(&a)?;
            let name = unique_report_name(&mut used_names, &a.project_name, today, args.format);
            let path = output_dir.join(&name);
            let content = render(&report, args.format, &config.report)?;
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            debug!("Wrote {}", path.display());
            Ok(report)
        });

        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!("Skipping {}: {:#}", file.relative, e);
                failed += 1;
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("done");

    println!("\n📊 Batch Summary:");
    println!("   Scored: {}", reports.len());
    if failed > 0 {
        println!("   Failed: {}", failed);
    }
    for report in &reports {
        let lowest = analysis::weakest_domains(&report.summaries, 1);
        if let Some(weakest) = lowest.first() {
            println!(
                "   - {}: weakest {} ({:.*}/10, {})",
                report.metadata.project_name,
                weakest.title,
                report.metadata.decimals,
                weakest.mean_score,
                weakest.ranking
            );
        }
    }
    println!("\n✅ Reports saved to: {}", output_dir.display());

    let refs: Vec<&Report> = reports.iter().collect();
    Ok(check_threshold(args.fail_below, &refs))
}

/// Default report file name, suffixed with a counter when already taken.
fn unique_report_name(
    used: &mut HashSet<String>,
    project_name: &str,
    date: NaiveDate,
    format: OutputFormat,
) -> String {
    let mut name = report::default_report_filename(project_name, date, format.extension());
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = report::default_report_filename(
            &format!("{} {}", project_name, n),
            date,
            format.extension(),
        );
        n += 1;
    }
    name
}

/// Render a report in the requested format.
fn render(report: &Report, format: OutputFormat, config: &ReportConfig) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(report::generate_markdown_report(report, config)),
        OutputFormat::Json => report::generate_json_report(report),
        OutputFormat::Csv => report::generate_csv_report(report),
    }
}

/// Print the per-domain summary to stdout.
fn print_summary(report: &Report) {
    let decimals = report.metadata.decimals;

    println!("\n📊 {}:", report.metadata.project_name);
    for summary in &report.summaries {
        println!(
            "   {} {:<45} {:>5.*}/10  {}",
            summary.ranking.emoji(),
            summary.title,
            decimals,
            summary.mean_score,
            summary.ranking
        );
    }
}

/// Print the domains and questions of a taxonomy.
fn print_taxonomy(taxonomy: &Taxonomy) {
    println!("📋 Taxonomy: {}\n", taxonomy.name());
    for domain in taxonomy.domains() {
        println!("{}", domain.title());
        for question in &domain.questions {
            println!("   {}", question.label());
        }
        println!();
    }
}

/// Exit code 2 when any domain is ranked below the threshold.
fn check_threshold(fail_below: Option<RankLevel>, reports: &[&Report]) -> i32 {
    let Some(level) = fail_below else {
        return 0;
    };
    let threshold = rank_level_to_label(level);

    let failing: Vec<String> = reports
        .iter()
        .flat_map(|r| {
            domains_below(&r.summaries, threshold)
                .into_iter()
                .map(move |s| format!("{}: {}", r.metadata.project_name, s.title))
        })
        .collect();

    if failing.is_empty() {
        return 0;
    }

    eprintln!(
        "\n⛔ {} domain(s) ranked below {}. Failing (exit code 2).",
        failing.len(),
        threshold
    );
    for entry in &failing {
        eprintln!("   - {}", entry);
    }
    2
}

/// Convert RankLevel to RankingLabel for comparison.
fn rank_level_to_label(level: RankLevel) -> RankingLabel {
    match level {
        RankLevel::VeryLow => RankingLabel::VeryLow,
        RankLevel::Low => RankingLabel::Low,
        RankLevel::Average => RankingLabel::Average,
        RankLevel::High => RankingLabel::High,
        RankLevel::VeryHigh => RankingLabel::VeryHigh,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseRecord;
    use crate::taxonomy::TaxonomyPreset;
    use clap::Parser;
    use tempfile::TempDir;

    fn foundation_scorer() -> Scorer {
        Scorer {
            taxonomy: Taxonomy::preset(TaxonomyPreset::Foundation),
            aggregator: ScoreAggregator::default(),
            policy: FillPolicy::default(),
        }
    }

    /// Domain 1 scores 8.0 (Very High), domain 2 scores 1.8 (Very Low).
    fn create_assessment(project_name: &str) -> Assessment {
        let scores = [(1, [10, 10, 10, 2]), (2, [1, 3, 1, 2])];
        let responses = scores
            .iter()
            .flat_map(|(domain, row)| {
                row.iter().zip(1..).map(move |(score, question)| ResponseRecord {
                    domain: *domain,
                    question,
                    score: *score,
                    note: None,
                })
            })
            .collect();

        Assessment {
            project_name: project_name.to_string(),
            responses,
            ..Default::default()
        }
    }

    fn write_assessment(dir: &Path, file: &str, project_name: &str) {
        let json = serde_json::to_string(&create_assessment(project_name)).unwrap();
        std::fs::write(dir.join(file), json).unwrap();
    }

    fn batch_args(input_dir: &Path, extra: &[&str]) -> Args {
        let mut argv = vec![
            "pspa".to_string(),
            "--input-dir".to_string(),
            input_dir.display().to_string(),
            "--quiet".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    fn batch_config(output_dir: &Path) -> Config {
        let mut config = Config::default();
        config.general.output_dir = output_dir.display().to_string();
        config
    }

    fn report_name(project_name: &str) -> String {
        report::default_report_filename(project_name, Local::now().date_naive(), "md")
    }

    #[test]
    fn test_check_threshold() {
        let scorer = foundation_scorer();
        let report = scorer.score(&create_assessment("Ward 3")).unwrap();

        assert_eq!(check_threshold(None, &[&report]), 0);
        assert_eq!(check_threshold(Some(RankLevel::VeryLow), &[&report]), 0);
        assert_eq!(check_threshold(Some(RankLevel::Low), &[&report]), 2);
        assert_eq!(check_threshold(Some(RankLevel::VeryHigh), &[&report]), 2);
        assert_eq!(check_threshold(Some(RankLevel::Average), &[]), 0);
    }

    #[test]
    fn test_rank_level_to_label() {
        assert_eq!(rank_level_to_label(RankLevel::VeryLow), RankingLabel::VeryLow);
        assert_eq!(rank_level_to_label(RankLevel::Average), RankingLabel::Average);
        assert_eq!(rank_level_to_label(RankLevel::VeryHigh), RankingLabel::VeryHigh);
    }

    #[test]
    fn test_batch_skips_failed_files() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in");
        let output = temp.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        write_assessment(&input, "a_blocked.json", "Blocked");
        write_assessment(&input, "b_good.json", "Good");
        std::fs::write(input.join("c_broken.json"), "{ \"project_name\": ").unwrap();
        write_assessment(&input, "d_nul.json", "Bad\u{0}Name");

        // A directory at the report path makes the write fail
        std::fs::create_dir(output.join(report_name("Blocked"))).unwrap();

        let args = batch_args(&input, &["--fail-below", "low"]);
        let code = run_batch(&args, &batch_config(&output), &foundation_scorer(), &input).unwrap();

        // Scoring continued past both failures and reached the threshold check
        assert_eq!(code, 2);
        assert!(output.join(report_name("Good")).is_file());
        assert!(output.join(report_name("Bad_Name")).is_file());
        assert!(output.join(report_name("Blocked")).is_dir());
    }

    #[test]
    fn test_batch_unique_report_names() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in");
        let output = temp.path().join("out");
        std::fs::create_dir_all(&input).unwrap();

        write_assessment(&input, "first.json", "Ward 3");
        write_assessment(&input, "second.json", "Ward 3");

        let args = batch_args(&input, &[]);
        let code = run_batch(&args, &batch_config(&output), &foundation_scorer(), &input).unwrap();

        assert_eq!(code, 0);
        assert!(output.join(report_name("Ward 3")).is_file());
        assert!(output.join(report_name("Ward 3 2")).is_file());
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 2);
    }

    #[test]
    fn test_batch_csv_output() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in");
        let output = temp.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        write_assessment(&input, "ward.json", "Ward 3");

        let args = batch_args(&input, &["--format", "csv"]);
        run_batch(&args, &batch_config(&output), &foundation_scorer(), &input).unwrap();

        let name =
            report::default_report_filename("Ward 3", Local::now().date_naive(), "csv");
        let content = std::fs::read_to_string(output.join(name)).unwrap();
        assert!(content.starts_with("Domain,Score,Ranking,"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_unique_report_name() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 22).unwrap();
        let mut used = HashSet::new();

        let first = unique_report_name(&mut used, "Ward 3", date, OutputFormat::Json);
        let second = unique_report_name(&mut used, "Ward 3", date, OutputFormat::Json);
        let third = unique_report_name(&mut used, "Ward 3", date, OutputFormat::Json);

        assert_eq!(first, "2025-07-22_Ward_3_PSPA_Report.json");
        assert_eq!(second, "2025-07-22_Ward_3_2_PSPA_Report.json");
        assert_eq!(third, "2025-07-22_Ward_3_3_PSPA_Report.json");
    }
}
