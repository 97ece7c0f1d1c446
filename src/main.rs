use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use fitdash::buckets::AssignmentMode;
use fitdash::config::AppConfig;
use fitdash::correlate::{self, CorrelationEngine, CorrelationMatrix};
use fitdash::daily::{DayAggregate, DayAggregator};
use fitdash::export::{self, csv, json, series, DateRange, ExportFormat, ReportBuilder};
use fitdash::histogram::{HistogramBinner, HistogramSample};
use fitdash::import::ImportManager;
use fitdash::load::{RiskZone, TrainingLoadCalculator};
use fitdash::logging::{init_logging, LogLevel};
use fitdash::models::{Activity, SportFilter};
use fitdash::rolling::RollingStatsEngine;

/// fitdash - Fitness Dashboard Analysis CLI
///
/// A Rust-based tool for turning raw activity exports into the numeric
/// series behind a personal training dashboard: daily totals, distance
/// histograms, rolling trends, training load and distance-bucket pace
/// statistics.
#[derive(Parser)]
#[command(name = "fitdash")]
#[command(version = "0.1.0")]
#[command(about = "Fitness Dashboard Analysis CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input file or directory of activity exports (JSON, CSV)
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Only analyze activities of this sport
    #[arg(short, long)]
    sport: Option<String>,

    /// Date range start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Date range end (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show per-day distance, pace and activity totals
    Daily {
        /// Only show the most recent N days
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write the series to a file instead (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bin daily distances into a histogram
    Histogram {
        /// Bin width in kilometers (overrides config)
        #[arg(short, long)]
        bin_width: Option<Decimal>,

        /// Maximum number of uniform bins (overrides config)
        #[arg(short, long)]
        max_bins: Option<usize>,

        /// Write the bins to a file instead (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rolling distance average and linear trends
    Trend {
        /// Trailing window length in days (overrides config)
        #[arg(short, long)]
        window: Option<usize>,

        /// Write the overlay series to a file instead (.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Acute/chronic training load, monotony and strain
    Load {
        /// Acute window in days (overrides config)
        #[arg(long)]
        acute: Option<u16>,

        /// Chronic window in days (overrides config)
        #[arg(long)]
        chronic: Option<u16>,

        /// Write the series to a file instead (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group activities into standard distance buckets
    Buckets {
        /// Assignment mode: nearest or all
        #[arg(short, long)]
        mode: Option<String>,

        /// Write the statistics to a file instead (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Correlate weekday training metrics
    Correlate {
        /// Write the matrix to a file instead (.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bundle every analysis into one dashboard report
    Report {
        /// Write the report to a file instead (.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or initialize the configuration
    Config {
        /// Print the resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to the home directory
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };
    if let Some(sport) = &cli.sport {
        config.settings.sport_filter = Some(sport.clone());
    }
    config.validate()?;

    let mut log_config = config.logging.clone();
    log_config.level = match cli.verbose {
        0 => log_config.level,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    init_logging(&log_config)?;

    let range = DateRange::new(
        cli.from.as_deref().map(parse_date).transpose()?,
        cli.to.as_deref().map(parse_date).transpose()?,
    );
    let filter = SportFilter::from_arg(config.settings.sport_filter.as_deref());

    match &cli.command {
        Commands::Daily { limit, output } => {
            let days = load_days(&cli, &range, &filter)?;
            run_daily(&days, *limit, output.as_deref())
        }

        Commands::Histogram {
            bin_width,
            max_bins,
            output,
        } => {
            let days = load_days(&cli, &range, &filter)?;
            run_histogram(&days, &config, *bin_width, *max_bins, output.as_deref())
        }

        Commands::Trend { window, output } => {
            let days = load_days(&cli, &range, &filter)?;
            let window = window.unwrap_or(config.rolling.window);
            run_trend(&days, window, output.as_deref())
        }

        Commands::Load {
            acute,
            chronic,
            output,
        } => {
            let days = load_days(&cli, &range, &filter)?;
            run_load(&days, &config, *acute, *chronic, output.as_deref())
        }

        Commands::Buckets { mode, output } => {
            let activities = load_activities(&cli, &range)?;
            run_buckets(&activities, &config, &filter, mode.as_deref(), output.as_deref())
        }

        Commands::Correlate { output } => {
            let days = load_days(&cli, &range, &filter)?;
            run_correlate(&days, output.as_deref())
        }

        Commands::Report { output } => {
            let activities = load_activities(&cli, &range)?;
            run_report(&activities, &config, &range, output.as_deref())
        }

        Commands::Config { show, init } => run_config(&mut config, *show, *init),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", s))
}

fn load_activities(cli: &Cli, range: &DateRange) -> Result<Vec<Activity>> {
    let input = cli
        .input
        .as_ref()
        .context("--input <PATH> is required for this command")?;

    let manager = ImportManager::new();
    let activities = manager.import_path(input)?;
    Ok(range
        .filter_activities(&activities)
        .into_iter()
        .cloned()
        .collect())
}

fn load_days(cli: &Cli, range: &DateRange, filter: &SportFilter) -> Result<Vec<DayAggregate>> {
    let activities = load_activities(cli, range)?;
    Ok(DayAggregator::aggregate(&activities, filter))
}

fn run_daily(days: &[DayAggregate], limit: Option<usize>, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Csv => csv::export_day_series(days, path)?,
            ExportFormat::Json => {
                let panels = vec![series::day_distance(days), series::day_pace(days)];
                json::export_json(&panels, path)?;
            }
        }
        println!("{}", format!("✓ Exported {} days to {}", days.len(), path.display()).green());
        return Ok(());
    }

    println!("{}", "Daily totals".green().bold());
    if days.is_empty() {
        println!("{}", "No activities matched the current filters".yellow());
        return Ok(());
    }

    let shown = match limit {
        Some(n) if n < days.len() => &days[days.len() - n..],
        _ => days,
    };

    let rows: Vec<DayRow> = shown.iter().map(DayRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    println!("{} active days", days.len());
    Ok(())
}

fn run_histogram(
    days: &[DayAggregate],
    config: &AppConfig,
    bin_width: Option<Decimal>,
    max_bins: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let mut hist_config = config.histogram.clone();
    if let Some(width) = bin_width {
        hist_config.bin_width = width;
    }
    if let Some(max) = max_bins {
        hist_config.max_bins = max;
    }

    let samples: Vec<HistogramSample> = days.iter().map(HistogramSample::from).collect();
    let bins = HistogramBinner::new(hist_config)?.bin(&samples);

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Json => json::export_json(&series::histogram_counts(&bins), path)?,
            ExportFormat::Csv => {
                return Err(export::ExportError::UnsupportedFormat(
                    "CSV histogram export not supported, use .json".to_string(),
                )
                .into())
            }
        }
        println!("{}", format!("✓ Exported {} bins to {}", bins.len(), path.display()).green());
        return Ok(());
    }

    println!("{}", "Distance histogram".green().bold());
    if bins.is_empty() {
        println!("{}", "No activities matched the current filters".yellow());
        return Ok(());
    }

    let rows: Vec<HistogramRow> = bins.iter().map(HistogramRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

fn run_trend(days: &[DayAggregate], window: usize, output: Option<&Path>) -> Result<()> {
    let distances: Vec<Option<Decimal>> = days.iter().map(|d| Some(d.distance_km)).collect();
    let paces: Vec<Option<Decimal>> = days.iter().map(|d| d.avg_pace).collect();
    let rolling = RollingStatsEngine::rolling_average(&distances, window)?;

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Json => {
                json::export_json(&series::rolling_overlay(days, &rolling, window), path)?
            }
            ExportFormat::Csv => {
                return Err(export::ExportError::UnsupportedFormat(
                    "CSV trend export not supported, use .json".to_string(),
                )
                .into())
            }
        }
        println!("{}", format!("✓ Exported trend overlay to {}", path.display()).green());
        return Ok(());
    }

    println!("{}", format!("Rolling {}-day distance", window).green().bold());
    if days.is_empty() {
        println!("{}", "No activities matched the current filters".yellow());
        return Ok(());
    }

    let rows: Vec<TrendRow> = days
        .iter()
        .zip(rolling.iter())
        .map(|(day, avg)| TrendRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            distance: day.distance_km.round_dp(2).to_string(),
            rolling: avg.round_dp(2).to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");

    print_trend_line("Distance trend", RollingStatsEngine::linear_trend(&distances));
    print_trend_line("Pace trend", RollingStatsEngine::linear_trend(&paces));
    Ok(())
}

fn print_trend_line(name: &str, trend: Option<fitdash::rolling::TrendLine>) {
    match trend {
        Some(t) => {
            let direction = if t.slope > Decimal::ZERO {
                "increasing".red()
            } else if t.slope < Decimal::ZERO {
                "decreasing".blue()
            } else {
                "flat".normal()
            };
            let reliability = if t.reliable { "" } else { " (too few points)" };
            println!(
                "{}: {} per day, {}{}",
                name.bold(),
                t.slope.round_dp(4),
                direction,
                reliability.dimmed()
            );
        }
        None => println!("{}: {}", name.bold(), "not enough data".yellow()),
    }
}

fn run_load(
    days: &[DayAggregate],
    config: &AppConfig,
    acute: Option<u16>,
    chronic: Option<u16>,
    output: Option<&Path>,
) -> Result<()> {
    let mut load_config = config.load.clone();
    if let Some(window) = acute {
        load_config.acute_window = window;
    }
    if let Some(window) = chronic {
        load_config.chronic_window = window;
    }

    let points = TrainingLoadCalculator::with_config(load_config).calculate_series(days)?;

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Csv => csv::export_load_series(&points, path)?,
            ExportFormat::Json => json::export_json(&series::load_series(&points), path)?,
        }
        println!("{}", format!("✓ Exported {} load points to {}", points.len(), path.display()).green());
        return Ok(());
    }

    println!("{}", "Training load".green().bold());
    if points.is_empty() {
        println!("{}", "No activities matched the current filters".yellow());
        return Ok(());
    }

    let rows: Vec<LoadRow> = points.iter().map(LoadRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");

    if let Some(latest) = points.last() {
        if let Some(ratio) = latest.ratio {
            let zone = RiskZone::from_ratio(ratio);
            println!("{} {}", "Current zone:".bold(), paint_zone(&zone));
            println!("{}", zone.recommendation().dimmed());
        }
    }
    Ok(())
}

fn run_buckets(
    activities: &[Activity],
    config: &AppConfig,
    filter: &SportFilter,
    mode: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let mode = match mode {
        Some(arg) => AssignmentMode::from_arg(arg)
            .with_context(|| format!("Invalid mode '{}' (expected 'nearest' or 'all')", arg))?,
        None => config.settings.assignment_mode,
    };

    let set = config.bucket_set()?;
    let stats = fitdash::buckets::DistanceBucketMatcher::new(set, mode)
        .match_activities(activities, filter);

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Csv => csv::export_bucket_stats(&stats, path)?,
            ExportFormat::Json => json::export_json(&stats, path)?,
        }
        println!("{}", format!("✓ Exported {} buckets to {}", stats.len(), path.display()).green());
        return Ok(());
    }

    println!("{}", "Distance buckets".green().bold());
    if stats.iter().all(|s| s.count == 0) {
        println!("{}", "No activities matched any configured bucket".yellow());
        return Ok(());
    }

    let rows: Vec<BucketRow> = stats.iter().map(BucketRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
    Ok(())
}

fn run_correlate(days: &[DayAggregate], output: Option<&Path>) -> Result<()> {
    let table = correlate::weekday_profile(days);
    let matrix = CorrelationEngine::matrix(&table);

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Json => json::export_json(&matrix, path)?,
            ExportFormat::Csv => {
                return Err(export::ExportError::UnsupportedFormat(
                    "CSV correlation export not supported, use .json".to_string(),
                )
                .into())
            }
        }
        println!("{}", format!("✓ Exported correlation matrix to {}", path.display()).green());
        return Ok(());
    }

    println!("{}", "Weekday metric correlations".green().bold());
    match matrix {
        Some(matrix) => print_matrix(&matrix),
        None => println!(
            "{}",
            "Need at least two complete weekday metrics for a matrix".yellow()
        ),
    }
    Ok(())
}

fn print_matrix(matrix: &CorrelationMatrix) {
    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(matrix.metrics.iter().cloned());
    builder.push_record(header);

    for (i, name) in matrix.metrics.iter().enumerate() {
        let mut row = vec![name.clone()];
        for value in &matrix.values[i] {
            row.push(value.round_dp(3).to_string());
        }
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::sharp());
    println!("{table}");
}

fn run_report(
    activities: &[Activity],
    config: &AppConfig,
    range: &DateRange,
    output: Option<&Path>,
) -> Result<()> {
    let report = ReportBuilder::new(config.clone()).build(activities, range)?;

    if let Some(path) = output {
        match ExportFormat::from_path(path)? {
            ExportFormat::Json => json::export_dashboard_report(&report, path)?,
            ExportFormat::Csv => {
                return Err(export::ExportError::UnsupportedFormat(
                    "CSV report export not supported, use .json".to_string(),
                )
                .into())
            }
        }
        println!("{}", format!("✓ Exported dashboard report to {}", path.display()).green());
        return Ok(());
    }

    println!("{}", "Dashboard report".green().bold());
    if report.days.is_empty() {
        println!("{}", "No activities matched the current filters".yellow());
        return Ok(());
    }

    let first = report.days.first().map(|d| d.date);
    let last = report.days.last().map(|d| d.date);
    if let (Some(first), Some(last)) = (first, last) {
        println!("  Span: {} to {} ({} active days)", first, last, report.days.len());
    }

    let total: Decimal = report.days.iter().map(|d| d.distance_km).sum();
    println!("  Total distance: {} km", total.round_dp(1));

    let matched: Vec<String> = report
        .buckets
        .iter()
        .filter(|b| b.count > 0)
        .map(|b| format!("{} x{}", b.label, b.count))
        .collect();
    if !matched.is_empty() {
        println!("  Buckets: {}", matched.join(", "));
    }

    if let Some(latest) = report.load.last() {
        if let Some(ratio) = latest.ratio {
            let zone = RiskZone::from_ratio(ratio);
            println!("  Load ratio: {} ({})", ratio.round_dp(2), paint_zone(&zone));
        }
    }

    match &report.correlation {
        Some(matrix) => println!("  Correlated metrics: {}", matrix.metrics.join(", ")),
        None => println!("  Correlated metrics: {}", "insufficient data".yellow()),
    }
    Ok(())
}

fn run_config(config: &mut AppConfig, show: bool, init: bool) -> Result<()> {
    println!("{}", "Configuration".green().bold());

    if init {
        config.save_default()?;
        println!(
            "{}",
            format!("✓ Wrote defaults to {}", AppConfig::default_config_path().display()).green()
        );
    }

    if show || !init {
        let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("{rendered}");
    }
    Ok(())
}

fn paint_zone(zone: &RiskZone) -> ColoredString {
    match zone {
        RiskZone::UnderTraining => zone.description().blue(),
        RiskZone::Optimal => zone.description().green(),
        RiskZone::Elevated => zone.description().yellow(),
        RiskZone::High => zone.description().red(),
        RiskZone::VeryHigh => zone.description().red().bold(),
    }
}

fn zone_name(zone: &RiskZone) -> &'static str {
    match zone {
        RiskZone::UnderTraining => "Under",
        RiskZone::Optimal => "Optimal",
        RiskZone::Elevated => "Elevated",
        RiskZone::High => "High",
        RiskZone::VeryHigh => "Very high",
    }
}

fn fmt_opt(value: Option<Decimal>, dp: u32) -> String {
    value.map_or("-".to_string(), |v| v.round_dp(dp).to_string())
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Avg pace")]
    pace: String,
    #[tabled(rename = "Avg speed")]
    speed: String,
    #[tabled(rename = "Activities")]
    activities: u16,
}

impl From<&DayAggregate> for DayRow {
    fn from(day: &DayAggregate) -> Self {
        DayRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            distance: day.distance_km.round_dp(2).to_string(),
            pace: fmt_opt(day.avg_pace, 2),
            speed: fmt_opt(day.avg_speed, 2),
            activities: day.activity_count,
        }
    }
}

#[derive(Tabled)]
struct HistogramRow {
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Days")]
    count: usize,
    #[tabled(rename = "Total (km)")]
    total: String,
    #[tabled(rename = "Avg pace")]
    pace: String,
    #[tabled(rename = "Avg speed")]
    speed: String,
}

impl From<&fitdash::histogram::HistogramBin> for HistogramRow {
    fn from(bin: &fitdash::histogram::HistogramBin) -> Self {
        HistogramRow {
            range: bin.label.clone(),
            count: bin.count,
            total: bin.total_value.round_dp(1).to_string(),
            pace: fmt_opt(bin.avg_pace, 2),
            speed: fmt_opt(bin.avg_speed, 2),
        }
    }
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Distance (km)")]
    distance: String,
    #[tabled(rename = "Rolling avg")]
    rolling: String,
}

#[derive(Tabled)]
struct LoadRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Acute")]
    acute: String,
    #[tabled(rename = "Chronic (weekly)")]
    chronic_weekly: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Zone")]
    zone: String,
}

impl From<&fitdash::load::TrainingLoadPoint> for LoadRow {
    fn from(point: &fitdash::load::TrainingLoadPoint) -> Self {
        LoadRow {
            date: point.date.format("%Y-%m-%d").to_string(),
            acute: point.acute.round_dp(1).to_string(),
            chronic_weekly: point.chronic_weekly.round_dp(1).to_string(),
            ratio: fmt_opt(point.ratio, 2),
            zone: point
                .ratio
                .map_or("-".to_string(), |r| {
                    zone_name(&RiskZone::from_ratio(r)).to_string()
                }),
        }
    }
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Mean pace")]
    mean_pace: String,
    #[tabled(rename = "Median pace")]
    median_pace: String,
    #[tabled(rename = "Mean distance")]
    mean_distance: String,
}

impl From<&fitdash::buckets::BucketStats> for BucketRow {
    fn from(stats: &fitdash::buckets::BucketStats) -> Self {
        BucketRow {
            bucket: stats.label.clone(),
            count: stats.count,
            mean_pace: fmt_opt(stats.mean_pace, 2),
            median_pace: fmt_opt(stats.median_pace, 2),
            mean_distance: fmt_opt(stats.mean_distance, 2),
        }
    }
}
