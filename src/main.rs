use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tabled::{settings::Style, Table, Tabled};

use fitbridge::config::AppConfig;
use fitbridge::error::FitBridgeError;
use fitbridge::export::{ExportFormat, ExportManager};
use fitbridge::import::{DataCategory, ImportManager, ImportReport, ParallelConfig};
use fitbridge::logging::{init_logging, DiagnosticReport, LogLevel};
use fitbridge::models::{HeartRateZone, UserData, UserProfile};
use fitbridge::zones::{MaxHrFormula, ProfileEstimator, ZoneReconciler, ZoneSystem};

/// FitBridge - Fitbit Takeout to Garmin converter
///
/// Reads a Google Takeout export of Fitbit data, recalculates heart rate
/// zones into the 5-zone scheme and writes CSV and TCX files.
#[derive(Parser)]
#[command(name = "fitbridge")]
#[command(version)]
#[command(about = "Convert Fitbit Takeout data for Garmin Connect", long_about = None)]
struct Cli {
    /// Config file (default: ~/.fitbridge/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Values that override both the config file and the estimated profile
#[derive(Args, Debug, Default)]
struct ZoneArgs {
    /// Maximum heart rate in bpm
    #[arg(long)]
    max_hr: Option<u16>,

    /// Resting heart rate in bpm
    #[arg(long)]
    resting_hr: Option<u16>,

    /// Age in years, used to estimate max heart rate
    #[arg(long)]
    age: Option<u16>,

    /// Max heart rate formula (tanaka, fox, gellish, nes)
    #[arg(long)]
    formula: Option<MaxHrFormula>,

    /// Zone naming (five_zone, garmin_standard)
    #[arg(long)]
    system: Option<ZoneSystem>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Takeout export to CSV and TCX files
    Convert {
        /// Extracted Google Takeout folder
        takeout: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output formats (csv, tcx, all); repeatable
        #[arg(short = 'f', long = "format")]
        formats: Vec<String>,

        /// Save a JSON diagnostic report next to the output
        #[arg(long)]
        diagnostics: bool,

        #[command(flatten)]
        zone_args: ZoneArgs,
    },

    /// Estimate the profile and zones without writing files
    Analyze {
        /// Extracted Google Takeout folder
        takeout: PathBuf,

        #[command(flatten)]
        zone_args: ZoneArgs,
    },

    /// Show heart rate zones for the given parameters
    Zones {
        #[command(flatten)]
        zone_args: ZoneArgs,
    },

    /// List supported data types and formats
    Info,
}

#[derive(Tabled)]
struct ZoneTableRow {
    #[tabled(rename = "Zone")]
    index: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Garmin")]
    garmin: String,
    #[tabled(rename = "Low")]
    low: u16,
    #[tabled(rename = "High")]
    high: u16,
    #[tabled(rename = "Minutes")]
    minutes: u32,
}

impl ZoneTableRow {
    fn from_zone(position: usize, zone: &HeartRateZone) -> Self {
        Self {
            index: zone
                .zone_index
                .map(usize::from)
                .unwrap_or(position + 1)
                .to_string(),
            name: zone.name.clone(),
            garmin: zone.display_name().to_string(),
            low: zone.min_bpm,
            high: zone.max_bpm,
            minutes: zone.minutes,
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<FitBridgeError>() {
            Some(err) => err.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_or_default(cli.config.as_deref())
        .map_err(|e| FitBridgeError::Configuration(format!("{:#}", e)))?;

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Convert {
            takeout,
            output,
            formats,
            diagnostics,
            zone_args,
        } => convert(&config, &takeout, output, &formats, diagnostics, &zone_args),
        Commands::Analyze { takeout, zone_args } => analyze(&config, &takeout, &zone_args),
        Commands::Zones { zone_args } => show_zones(&config, &zone_args),
        Commands::Info => {
            show_info();
            Ok(())
        }
    }
}

fn import_manager(config: &AppConfig) -> ImportManager {
    ImportManager::new(ParallelConfig {
        num_threads: config.import.num_threads,
        show_progress: config.import.show_progress,
        slow_file_limit: Duration::from_secs(config.import.slow_file_secs),
    })
}

/// Config overrides first, then command-line flags
fn resolve_profile(config: &AppConfig, estimated: UserProfile, args: &ZoneArgs) -> UserProfile {
    config
        .profile
        .apply(estimated)
        .with_overrides(args.age, args.max_hr, args.resting_hr)
}

fn build_reconciler(config: &AppConfig, profile: UserProfile, args: &ZoneArgs) -> ZoneReconciler {
    ZoneReconciler::new(profile)
        .with_formula(args.formula.unwrap_or(config.zones.max_hr_formula))
        .with_zone_system(args.system.unwrap_or(config.zones.zone_system))
}

fn import(config: &AppConfig, takeout: &Path) -> Result<(UserData, ImportReport)> {
    println!("{}", "Reading Takeout export...".cyan().bold());
    let (data, report) = import_manager(config)
        .import_takeout(takeout)
        .map_err(FitBridgeError::from)?;

    println!("  Data root: {}", report.data_root.display());
    println!(
        "  Activities: {}  Daily records: {}",
        data.total_activities(),
        data.total_daily_records()
    );
    if report.failed_files() > 0 {
        println!(
            "  {}",
            format!("{} files could not be read", report.failed_files()).yellow()
        );
    }

    Ok((data, report))
}

fn convert(
    config: &AppConfig,
    takeout: &Path,
    output: Option<PathBuf>,
    formats: &[String],
    diagnostics: bool,
    zone_args: &ZoneArgs,
) -> Result<()> {
    let started = Instant::now();
    let mut report = DiagnosticReport::new("convert");

    let formats = if formats.is_empty() {
        config.export.formats.clone()
    } else {
        ExportFormat::parse_selections(formats).map_err(FitBridgeError::from)?
    };
    let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());

    let (mut data, import_report) = import(config, takeout)?;
    import_report.add_to_diagnostics(&mut report);

    let estimated = ProfileEstimator::estimate(&data.activities, &data.daily_metrics);
    let profile = resolve_profile(config, estimated, zone_args);
    let reconciler = build_reconciler(config, profile, zone_args);
    print_profile(&reconciler);

    println!("{}", "Recalculating heart rate zones...".cyan().bold());
    let reconciliation = reconciler.recalculate_all(&mut data.activities);
    reconciliation.add_to_diagnostics(&mut report);
    println!(
        "  Recalculated: {}  No zones: {}  Failed: {}  Validation issues: {}",
        reconciliation.recalculated(),
        reconciliation.skipped,
        reconciliation.failed.len(),
        reconciliation.issue_count()
    );

    println!("{}", "Writing output...".cyan().bold());
    let summary = ExportManager::new(&output_dir, formats)
        .export_all(&data)
        .map_err(FitBridgeError::from)?;
    summary.add_to_diagnostics(&mut report);

    println!("  Output: {}", output_dir.display());
    println!(
        "  Files: {}  Zone rows: {}  TCX files: {}",
        summary.files.len(),
        summary.zone_rows,
        summary.tcx_files
    );
    if !summary.failed_activities.is_empty() {
        println!(
            "  {} {} TCX file(s) could not be written",
            "Warning:".yellow(),
            summary.failed_activities.len()
        );
    }

    report.set_success(true);
    report.set_duration(started.elapsed());
    if diagnostics {
        let path = report
            .save_in(&output_dir)
            .context("Failed to save diagnostic report")?;
        println!("  Diagnostics: {}", path.display());
    }

    println!("{}", "✓ Conversion completed".green().bold());
    Ok(())
}

fn analyze(config: &AppConfig, takeout: &Path, zone_args: &ZoneArgs) -> Result<()> {
    let (mut data, _) = import(config, takeout)?;

    if let Some((first, last)) = data.date_range() {
        println!("  Date range: {} to {}", first, last);
    }

    let estimated = ProfileEstimator::estimate(&data.activities, &data.daily_metrics);
    let profile = resolve_profile(config, estimated, zone_args);
    let reconciler = build_reconciler(config, profile, zone_args);
    print_profile(&reconciler);
    print_zone_table(&reconciler)?;

    let reconciliation = reconciler.recalculate_all(&mut data.activities);
    println!("{}", reconciliation.to_string_pretty());

    Ok(())
}

fn show_zones(config: &AppConfig, zone_args: &ZoneArgs) -> Result<()> {
    let profile = resolve_profile(config, UserProfile::default(), zone_args);
    let reconciler = build_reconciler(config, profile, zone_args);
    print_profile(&reconciler);
    print_zone_table(&reconciler)
}

fn print_profile(reconciler: &ZoneReconciler) {
    let calculator = reconciler.calculator();
    let profile = reconciler.profile();
    let or_unknown = |value: Option<u16>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    let rows = vec![
        FieldRow {
            field: "Age",
            value: or_unknown(profile.age),
        },
        FieldRow {
            field: "Max HR",
            value: or_unknown(calculator.effective_max_heart_rate()),
        },
        FieldRow {
            field: "Resting HR",
            value: or_unknown(calculator.effective_resting_heart_rate()),
        },
        FieldRow {
            field: "Fitness level",
            value: profile
                .fitness_level
                .map_or_else(|| "-".to_string(), |level| level.to_string()),
        },
        FieldRow {
            field: "Method",
            value: calculator
                .method()
                .map_or_else(|| "legacy mapping".to_string(), |m| m.to_string()),
        },
        FieldRow {
            field: "Zone system",
            value: calculator.zone_system().to_string(),
        },
    ];

    println!("{}", "Profile".bold());
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_zone_table(reconciler: &ZoneReconciler) -> Result<()> {
    let zones = reconciler.preview_zones().map_err(FitBridgeError::from)?;
    if zones.is_empty() {
        println!(
            "{}",
            "No max heart rate available; provide --max-hr or --age to calculate zones".yellow()
        );
        return Ok(());
    }

    let rows: Vec<ZoneTableRow> = zones
        .iter()
        .enumerate()
        .map(|(i, zone)| ZoneTableRow::from_zone(i, zone))
        .collect();

    println!("{}", "Heart rate zones".bold());
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}

fn show_info() {
    println!("{}", "FitBridge".green().bold());
    println!("\n{}", "Data root lookup (first match wins):".bold());
    for candidate in [
        "<TAKEOUT>/Takeout/Fitbit",
        "<TAKEOUT>/Takeout 2/Fitbit",
        "<TAKEOUT>/Fitbit",
        "<TAKEOUT>",
    ] {
        println!("  {}", candidate);
    }

    println!("\n{}", "Recognised data folders:".bold());
    for category in DataCategory::ALL {
        println!("  {}", category);
    }

    println!("\n{}", "Output formats:".bold());
    println!("  csv  heart_rate_zones.csv, activities_summary.csv, daily_metrics.csv");
    println!("  tcx  one file per activity with heart rate zones");

    println!("\n{}", "Max HR formulas:".bold());
    for formula in [
        MaxHrFormula::Tanaka,
        MaxHrFormula::Fox,
        MaxHrFormula::Gellish,
        MaxHrFormula::Nes,
    ] {
        println!("  {}", formula);
    }

    println!("\n{}", "Zone systems:".bold());
    for system in [ZoneSystem::GarminStandard, ZoneSystem::FiveZone] {
        let names: Vec<&str> = system.definitions().iter().map(|d| d.name).collect();
        println!("  {:<16} {}", system.to_string(), names.join(", "));
    }
}
