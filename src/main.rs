mod logging;

use analytics::{
    export, latest_market_share, latest_qoq_by_category, latest_yoy_by_category, LatestGrowth,
    MetricsDeriver,
};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{Config, LogLevel};
use core_types::{FilterSpec, RegistrationRecord};
use database::DbRepository;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Rows written between progress updates during an import.
const IMPORT_BATCH_SIZE: usize = 500;

/// The main entry point for the registration dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; DATABASE_URL may also come from the real environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    let _guard = logging::init_tracing(&config.logging, cli.log_level)?;
    // Config is read before the subscriber exists, so report its sources here.
    tracing::debug!(
        file = ?cli.config,
        database_url_from_env = std::env::var("DATABASE_URL").is_ok_and(|v| !v.trim().is_empty()),
        database = %config.database.url,
        "Configuration loaded."
    );

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Import(args) => handle_import(args, &config).await,
        Commands::Report(args) => handle_report(args, &config).await,
        Commands::Export(args) => handle_export(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Vehicle registration analytics: growth rates and manufacturer market share.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log level.
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Validate a CSV file and load its rows into the database.
    Import(ImportArgs),
    /// Print key metrics, latest growth and latest market share.
    Report(ReportArgs),
    /// Write the filtered detail table to a CSV file.
    Export(ExportArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args)]
struct ImportArgs {
    /// CSV file in the export format.
    #[arg(long)]
    file: PathBuf,
    /// Delete all existing rows before importing, in the same transaction.
    #[arg(long)]
    replace: bool,
}

/// Filter selections shared by `report` and `export`.
#[derive(Args, Debug)]
struct FilterArgs {
    /// First day of the range (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day of the range (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Vehicle categories, comma-separated.
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
    /// Manufacturers, comma-separated.
    #[arg(long, value_delimiter = ',')]
    manufacturers: Vec<String>,
    /// State names, comma-separated.
    #[arg(long, value_delimiter = ',')]
    states: Vec<String>,
}

#[derive(Args)]
struct ReportArgs {
    #[command(flatten)]
    filters: FilterArgs,
    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Destination file. Defaults to vehicle_registrations_YYYYMMDD.csv.
    #[arg(long)]
    out: Option<PathBuf>,
    #[command(flatten)]
    filters: FilterArgs,
    /// Case-insensitive search over manufacturer, state and category.
    #[arg(long)]
    search: Option<String>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_repository(config: &Config) -> anyhow::Result<DbRepository> {
    let pool = database::connect(&config.database.url, config.database.max_connections).await?;
    database::run_migrations(&pool).await?;
    Ok(DbRepository::new(pool))
}

/// Loads the records selected by the filter flags. Unknown state names match nothing.
async fn load_filtered(repo: &DbRepository, args: &FilterArgs) -> anyhow::Result<Vec<RegistrationRecord>> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        anyhow::ensure!(from <= to, "--from {} is after --to {}", from, to);
    }

    let mut filter = FilterSpec::all()
        .with_date_range(args.from, args.to)
        .with_categories(args.categories.iter().cloned())
        .with_manufacturers(args.manufacturers.iter().cloned());

    if !args.states.is_empty() {
        let codes = repo.resolve_state_codes(&args.states).await?;
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        filter = filter.with_states(codes);
    }

    Ok(repo.get_filtered_records(&filter).await?)
}

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    web_server::run_server(&config).await
}

async fn handle_import(args: ImportArgs, config: &Config) -> anyhow::Result<()> {
    let file = File::open(&args.file)?;
    let records = export::read_csv(BufReader::new(file))?;
    tracing::info!(rows = records.len(), file = %args.file.display(), "Validated import file.");

    let repo = open_repository(config).await?;
    let progress_bar = ProgressBar::new(records.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    // One transaction: a failed import changes nothing and can simply be re-run.
    let summary = match repo
        .import_records(&records, args.replace, IMPORT_BATCH_SIZE, |n| progress_bar.inc(n as u64))
        .await
    {
        Ok(summary) => summary,
        Err(e) => {
            progress_bar.abandon_with_message("Import rolled back.");
            return Err(e.into());
        }
    };
    progress_bar.finish_with_message("Import complete!");

    if args.replace {
        println!("Removed {} existing rows", summary.removed);
    }
    println!("Imported {} registration rows from {}", summary.inserted, args.file.display());
    Ok(())
}

async fn handle_report(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    if repo.get_summary_stats().await?.total_records == 0 {
        println!("No data found in the database. Load records first with `regdash import --file <csv>`.");
        return Ok(());
    }

    let records = load_filtered(&repo, &args.filters).await?;
    let deriver = MetricsDeriver::new();
    let metrics = deriver.key_metrics(&records)?;
    let yoy = latest_yoy_by_category(&deriver.calculate_yoy_growth(&records)?);
    let qoq = latest_qoq_by_category(&deriver.calculate_qoq_growth(&records)?);
    let shares = latest_market_share(
        &deriver.calculate_market_share(&records)?,
        config.dashboard.market_share_top_n,
    );

    if args.json {
        let report = serde_json::json!({
            "key_metrics": metrics,
            "latest_yoy": yoy,
            "latest_qoq": qoq,
            "latest_market_share": shares,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut table = new_table(&["Metric", "Value"]);
    table.add_row(vec!["Total registrations".to_string(), metrics.total_registrations.to_string()]);
    table.add_row(vec!["Active manufacturers".to_string(), metrics.active_manufacturers.to_string()]);
    table.add_row(vec![
        "Average monthly registrations".to_string(),
        metrics
            .average_monthly_registrations
            .map(|d| d.round_dp(0).to_string())
            .unwrap_or_else(|| "n/a".to_string()),
    ]);
    table.add_row(vec![
        "Latest period".to_string(),
        match (metrics.latest_period, metrics.latest_period_registrations) {
            (Some(period), Some(total)) => format!("{} ({} registrations)", period, total),
            _ => "n/a".to_string(),
        },
    ]);
    println!("{table}");

    println!("\nLatest year-over-year growth");
    println!("{}", growth_table(&yoy));
    println!("\nLatest quarter-over-quarter growth");
    println!("{}", growth_table(&qoq));

    println!("\nLatest market share");
    let mut table = new_table(&["Period", "Category", "Manufacturer", "Registrations", "Share"]);
    for row in &shares {
        table.add_row(vec![
            row.period.to_string(),
            row.vehicle_category.clone(),
            row.manufacturer.clone(),
            row.registrations.to_string(),
            format_percent(row.market_share_percent),
        ]);
    }
    println!("{table}");

    Ok(())
}

async fn handle_export(args: ExportArgs, config: &Config) -> anyhow::Result<()> {
    let repo = open_repository(config).await?;
    let records = load_filtered(&repo, &args.filters).await?;
    let rows = analytics::detail_table(&records, args.search.as_deref());

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(export::export_file_name(Utc::now().date_naive())));
    export::write_csv(File::create(&out)?, &rows)?;

    tracing::info!(rows = rows.len(), file = %out.display(), "Exported registrations.");
    println!("Wrote {} rows to {}", rows.len(), out.display());
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header.to_vec());
    table
}

fn growth_table(rows: &[LatestGrowth]) -> Table {
    let mut table = new_table(&["Category", "As of", "Growth"]);
    for row in rows {
        table.add_row(vec![
            row.vehicle_category.clone(),
            row.as_of.clone(),
            format_percent(Some(row.growth_percent)),
        ]);
    }
    table
}

fn format_percent(value: Option<Decimal>) -> String {
    match value {
        // Decimal's `{:.2}` truncates, so round explicitly first.
        Some(v) => format!("{:.2}%", v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        None => "n/a".to_string(),
    }
}
