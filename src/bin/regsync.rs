use std::io::{BufRead, Read};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use regsync::app::App;
use regsync::config::ConfigLoader;
use regsync::domain::RecordType;
use regsync::error::RegError;
use regsync::review::ReviewFilter;
use regsync::sync::{ProgressSink, ProgressSnapshot, SyncPhase};
use regsync::table::TableHttpClient;

#[derive(Parser)]
#[command(name = "regsync")]
#[command(about = "Data-entry and reconciliation console for import regulatory records")]
#[command(version, author)]
struct Cli {
    /// Path to the config file (default: ./regsync.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Parse tabular text and upload new records")]
    Import(ImportArgs),
    #[command(about = "Delete duplicate records, keeping the oldest of each group")]
    Dedup(DedupArgs),
    #[command(about = "Download a table as CSV")]
    Export(ExportArgs),
    #[command(about = "Print a table's records as JSON")]
    Fetch(FetchArgs),
    #[command(about = "Print review-needed items awaiting action under one law")]
    Review(ReviewArgs),
}

#[derive(Args)]
struct ImportArgs {
    #[arg(value_enum)]
    record_type: RecordType,

    /// Input file; reads stdin when omitted
    #[arg(long)]
    file: Option<String>,

    /// Skip the large-upload confirmation prompt
    #[arg(long)]
    yes: bool,
}

#[derive(Args)]
struct DedupArgs {
    #[arg(value_enum)]
    record_type: RecordType,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(value_enum)]
    record_type: RecordType,

    /// Output path; defaults to <type>_<timestamp>.csv
    #[arg(long)]
    out: Option<String>,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(value_enum)]
    record_type: RecordType,
}

#[derive(Args)]
struct ReviewArgs {
    #[arg(value_enum)]
    filter: ReviewFilter,
}

/// Uploads above this size ask for confirmation first.
const CONFIRM_THRESHOLD: usize = 1000;

struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn event(&self, snapshot: &ProgressSnapshot) {
        let phase = match snapshot.phase {
            SyncPhase::Insert => "upload",
            SyncPhase::Delete => "delete",
        };
        let eta = snapshot
            .eta
            .map(|eta| format!(", ~{}s left", eta.as_secs()))
            .unwrap_or_default();
        eprintln!(
            "{phase}: {}/{} (ok {}, failed {}, skipped {}{eta})",
            snapshot.processed, snapshot.total, snapshot.success, snapshot.fail, snapshot.skip
        );
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(reg) = report.downcast_ref::<RegError>() {
            return ExitCode::from(map_exit_code(reg));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &RegError) -> u8 {
    match error {
        RegError::MissingConfig | RegError::RecordNotFound { .. } => 2,
        RegError::TableHttp(_) | RegError::TableStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let resolved = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let client = TableHttpClient::new(&resolved.base_url).into_diagnostic()?;
    let app = App::new(client, resolved.user, resolved.sync);

    match cli.command {
        Commands::Import(args) => run_import(args, &app),
        Commands::Dedup(args) => run_dedup(args, &app),
        Commands::Export(args) => run_export(args, &app),
        Commands::Fetch(args) => run_fetch(args, &app),
        Commands::Review(args) => run_review(args, &app),
    }
}

fn read_input(file: Option<&str>) -> Result<String, RegError> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).map_err(|err| RegError::Filesystem(err.to_string()))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| RegError::Filesystem(err.to_string()))?;
            Ok(text)
        }
    }
}

fn confirm(prompt: &str) -> Result<bool, RegError> {
    eprint!("{prompt} [y/N] ");
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|err| RegError::Filesystem(err.to_string()))?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

fn run_import(args: ImportArgs, app: &App<TableHttpClient>) -> miette::Result<()> {
    let text = read_input(args.file.as_deref()).into_diagnostic()?;

    let table = regsync::parser::parse(&text, Some(args.record_type));
    if table.rows.len() > CONFIRM_THRESHOLD && !args.yes {
        let minutes = estimate_minutes(table.rows.len());
        let prompt = format!(
            "{} rows to upload, roughly {} minute(s). Continue?",
            table.rows.len(),
            minutes
        );
        if !confirm(&prompt).into_diagnostic()? {
            return Ok(());
        }
    }

    let report = app
        .import_text(&text, args.record_type, &ConsoleSink)
        .into_diagnostic()?;
    println!(
        "parsed {}, uploaded {}, duplicates skipped {}, failed {}",
        report.parsed, report.bulk.success, report.duplicates, report.bulk.fail
    );
    for failure in &report.bulk.failures {
        eprintln!("failed: {failure}");
    }
    Ok(())
}

fn estimate_minutes(rows: usize) -> usize {
    // one batch of 10 per second, rounded up
    rows.div_ceil(10).div_ceil(60).max(1)
}

fn run_dedup(args: DedupArgs, app: &App<TableHttpClient>) -> miette::Result<()> {
    let report = app
        .purge_duplicates(args.record_type, &ConsoleSink)
        .into_diagnostic()?;
    println!(
        "{} duplicate group(s), deleted {}, failed {}",
        report.groups, report.bulk.success, report.bulk.fail
    );
    Ok(())
}

fn run_export(args: ExportArgs, app: &App<TableHttpClient>) -> miette::Result<()> {
    let csv = app.export_csv(args.record_type).into_diagnostic()?;
    if csv.is_empty() {
        println!("no records to export");
        return Ok(());
    }
    let path = args.out.unwrap_or_else(|| {
        format!(
            "{}_{}.csv",
            args.record_type,
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    });
    std::fs::write(&path, csv)
        .map_err(|err| RegError::Filesystem(err.to_string()))
        .into_diagnostic()?;
    println!("wrote {path}");
    Ok(())
}

fn run_fetch(args: FetchArgs, app: &App<TableHttpClient>) -> miette::Result<()> {
    let records = app.fetch_records(args.record_type).into_diagnostic()?;
    let json = serde_json::to_string_pretty(&records).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn run_review(args: ReviewArgs, app: &App<TableHttpClient>) -> miette::Result<()> {
    let items = app.review_worklist(args.filter).into_diagnostic()?;
    eprintln!("{}: {} item(s)", args.filter.label(), items.len());
    let json = serde_json::to_string_pretty(&items).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
