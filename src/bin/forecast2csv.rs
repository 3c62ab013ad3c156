use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use forecast_cell_extractor::{
    DateStrategy, ExtractOptions, ExtractionFailure, FailureReason, KeywordSpec, MetricRecord,
    PageSelection, ReportConfig, SignRule, extract_forecast, write_record,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_ROW_KEYWORDS: [&str; 1] = ["財政"];
const DEFAULT_COLUMN_KEYWORDS: [&str; 2] = ["当社需給予想", "需給予想"];
const DEFAULT_HEADER_1: &str = "UYTCAB.DEMANDFORECAST.CHANGECURRBAL.JPN.B";
const DEFAULT_HEADER_2: &str = "Supply and demand forecast: Change in current account balance";

#[derive(Debug, Parser)]
#[command(
    name = "forecast2csv",
    version,
    about = "Extract one keyword-addressed forecast value from a PDF report into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Locate the value and write the two-header CSV record.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON report config with rowKeywords, columnKeywords and metric headers.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Row keyword. Repeatable; overrides the config file.
    #[arg(long = "row-keyword")]
    row_keywords: Vec<String>,

    /// Column keyword. Repeatable; overrides the config file.
    #[arg(long = "column-keyword")]
    column_keywords: Vec<String>,

    /// First metric header row.
    #[arg(long)]
    header1: Option<String>,

    /// Second metric header row.
    #[arg(long)]
    header2: Option<String>,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Match keywords without regard to letter case.
    #[arg(long)]
    ignore_case: bool,

    /// Treat only ▲ (not △) as a negative marker.
    #[arg(long)]
    no_negative_triangles: bool,

    /// Where the date comes from: issue (report date) or column (header month/day).
    #[arg(long, default_value = "issue")]
    date_source: String,

    /// Year source for dates printed without a year (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    reference_date: Option<String>,

    /// Lines searched around a keyword when falling back to page text.
    #[arg(long, default_value_t = 3)]
    fallback_window: usize,

    /// Also print the record as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Print failure diagnostics.
    #[arg(short, long)]
    verbose: bool,
}

struct Plan {
    options: ExtractOptions,
    header1: String,
    header2: String,
}

fn load_config(args: &ExtractArgs) -> Result<Option<ReportConfig>> {
    let Some(path) = &args.config else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let config = ReportConfig::from_json_str(&json)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    Ok(Some(config))
}

fn pick_keywords(cli: &[String], config: Option<&Vec<String>>, defaults: &[&str]) -> Vec<String> {
    if !cli.is_empty() {
        return cli.to_vec();
    }
    config.cloned().unwrap_or_else(|| {
        defaults.iter().map(|keyword| (*keyword).to_string()).collect()
    })
}

fn parse_plan(args: &ExtractArgs) -> Result<Plan> {
    let config = load_config(args)?;

    let row_keywords = pick_keywords(
        &args.row_keywords,
        config.as_ref().map(|config| &config.row_keywords),
        &DEFAULT_ROW_KEYWORDS,
    );
    let column_keywords = pick_keywords(
        &args.column_keywords,
        config.as_ref().map(|config| &config.column_keywords),
        &DEFAULT_COLUMN_KEYWORDS,
    );
    let mut keywords =
        KeywordSpec::new(&row_keywords, &column_keywords).context("invalid keywords")?;
    let case_insensitive =
        args.ignore_case || config.as_ref().is_some_and(|config| !config.case_sensitive);
    if case_insensitive {
        keywords = keywords.case_insensitive();
    }

    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let date_strategy = DateStrategy::from_str(&args.date_source)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --date-source")?;

    let reference_date = args
        .reference_date
        .as_deref()
        .map(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .transpose()
        .context("failed to parse --reference-date")?;

    let mut sign_rule = SignRule::default();
    if args.no_negative_triangles {
        sign_rule.negative_markers.retain(|marker| *marker != '△');
    }

    let header1 = args
        .header1
        .clone()
        .or_else(|| config.as_ref().and_then(|config| config.metric_header1.clone()))
        .unwrap_or_else(|| DEFAULT_HEADER_1.to_string());
    let header2 = args
        .header2
        .clone()
        .or_else(|| config.as_ref().and_then(|config| config.metric_header2.clone()))
        .unwrap_or_else(|| DEFAULT_HEADER_2.to_string());

    Ok(Plan {
        options: ExtractOptions {
            pages,
            fallback_window: args.fallback_window,
            sign_rule,
            date_strategy,
            reference_date,
            ..ExtractOptions::new(keywords)
        },
        header1,
        header2,
    })
}

fn log_failure(failure: &ExtractionFailure, verbose: bool) {
    tracing::error!(reason = failure.reason.code(), "{}", failure.message);
    if verbose {
        let diagnostics = &failure.diagnostics;
        eprintln!(
            "  rows={:?} columns={:?} tables_scanned={} pages_scanned={}",
            diagnostics.row_keywords,
            diagnostics.column_keywords,
            diagnostics.tables_scanned,
            diagnostics.pages_scanned
        );
    }
}

fn run_extract(args: &ExtractArgs) -> Result<MetricRecord> {
    let plan = parse_plan(args)?;
    let result = extract_forecast(&args.input, &plan.options)?;
    tracing::info!(
        date = %result.date,
        value = %result.value,
        source = ?result.source,
        "forecast value extracted"
    );

    let record = result.into_record(plan.header1, plan.header2);
    write_record(&args.output, &record)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(record)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("forecast_cell_extractor=warn,forecast2csv=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(record) => {
                if args.json {
                    match serde_json::to_string_pretty(&record) {
                        Ok(json) => println!("{json}"),
                        Err(error) => {
                            eprintln!("error: failed to render JSON: {error}");
                            return ExitCode::from(1);
                        }
                    }
                }
                ExitCode::SUCCESS
            }
            Err(error) => match error.downcast_ref::<ExtractionFailure>() {
                Some(failure) => {
                    log_failure(failure, args.verbose);
                    eprintln!("error: {failure}");
                    if failure.reason == FailureReason::NoMatch {
                        ExitCode::from(2)
                    } else {
                        ExitCode::from(1)
                    }
                }
                None => {
                    eprintln!("error: {error:#}");
                    ExitCode::from(1)
                }
            },
        },
    }
}
