//! FxSignal CLI: enrich FX bar series with indicators, breakouts,
//! bracket levels and scored signals.
//!
//! Commands:
//! - `enrich`: load, enrich and write the table to the configured output
//! - `summary`: load and enrich, print counts and the latest signals
//! - `check-config`: validate a run config and print its run id

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use fxsignal_core::TableSummary;
use fxsignal_runner::{
    init_logging, prepare, run, CurrencyPair, LogFormat, OutputConfig, OutputFormat, RunConfig,
    RunReport, SourceConfig,
};

#[derive(Parser)]
#[command(
    name = "fxsignal",
    about = "FxSignal CLI: indicator enrichment and signal scoring for FX bars"
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a series and write the table.
    Enrich {
        #[command(flatten)]
        input: InputArgs,

        /// Output file. Format is taken from --format or the extension.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: csv, parquet or json.
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Print the run report as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        report_json: bool,
    },
    /// Enrich a series and print a summary without writing it.
    Summary {
        #[command(flatten)]
        input: InputArgs,

        /// Number of recent signals to list.
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },
    /// Validate a run config file and print its run id.
    CheckConfig {
        /// Path to a TOML run config.
        config: PathBuf,
    },
}

/// Where the bars come from, plus overrides of the run config.
#[derive(Args)]
struct InputArgs {
    /// Path to a TOML run config.
    #[arg(long, conflicts_with_all = ["input", "synthetic"])]
    config: Option<PathBuf>,

    /// CSV or Parquet input file (by extension).
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate this many synthetic bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Currency pair, e.g. EUR/USD. Required without --config.
    #[arg(long)]
    pair: Option<CurrencyPair>,

    /// Minimum confidence for a signal to be emitted.
    #[arg(long)]
    threshold: Option<f64>,

    /// First day kept (YYYY-MM-DD).
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day kept (YYYY-MM-DD).
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Resample to buckets of this many minutes.
    #[arg(long)]
    resample_minutes: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(format).context("failed to initialise logging")?;

    match cli.command {
        Commands::Enrich {
            input,
            output,
            format,
            report_json,
        } => run_enrich(&input, output, format, report_json),
        Commands::Summary { input, recent } => run_summary(&input, recent),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn run_enrich(
    input: &InputArgs,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
    report_json: bool,
) -> Result<()> {
    let mut config = resolve_config(input)?;
    apply_output(&mut config, output, format)?;
    if config.output.is_none() {
        bail!("no output configured: pass --output or set [output] in the config");
    }
    config.validate()?;

    let (_, report) = run(&config)?;
    if report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        if let Some(path) = &report.output {
            println!("Table written to: {}", path.display());
        }
    }
    Ok(())
}

fn run_summary(input: &InputArgs, recent: usize) -> Result<()> {
    let config = resolve_config(input)?;
    config.validate()?;
    let (table, mut report) = prepare(&config)?;
    report.summary = table.summary(recent);
    print_report(&report);
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = RunConfig::from_file(path)
        .with_context(|| format!("invalid config {}", path.display()))?;
    println!("Config OK: {}", path.display());
    println!("Pair:    {}", config.pair);
    println!("Run id:  {}", config.run_id()?);
    Ok(())
}

/// Build the run config from a file or flags, then apply flag overrides.
fn resolve_config(args: &InputArgs) -> Result<RunConfig> {
    let mut config = if let Some(path) = &args.config {
        RunConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        let Some(pair) = args.pair.clone() else {
            bail!("--pair is required without --config");
        };
        let source = match (&args.input, args.synthetic) {
            (Some(path), _) => source_from_path(path)?,
            (None, Some(bars)) => SourceConfig::synthetic(bars),
            (None, None) => bail!("one of --config, --input or --synthetic is required"),
        };
        RunConfig {
            pair,
            source,
            start: None,
            end: None,
            resample_minutes: None,
            output: None,
            engine: Default::default(),
        }
    };

    if let Some(pair) = &args.pair {
        config.pair = pair.clone();
    }
    if let Some(threshold) = args.threshold {
        config.engine.scoring.confidence_threshold = threshold;
    }
    if args.start.is_some() {
        config.start = args.start;
    }
    if args.end.is_some() {
        config.end = args.end;
    }
    if args.resample_minutes.is_some() {
        config.resample_minutes = args.resample_minutes;
    }
    Ok(config)
}

fn source_from_path(path: &Path) -> Result<SourceConfig> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(SourceConfig::Csv {
            path: path.to_path_buf(),
        }),
        Some("parquet") | Some("pq") => Ok(SourceConfig::Parquet {
            path: path.to_path_buf(),
        }),
        _ => bail!("cannot tell the format of {}: use .csv or .parquet", path.display()),
    }
}

fn apply_output(
    config: &mut RunConfig,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<()> {
    if let Some(path) = output {
        let format = match format {
            Some(f) => f,
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.parse::<OutputFormat>())
                .transpose()
                .map_err(anyhow::Error::msg)?
                .unwrap_or_default(),
        };
        config.output = Some(OutputConfig { path, format });
    } else if let (Some(existing), Some(f)) = (config.output.as_mut(), format) {
        existing.format = f;
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let s: &TableSummary = &report.summary;
    println!();
    println!("=== FxSignal Run ===");
    println!("Pair:           {}", report.pair);
    match (s.first, s.last) {
        (Some(first), Some(last)) => println!("Period:         {first} to {last}"),
        _ => println!("Period:         (empty)"),
    }
    println!("Bars:           {}", s.bars);
    println!("Buy signals:    {}", s.buy_signals);
    println!("Sell signals:   {}", s.sell_signals);
    println!("Breakouts:      {} up / {} down", s.bullish_breakouts, s.bearish_breakouts);
    println!("Run id:         {}", &report.run_id[..12.min(report.run_id.len())]);
    println!("Dataset hash:   {}", &report.dataset_hash[..12.min(report.dataset_hash.len())]);

    if !s.recent_signals.is_empty() {
        println!();
        println!("--- Recent Signals ---");
        println!(
            "{:<20} {:<5} {:>6} {:>10} {:>10} {:>10}",
            "Timestamp", "Side", "Conf", "Entry", "TP", "SL"
        );
        println!("{}", "-".repeat(66));
        for row in &s.recent_signals {
            let side = match row.signal.as_i8() {
                1 => "BUY",
                -1 => "SELL",
                _ => "-",
            };
            let level = |v: Option<f64>| v.map(|v| format!("{v:.5}")).unwrap_or_default();
            println!(
                "{:<20} {:<5} {:>6.3} {:>10} {:>10} {:>10}",
                row.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                side,
                row.confidence,
                level(row.entry_price),
                level(row.take_profit),
                level(row.stop_loss),
            );
        }
    }

    if report.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for diagnostic in &report.diagnostics {
        println!("NOTE: {diagnostic}");
    }
    println!();
}
