//! Scan command - read the date of birth from a single ID image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use zkid_core::{ExtractionReport, StaticWallet, UploadSession, WalletStatus};

use super::build_extractor;
use super::config::load_config;

pub const TITLE: &str = "ZK-ID: Privacy-Preserving Age Verification";

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// ID image (any format the image decoder understands)
    #[arg(required = true)]
    input: PathBuf,

    /// Public key of the connected wallet (overrides config)
    #[arg(short, long)]
    wallet: Option<String>,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Warn when the extracted date is not a real or unambiguous calendar date
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let wallet = StaticWallet::from_optional(
        args.wallet
            .as_deref()
            .or(config.wallet.public_key.as_deref()),
    )?;
    let wallet_status = WalletStatus::of(&wallet);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extractor = build_extractor(&config, args.model_dir.clone())?;

    info!("Scanning file: {}", args.input.display());
    let image = fs::read(&args.input)?;

    let mut session = UploadSession::new();
    let token = session.begin();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(session.message());
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut report = extractor
        .extract_report(args.input.display().to_string(), &image)
        .await;
    if args.validate {
        report = report.with_calendar_warnings();
    }

    session.complete(token, report.outcome());
    pb.finish_and_clear();

    if args.validate {
        for warning in &report.warnings {
            eprintln!("{} {}", style("⚠").yellow(), warning);
        }
    }

    let output = match args.format {
        OutputFormat::Text => render_shell(&wallet_status, &session),
        format => format_reports(std::slice::from_ref(&report), format)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total scan time: {:?}", start.elapsed());

    Ok(())
}

/// Terminal rendition of the upload page.
pub fn render_shell(wallet: &WalletStatus, session: &UploadSession) -> String {
    format!("{}\n{}\n{}", TITLE, wallet.label(), session.message())
}

/// Serialize reports in the requested format.
pub fn format_reports(reports: &[ExtractionReport], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            if let [report] = reports {
                Ok(serde_json::to_string_pretty(report)?)
            } else {
                Ok(serde_json::to_string_pretty(reports)?)
            }
        }
        OutputFormat::Csv => format_csv(reports),
        OutputFormat::Text => Ok(format_text(reports)),
    }
}

fn format_csv(reports: &[ExtractionReport]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "source",
        "status",
        "date_of_birth",
        "other_candidates",
        "error",
        "warnings",
        "processing_time_ms",
        "processed_at",
    ])?;

    for report in reports {
        let others = report
            .other_candidates
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(";");

        wtr.write_record([
            report.source.as_str(),
            report.status.as_str(),
            report.date_of_birth.as_ref().map(|d| d.as_str()).unwrap_or(""),
            others.as_str(),
            report.error.as_deref().unwrap_or(""),
            report.warnings.join("; ").as_str(),
            report.processing_time_ms.to_string().as_str(),
            report.processed_at.to_rfc3339().as_str(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(reports: &[ExtractionReport]) -> String {
    reports
        .iter()
        .map(|report| format!("{}: {}", report.source, outcome_message(report)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn outcome_message(report: &ExtractionReport) -> String {
    let mut session = UploadSession::new();
    let token = session.begin();
    session.complete(token, report.outcome());
    session.message()
}
