//! Batch command - read dates of birth from many ID images.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use zkid_core::{DobExtractor, ExtractionReport, ExtractionStatus, OcrCollaborator};

use super::build_extractor;
use super::config::load_config;
use super::scan::{format_reports, OutputFormat};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tiff", "tif", "bmp", "gif"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input glob pattern (e.g. "scans/*.jpg")
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Number of images recognized concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Record unreadable files as failed instead of stopping
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Attach calendar warnings to each report
    #[arg(long)]
    validate: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files = collect_images(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching image files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let extractor = build_extractor(&config, args.model_dir.clone())?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let reports = process_all(&extractor, &files, &args, &pb).await?;
    pb.finish_and_clear();

    let output = format_reports(&reports, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        debug!("Wrote output to {}", output_path.display());
    } else {
        println!("{}", output);
    }

    print_summary(&reports, start);

    Ok(())
}

/// Expand the glob, keeping only files with image extensions.
fn collect_images(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let files = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    Ok(files)
}

/// Run the extractor over every file, at most `args.jobs` at a time, keeping input order.
///
/// Without `--continue-on-error` the first unreadable file ends the batch;
/// files not yet started are skipped.
async fn process_all<O: OcrCollaborator>(
    extractor: &DobExtractor<O>,
    files: &[PathBuf],
    args: &BatchArgs,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<ExtractionReport>> {
    stream::iter(files)
        .map(move |path| async move {
            let result = process_file(extractor, path, args.validate).await;
            pb.inc(1);

            match result {
                Ok(report) => Ok(report),
                Err(e) if args.continue_on_error => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    Ok(ExtractionReport::failed(
                        path.display().to_string(),
                        format!("failed to read file: {}", e),
                        0,
                    ))
                }
                Err(e) => {
                    error!("Failed to read {}: {}", path.display(), e);
                    Err(anyhow::anyhow!("Processing failed for {}: {}", path.display(), e))
                }
            }
        })
        .buffered(args.jobs.max(1))
        .try_collect()
        .await
}

async fn process_file<O: OcrCollaborator>(
    extractor: &DobExtractor<O>,
    path: &Path,
    validate: bool,
) -> anyhow::Result<ExtractionReport> {
    let image = tokio::fs::read(path).await?;
    let report = extractor
        .extract_report(path.display().to_string(), &image)
        .await;

    Ok(if validate {
        report.with_calendar_warnings()
    } else {
        report
    })
}

fn print_summary(reports: &[ExtractionReport], start: Instant) {
    let count = |status: ExtractionStatus| reports.iter().filter(|r| r.status == status).count();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        reports.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} found, {} without date, {} failed",
        style(count(ExtractionStatus::Found)).green(),
        style(count(ExtractionStatus::NotFound)).yellow(),
        style(count(ExtractionStatus::Failed)).red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zkid_core::{OcrError, RecognizedText};

    /// Reads the image bytes as UTF-8 text.
    struct EchoOcr;

    #[async_trait]
    impl OcrCollaborator for EchoOcr {
        async fn recognize(&self, image: &[u8], _language: &str) -> Result<RecognizedText, OcrError> {
            String::from_utf8(image.to_vec())
                .map(RecognizedText::from_text)
                .map_err(|e| OcrError::InvalidImage(e.to_string()))
        }
    }

    fn batch_args(continue_on_error: bool) -> BatchArgs {
        BatchArgs {
            input: String::new(),
            output: None,
            format: OutputFormat::Json,
            jobs: 2,
            continue_on_error,
            model_dir: None,
            validate: true,
        }
    }

    fn write_files(dir: &Path) -> Vec<PathBuf> {
        let files = [
            ("a.png", "DOB 15/08/1995".as_bytes().to_vec()),
            ("b.png", b"nothing".to_vec()),
            ("c.png", vec![0xff, 0xfe, 0x00]),
        ];
        files
            .into_iter()
            .map(|(name, bytes)| {
                let path = dir.join(name);
                fs::write(&path, bytes).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reports_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_files(dir.path());
        let extractor = DobExtractor::new(EchoOcr);

        let reports = process_all(&extractor, &files, &batch_args(false), &ProgressBar::hidden())
            .await
            .unwrap();

        let statuses: Vec<ExtractionStatus> = reports.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![ExtractionStatus::Found, ExtractionStatus::NotFound, ExtractionStatus::Failed]
        );
        assert_eq!(reports[0].date_of_birth.as_ref().unwrap().as_str(), "15/08/1995");
    }

    #[tokio::test]
    async fn test_unreadable_file_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_files(dir.path());
        files.insert(1, dir.path().join("missing.png"));
        let extractor = DobExtractor::new(EchoOcr);

        let result =
            process_all(&extractor, &files, &batch_args(false), &ProgressBar::hidden()).await;
        assert!(result.is_err());

        let reports = process_all(&extractor, &files, &batch_args(true), &ProgressBar::hidden())
            .await
            .unwrap();
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[1].status, ExtractionStatus::Failed);
        let error = reports[1].error.as_deref().unwrap();
        assert!(error.starts_with("failed to read file: "), "{}", error);
        assert!(!error.contains("invalid image"));
    }

    /// Counts recognition calls; every image reads as a date.
    struct Counting(AtomicUsize);

    #[async_trait]
    impl OcrCollaborator for Counting {
        async fn recognize(&self, _image: &[u8], _language: &str) -> Result<RecognizedText, OcrError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RecognizedText::from_text("01/02/1990"))
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_skips_remaining_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_files(dir.path());
        files.insert(0, dir.path().join("missing.png"));
        let extractor = DobExtractor::new(Counting(AtomicUsize::new(0)));

        let mut args = batch_args(false);
        args.jobs = 1;

        let result = process_all(&extractor, &files, &args, &ProgressBar::hidden()).await;

        assert!(result.is_err());
        assert_eq!(extractor.collaborator().0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_collect_images_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["id.PNG", "id.jpg", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let mut names: Vec<String> = collect_images(&pattern)
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        names.sort();

        assert_eq!(names, vec!["id.PNG", "id.jpg"]);
    }
}
