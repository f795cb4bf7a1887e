//! Models command - download and manage OCR models.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand, ValueEnum};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use zkid_core::models::config::ZkidConfig;

use super::config::load_config;

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List available model variants
    List,

    /// Download models
    Download(DownloadArgs),

    /// Check model status
    Status(StatusArgs),

    /// Remove downloaded models
    Clean(CleanArgs),

    /// Set the active model variant
    Use(UseArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelVariant {
    /// Mobile models - smaller, faster
    Mobile,
    /// Server models - better detection accuracy
    Server,
}

impl std::fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelVariant::Mobile => write!(f, "mobile"),
            ModelVariant::Server => write!(f, "server"),
        }
    }
}

const ALL_VARIANTS: [ModelVariant; 2] = [ModelVariant::Mobile, ModelVariant::Server];

#[derive(Args)]
struct DownloadArgs {
    /// Model variant to download
    #[arg(short, long, value_enum, default_value = "mobile")]
    variant: ModelVariant,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct StatusArgs {
    /// Check specific variant only
    #[arg(short, long, value_enum)]
    variant: Option<ModelVariant>,
}

#[derive(Args)]
struct CleanArgs {
    /// Clean specific variant only
    #[arg(short, long, value_enum)]
    variant: Option<ModelVariant>,

    /// Clean all variants
    #[arg(long)]
    all: bool,
}

#[derive(Args)]
struct UseArgs {
    /// Variant to set as active
    #[arg(value_enum)]
    variant: ModelVariant,
}

/// One model file of a variant.
#[derive(Clone)]
struct ModelFile {
    filename: String,
    size_bytes: u64,
    description: &'static str,
}

/// Files needed to recognize the configured language with a variant.
fn variant_files(variant: ModelVariant, config: &ZkidConfig) -> Vec<ModelFile> {
    let language = &config.ocr.language;
    let det_size = match variant {
        ModelVariant::Mobile => 4_500_000,
        ModelVariant::Server => 84_000_000,
    };

    vec![
        ModelFile {
            filename: config.models.detection_model.clone(),
            size_bytes: det_size,
            description: "text detection",
        },
        ModelFile {
            filename: config.models.recognition_model(language),
            size_bytes: 7_500_000,
            description: "text recognition",
        },
        ModelFile {
            filename: config.models.dictionary(language),
            size_bytes: 1_000,
            description: "character dictionary",
        },
    ]
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("zkid")
}

/// Get the model directory for a specific variant
pub fn get_variant_dir(variant: ModelVariant) -> PathBuf {
    data_dir().join("models").join(variant.to_string())
}

/// Get the active variant from the data directory
pub fn get_active_variant() -> ModelVariant {
    match fs::read_to_string(data_dir().join("active_variant")) {
        Ok(content) if content.trim() == "server" => ModelVariant::Server,
        _ => ModelVariant::Mobile,
    }
}

fn set_active_variant(variant: ModelVariant) -> anyhow::Result<()> {
    let dir = data_dir();
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("active_variant"), variant.to_string())?;
    Ok(())
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        ModelsCommand::List => list_models(&config),
        ModelsCommand::Download(download_args) => download_models(download_args, &config).await,
        ModelsCommand::Status(status_args) => check_status(status_args, &config),
        ModelsCommand::Clean(clean_args) => clean_models(clean_args, &config),
        ModelsCommand::Use(use_args) => use_variant(use_args, &config),
    }
}

fn list_models(config: &ZkidConfig) -> anyhow::Result<()> {
    println!(
        "{} (language: {})",
        style("Available Model Variants").bold(),
        config.ocr.language
    );
    println!();

    let active = get_active_variant();

    for variant in ALL_VARIANTS {
        let files = variant_files(variant, config);
        let total_size: u64 = files.iter().map(|f| f.size_bytes).sum();
        let active_marker = if variant == active { " (active)" } else { "" };

        let desc = match variant {
            ModelVariant::Mobile => "- faster, smaller",
            ModelVariant::Server => "- better detection accuracy",
        };

        println!(
            "{} {} {}{}",
            style(format!("▸ {}", variant)).bold().cyan(),
            format_size(total_size),
            style(desc).dim(),
            style(active_marker).green().bold()
        );

        for file in &files {
            println!(
                "    {:<20} {:>10}  {}",
                file.filename,
                format_size(file.size_bytes),
                file.description
            );
        }
        println!();
    }

    println!("Commands:");
    println!("  zkid models download -v mobile    Download mobile models");
    println!("  zkid models download -v server    Download server models");
    println!("  zkid models use <variant>         Switch active variant");

    Ok(())
}

fn use_variant(args: UseArgs, config: &ZkidConfig) -> anyhow::Result<()> {
    let variant_dir = get_variant_dir(args.variant);

    let missing = variant_files(args.variant, config)
        .iter()
        .any(|f| !variant_dir.join(&f.filename).exists());

    if missing {
        println!(
            "{} {} models not downloaded yet.",
            style("⚠").yellow(),
            args.variant
        );
        println!("Run: zkid models download -v {}", args.variant);
        return Ok(());
    }

    set_active_variant(args.variant)?;
    println!(
        "{} Switched to {} models",
        style("✓").green(),
        style(args.variant.to_string()).cyan().bold()
    );

    Ok(())
}

async fn download_models(args: DownloadArgs, config: &ZkidConfig) -> anyhow::Result<()> {
    let variant = args.variant;
    let output_dir = args.output.unwrap_or_else(|| get_variant_dir(variant));
    fs::create_dir_all(&output_dir)?;

    println!(
        "{} Downloading {} models to {}",
        style("ℹ").blue(),
        style(variant.to_string()).cyan().bold(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("zkid-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    for file in variant_files(variant, config) {
        let path = output_dir.join(&file.filename);

        if path.exists() && !args.force {
            println!(
                "  {} {} (already exists, {})",
                style("✓").green(),
                file.filename,
                format_size(fs::metadata(&path)?.len())
            );
            skip_count += 1;
            continue;
        }

        let url = config.models.download_url(&variant.to_string(), &file.filename);

        let pb = multi_progress.add(ProgressBar::new(file.size_bytes));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")?
                .progress_chars("=>-"),
        );
        pb.set_message(file.filename.clone());

        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), file.filename));
                success_count += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), file.filename, e));
                error_count += 1;
            }
        }
    }

    println!();

    if error_count == 0 {
        println!(
            "{} {} models ready ({} downloaded, {} already present)",
            style("✓").green().bold(),
            variant,
            success_count,
            skip_count
        );

        if get_active_variant() != variant {
            println!();
            println!(
                "{} To use these models, run: zkid models use {}",
                style("ℹ").blue(),
                variant
            );
        }
    } else {
        println!(
            "{} Download completed with errors",
            style("⚠").yellow().bold()
        );
        println!(
            "   {} downloaded, {} skipped, {} failed",
            success_count, skip_count, error_count
        );
        println!();
        println!("Retry with: zkid models download -v {} --force", variant);
    }

    println!();
    check_status(StatusArgs { variant: Some(variant) }, config)?;

    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Partial downloads stay under the .tmp name
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

fn check_status(args: StatusArgs, config: &ZkidConfig) -> anyhow::Result<()> {
    let active = get_active_variant();

    println!("{}", style("Model Status").bold());
    println!("Active variant: {}", style(active.to_string()).cyan().bold());
    println!();

    let variants: Vec<ModelVariant> = match args.variant {
        Some(v) => vec![v],
        None => ALL_VARIANTS.to_vec(),
    };

    for variant in variants {
        let model_dir = get_variant_dir(variant);

        let active_marker = if variant == active {
            style(" ◀ active").green().to_string()
        } else {
            String::new()
        };

        println!(
            "{} {}{}",
            style(format!("▸ {}", variant)).bold(),
            model_dir.display(),
            active_marker
        );

        let mut all_present = true;
        let mut total_size: u64 = 0;

        for file in variant_files(variant, config) {
            let path = model_dir.join(&file.filename);
            let (status, size_str) = if path.exists() {
                let size = fs::metadata(&path)?.len();
                total_size += size;
                (style("✓").green(), format_size(size))
            } else {
                all_present = false;
                (style("✗").red(), "missing".to_string())
            };

            println!("    {} {:<25} {:>10}", status, file.filename, size_str);
        }

        if all_present {
            println!(
                "    {} Ready ({} total)",
                style("✓").green(),
                format_size(total_size)
            );
        } else {
            println!(
                "    {} Run 'zkid models download -v {}' to download",
                style("⚠").yellow(),
                variant
            );
        }
        println!();
    }

    Ok(())
}

fn clean_models(args: CleanArgs, config: &ZkidConfig) -> anyhow::Result<()> {
    let variants: Vec<ModelVariant> = if args.all {
        ALL_VARIANTS.to_vec()
    } else if let Some(v) = args.variant {
        vec![v]
    } else {
        println!(
            "{} Specify --all to remove all models or -v <variant> for specific variant",
            style("ℹ").blue()
        );
        return Ok(());
    };

    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for variant in variants {
        let model_dir = get_variant_dir(variant);
        if !model_dir.exists() {
            continue;
        }

        println!("{} Cleaning {} models...", style("⚠").yellow(), variant);

        for file in variant_files(variant, config) {
            let path = model_dir.join(&file.filename);
            if path.exists() {
                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                fs::remove_file(&path)?;
                total_removed += 1;
                total_freed += size;
                println!("  {} Removed {}", style("✓").green(), file.filename);
            }
        }

        // Leftovers from interrupted downloads
        if let Ok(entries) = fs::read_dir(&model_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "tmp") {
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }

    if total_removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
