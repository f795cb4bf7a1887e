//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod models;
pub mod scan;
pub mod text;

use std::path::{Path, PathBuf};

use tracing::debug;

use zkid_core::models::config::ZkidConfig;
use zkid_core::{DobExtractor, OnnxOcrEngine};

use models::{get_active_variant, get_variant_dir};

/// Load the OCR engine for the configured language and wrap it in an extractor.
///
/// Missing models are a setup problem, not an extraction failure, so this bails.
pub fn build_extractor(
    config: &ZkidConfig,
    model_dir: Option<PathBuf>,
) -> anyhow::Result<DobExtractor<OnnxOcrEngine>> {
    let model_dir = model_dir
        .or_else(|| config.models.model_dir.clone())
        .unwrap_or_else(|| get_variant_dir(get_active_variant()));

    let language = &config.ocr.language;
    let det_model = model_dir.join(&config.models.detection_model);
    let rec_model = model_dir.join(config.models.recognition_model(language));
    let dictionary = model_dir.join(config.models.dictionary(language));

    if missing_models(&[det_model.as_path(), rec_model.as_path(), dictionary.as_path()]) {
        let active = get_active_variant();
        anyhow::bail!(
            "OCR models for '{}' not found at {}.\n\n\
             Run 'zkid models download -v {}' to download {} models.",
            language,
            model_dir.display(),
            active,
            active
        );
    }

    debug!("Using models from {}", model_dir.display());

    let engine = OnnxOcrEngine::from_dir(&model_dir, &config.models, config.ocr.clone())
        .map_err(|e| anyhow::anyhow!("Failed to load OCR models: {}", e))?;

    Ok(DobExtractor::new(engine).with_language(language.clone()))
}

fn missing_models(paths: &[&Path]) -> bool {
    paths.iter().any(|path| !path.exists())
}
