//! Configuration structures for the extraction pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ZkidError;
use crate::ocr::DEFAULT_LANGUAGE;

/// Main configuration for zkid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZkidConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Wallet display configuration.
    pub wallet: WalletConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognition language, also the prefix of the recognition model files.
    pub language: String,

    /// Maximum image dimension (longer side) for processing, 0 disables resizing.
    pub max_image_size: u32,

    /// Recognition confidence threshold (0.0 - 1.0).
    pub recognition_threshold: f32,

    /// Keep `[UNK]` tokens from the recognizer instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            max_image_size: 2048,
            recognition_threshold: 0.0, // Disabled - CTC confidence scores are inherently low
            keep_unk: false,
        }
    }
}

/// Model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files; the active downloaded variant when unset.
    pub model_dir: Option<PathBuf>,

    /// Text detection model file name.
    pub detection_model: String,

    /// Base URL that `<variant>/<file>` is appended to when downloading models.
    pub download_base_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            detection_model: "det.onnx".to_string(),
            download_base_url: "https://github.com/jakubmatias/incr/raw/main/models".to_string(),
        }
    }
}

impl ModelConfig {
    /// Recognition model file name for a language.
    pub fn recognition_model(&self, language: &str) -> String {
        format!("{}_rec.onnx", language)
    }

    /// Character dictionary file name for a language.
    pub fn dictionary(&self, language: &str) -> String {
        format!("{}_dict.txt", language)
    }

    /// Download URL of one model file for a variant.
    pub fn download_url(&self, variant: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.download_base_url.trim_end_matches('/'),
            variant,
            filename
        )
    }
}

/// Wallet display configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Public key of the connected wallet, if any.
    pub public_key: Option<String>,
}

impl ZkidConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ZkidError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ZkidError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ZkidError> {
        let language = self.ocr.language.trim();
        if language.is_empty() {
            return Err(ZkidError::Config("ocr.language must not be empty".to_string()));
        }
        if language.contains(['/', '\\']) {
            return Err(ZkidError::Config(format!(
                "ocr.language '{}' must not contain path separators",
                language
            )));
        }
        if !(0.0..=1.0).contains(&self.ocr.recognition_threshold) {
            return Err(ZkidError::Config(format!(
                "ocr.recognition_threshold {} is outside 0.0 - 1.0",
                self.ocr.recognition_threshold
            )));
        }
        Ok(())
    }
}
