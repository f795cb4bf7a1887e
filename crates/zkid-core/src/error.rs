//! Error types for the zkid-core library.

use thiserror::Error;

/// Main error type for the zkid library.
#[derive(Error, Debug)]
pub enum ZkidError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Wallet status error.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON (configuration or report).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by an OCR collaborator.
///
/// The DOB extractor converts every one of these into "no date found" at its
/// outer surface; they stay distinguishable through `DobExtractor::try_extract`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The image bytes could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Text detection or recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine has no model for the requested language.
    #[error("unsupported language '{requested}' (engine loaded for '{loaded}')")]
    UnsupportedLanguage { requested: String, loaded: String },

    /// The blocking OCR task panicked or was cancelled.
    #[error("OCR task failed: {0}")]
    Task(String),
}

/// Errors related to wallet connection state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The string is not a base58 public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Result type for the zkid library.
pub type Result<T> = std::result::Result<T, ZkidError>;
