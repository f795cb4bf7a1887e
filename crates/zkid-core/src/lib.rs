//! Core library for ZK-ID date-of-birth extraction.
//!
//! This crate provides:
//! - Date-of-birth pattern matching over recognized text
//! - An async OCR collaborator seam, with a native ONNX engine behind the `native` feature
//! - The upload session state machine that drives what the shell displays
//! - Wallet connection status for display
//! - Configuration and report models

pub mod dob;
pub mod error;
pub mod models;
pub mod ocr;
pub mod shell;

pub use dob::{
    find_all_dates, find_date_of_birth, CalendarReading, DateOfBirth, DateOrder, DobExtractor,
    ExtractionOutcome,
};
pub use error::{OcrError, Result, WalletError, ZkidError};
pub use models::config::ZkidConfig;
pub use models::report::{ExtractionReport, ExtractionStatus};
pub use ocr::{OcrCollaborator, RecognizedText, TextBox, DEFAULT_LANGUAGE};
#[cfg(feature = "native")]
pub use ocr::OnnxOcrEngine;
pub use shell::{
    DisplayState, PublicKey, RequestToken, StaticWallet, UploadSession, WalletConnection,
    WalletStatus,
};
