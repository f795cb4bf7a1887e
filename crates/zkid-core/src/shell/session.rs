//! Upload session: what the shell shows while images are being read.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dob::{DateOfBirth, ExtractionOutcome};

pub const PROCESSING_MESSAGE: &str = "Processing...";
pub const NO_DOB_MESSAGE: &str = "No DOB extracted. Try a clearer image.";
pub const FOUND_PREFIX: &str = "Extracted Date of Birth: ";

/// Identifies one extraction attempt. Later attempts get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Display state of the upload area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "date_of_birth", rename_all = "snake_case")]
pub enum DisplayState {
    /// Nothing uploaded yet.
    Idle,
    /// An extraction is in flight.
    Processing,
    /// Recognition finished, with or without a date.
    Done(Option<DateOfBirth>),
    /// Recognition failed.
    Failed,
}

impl DisplayState {
    /// Text shown for this state.
    ///
    /// Idle, failed and "nothing found" all read the same.
    pub fn message(&self) -> String {
        match self {
            Self::Processing => PROCESSING_MESSAGE.to_string(),
            Self::Done(Some(date)) => format!("{}{}", FOUND_PREFIX, date),
            Self::Done(None) | Self::Failed | Self::Idle => NO_DOB_MESSAGE.to_string(),
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }

    pub fn date(&self) -> Option<&DateOfBirth> {
        match self {
            Self::Done(Some(date)) => Some(date),
            _ => None,
        }
    }
}

/// Tracks the latest extraction attempt and the resulting display state.
///
/// Uploads are never blocked while one is in flight. Instead every attempt is
/// tagged with a [`RequestToken`] and only the most recently issued token may
/// change the state; results for older tokens are dropped.
#[derive(Debug, Clone)]
pub struct UploadSession {
    last_issued: u64,
    in_flight: Option<RequestToken>,
    state: DisplayState,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            last_issued: 0,
            in_flight: None,
            state: DisplayState::Idle,
        }
    }

    /// Start an attempt. Supersedes any attempt still in flight.
    pub fn begin(&mut self) -> RequestToken {
        self.last_issued += 1;
        let token = RequestToken(self.last_issued);

        if let Some(previous) = self.in_flight.replace(token) {
            debug!("Request {} superseded by {}", previous, token);
        }
        self.state = DisplayState::Processing;

        token
    }

    /// Apply the result of an attempt.
    ///
    /// Returns `false`, leaving the state alone, when `token` is not the
    /// attempt currently in flight.
    pub fn complete(&mut self, token: RequestToken, outcome: ExtractionOutcome) -> bool {
        if self.in_flight != Some(token) {
            debug!("Discarding stale result for request {}", token);
            return false;
        }
        self.in_flight = None;

        self.state = match outcome {
            ExtractionOutcome::Found(date) => DisplayState::Done(Some(date)),
            ExtractionOutcome::NotFound => DisplayState::Done(None),
            ExtractionOutcome::Failed(reason) => {
                debug!("Request {} failed: {}", token, reason);
                DisplayState::Failed
            }
        };

        true
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn message(&self) -> String {
        self.state.message()
    }

    /// The attempt whose result would currently be accepted.
    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}
