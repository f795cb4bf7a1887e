//! Per-image extraction report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dob::{DateOfBirth, ExtractionOutcome};
use crate::error::OcrError;

/// Coarse status of an extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Found,
    NotFound,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

/// Serializable record of one extraction attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Where the image came from (usually a file path).
    pub source: String,

    pub status: ExtractionStatus,

    /// The first date-like substring, verbatim.
    pub date_of_birth: Option<DateOfBirth>,

    /// Date-like substrings after the first one, in text order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_candidates: Vec<DateOfBirth>,

    /// OCR failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Calendar problems with the extracted date (filled in on request).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    pub processed_at: DateTime<Utc>,
}

impl ExtractionReport {
    /// Build a report from every date-like candidate in recognition order.
    pub fn from_candidates(
        source: impl Into<String>,
        candidates: Result<Vec<DateOfBirth>, OcrError>,
        processing_time_ms: u64,
    ) -> Self {
        let (status, date_of_birth, other_candidates, error) = match candidates {
            Ok(candidates) => {
                let mut iter = candidates.into_iter();
                match iter.next() {
                    Some(first) => (ExtractionStatus::Found, Some(first), iter.collect(), None),
                    None => (ExtractionStatus::NotFound, None, Vec::new(), None),
                }
            }
            Err(e) => (ExtractionStatus::Failed, None, Vec::new(), Some(e.to_string())),
        };

        Self {
            source: source.into(),
            status,
            date_of_birth,
            other_candidates,
            error,
            warnings: Vec::new(),
            processing_time_ms,
            processed_at: Utc::now(),
        }
    }

    /// Report for an image that never reached the recognizer, e.g. an unreadable file.
    pub fn failed(source: impl Into<String>, error: impl Into<String>, processing_time_ms: u64) -> Self {
        Self {
            source: source.into(),
            status: ExtractionStatus::Failed,
            date_of_birth: None,
            other_candidates: Vec::new(),
            error: Some(error.into()),
            warnings: Vec::new(),
            processing_time_ms,
            processed_at: Utc::now(),
        }
    }

    /// Attach calendar warnings for the extracted date.
    pub fn with_calendar_warnings(mut self) -> Self {
        if let Some(ref date) = self.date_of_birth {
            self.warnings = date.calendar_warnings();
        }
        self
    }

    /// The outcome this report describes, for feeding an upload session.
    pub fn outcome(&self) -> ExtractionOutcome {
        match (self.status, &self.date_of_birth) {
            (ExtractionStatus::Found, Some(date)) => ExtractionOutcome::Found(date.clone()),
            (ExtractionStatus::Failed, _) => {
                ExtractionOutcome::Failed(self.error.clone().unwrap_or_default())
            }
            _ => ExtractionOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dob(text: &str) -> DateOfBirth {
        DateOfBirth::parse(text).unwrap()
    }

    #[test]
    fn test_not_found_report() {
        let report = ExtractionReport::from_candidates("a.png", Ok(Vec::new()), 5);

        assert_eq!(report.status, ExtractionStatus::NotFound);
        assert_eq!(report.outcome(), ExtractionOutcome::NotFound);
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let report = ExtractionReport::from_candidates("a.png", Ok(vec![dob("15/08/1995")]), 5);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "found");
        assert_eq!(json["date_of_birth"], "15/08/1995");
        assert!(json.get("error").is_none());
        assert!(json.get("other_candidates").is_none());
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_calendar_warnings_attached() {
        let report = ExtractionReport::from_candidates("a.png", Ok(vec![dob("05-06-1990")]), 5)
            .with_calendar_warnings();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("ambiguous"));
    }

    #[test]
    fn test_failed_outcome_keeps_reason() {
        let report = ExtractionReport::from_candidates(
            "a.png",
            Err(OcrError::Recognition("model crashed".to_string())),
            5,
        );

        assert_eq!(
            report.outcome(),
            ExtractionOutcome::Failed("text recognition failed: model crashed".to_string())
        );
    }

    #[test]
    fn test_failed_report_keeps_given_error() {
        let report = ExtractionReport::failed("gone.png", "failed to read file: not found", 0);

        assert_eq!(report.status, ExtractionStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("failed to read file: not found"));
        assert_eq!(
            report.outcome(),
            ExtractionOutcome::Failed("failed to read file: not found".to_string())
        );
    }
}
