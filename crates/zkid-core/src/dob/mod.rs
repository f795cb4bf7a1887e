//! Date-of-birth extraction from ID images.

mod date;
mod pattern;

pub use date::{CalendarReading, DateOfBirth, DateOrder};
pub use pattern::{find_all_dates, find_date_of_birth, DOB_PATTERN};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::report::ExtractionReport;
use crate::ocr::{OcrCollaborator, DEFAULT_LANGUAGE};

/// What one extraction attempt produced.
///
/// Keeps "no date in the text" and "recognition failed" apart, even though the
/// shell shows both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// A date-like substring was found.
    Found(DateOfBirth),
    /// Recognition succeeded but no substring matched.
    NotFound,
    /// The OCR collaborator failed.
    Failed(String),
}

impl ExtractionOutcome {
    /// The extracted date, if any.
    pub fn date(&self) -> Option<&DateOfBirth> {
        match self {
            Self::Found(date) => Some(date),
            _ => None,
        }
    }

    /// Collapse to the externally visible form.
    pub fn into_date(self) -> Option<DateOfBirth> {
        match self {
            Self::Found(date) => Some(date),
            _ => None,
        }
    }
}

impl From<Result<Option<DateOfBirth>, OcrError>> for ExtractionOutcome {
    fn from(result: Result<Option<DateOfBirth>, OcrError>) -> Self {
        match result {
            Ok(Some(date)) => Self::Found(date),
            Ok(None) => Self::NotFound,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Runs an OCR collaborator over an image and pulls out the first date.
///
/// The image bytes are only borrowed. Each call recognizes once; nothing is
/// cached between calls.
pub struct DobExtractor<O> {
    ocr: O,
    language: String,
}

impl<O: OcrCollaborator> DobExtractor<O> {
    /// Create an extractor requesting the default language.
    pub fn new(ocr: O) -> Self {
        Self {
            ocr,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Set the language passed to the collaborator.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn collaborator(&self) -> &O {
        &self.ocr
    }

    async fn recognize_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let recognized = self.ocr.recognize(image, &self.language).await?;
        debug!(
            "Recognized {} characters in {} boxes",
            recognized.text.chars().count(),
            recognized.boxes.len()
        );
        Ok(recognized.text)
    }

    /// Extract the first date, reporting OCR failures as errors.
    pub async fn try_extract(&self, image: &[u8]) -> Result<Option<DateOfBirth>, OcrError> {
        let text = self.recognize_text(image).await?;
        Ok(find_date_of_birth(&text))
    }

    /// Extract the first date; any OCR failure becomes `None`.
    ///
    /// The failure is only visible in the log.
    pub async fn extract(&self, image: &[u8]) -> Option<DateOfBirth> {
        match self.try_extract(image).await {
            Ok(date) => date,
            Err(e) => {
                warn!("OCR error: {}", e);
                None
            }
        }
    }

    /// Extract the first date as an [`ExtractionOutcome`].
    pub async fn outcome(&self, image: &[u8]) -> ExtractionOutcome {
        let result = self.try_extract(image).await;
        if let Err(ref e) = result {
            warn!("OCR error: {}", e);
        }
        result.into()
    }

    /// Extract and describe the attempt, including any later date-like candidates.
    pub async fn extract_report(&self, source: impl Into<String>, image: &[u8]) -> ExtractionReport {
        let source = source.into();
        let start = Instant::now();

        let candidates = self
            .recognize_text(image)
            .await
            .map(|text| find_all_dates(&text));

        if let Err(ref e) = candidates {
            warn!("OCR error for {}: {}", source, e);
        }

        ExtractionReport::from_candidates(source, candidates, start.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ExtractionStatus;
    use crate::ocr::RecognizedText;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Returns the same text for every image and records requested languages.
    struct FixedText {
        text: String,
        languages: Mutex<Vec<String>>,
    }

    impl FixedText {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                languages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OcrCollaborator for FixedText {
        async fn recognize(&self, _image: &[u8], language: &str) -> Result<RecognizedText, OcrError> {
            self.languages.lock().unwrap().push(language.to_string());
            Ok(RecognizedText::from_text(self.text.clone()))
        }
    }

    struct Broken;

    #[async_trait]
    impl OcrCollaborator for Broken {
        async fn recognize(&self, _image: &[u8], _language: &str) -> Result<RecognizedText, OcrError> {
            Err(OcrError::InvalidImage("corrupt header".to_string()))
        }
    }

    const IMAGE: &[u8] = b"\x89PNG fake";

    #[tokio::test]
    async fn test_extract_found() {
        let extractor = DobExtractor::new(FixedText::new("JANE DOE\nDOB: 15/08/1995\n"));

        let date = extractor.extract(IMAGE).await;
        assert_eq!(date.map(String::from), Some("15/08/1995".to_string()));
    }

    #[tokio::test]
    async fn test_extract_not_found() {
        let extractor = DobExtractor::new(FixedText::new("NO DATES HERE"));

        assert_eq!(extractor.extract(IMAGE).await, None);
        assert_eq!(extractor.try_extract(IMAGE).await, Ok(None));
        assert_eq!(extractor.outcome(IMAGE).await, ExtractionOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_ocr_failure_is_swallowed_but_distinguishable() {
        let extractor = DobExtractor::new(Broken);

        assert_eq!(extractor.extract(IMAGE).await, None);
        assert!(matches!(
            extractor.try_extract(IMAGE).await,
            Err(OcrError::InvalidImage(_))
        ));
        assert!(matches!(
            extractor.outcome(IMAGE).await,
            ExtractionOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let extractor = DobExtractor::new(FixedText::new("ID# 12-34-5678 DOB 05-06-1990"));

        let date = extractor.extract(IMAGE).await.unwrap();
        assert_eq!(date.as_str(), "12-34-5678");
    }

    #[tokio::test]
    async fn test_language_is_fixed_per_extractor() {
        let extractor = DobExtractor::new(FixedText::new("")).with_language("eng");

        extractor.extract(IMAGE).await;
        extractor.extract(IMAGE).await;

        assert_eq!(
            *extractor.collaborator().languages.lock().unwrap(),
            vec!["eng".to_string(), "eng".to_string()]
        );
    }

    #[tokio::test]
    async fn test_input_image_untouched() {
        let image = IMAGE.to_vec();
        let extractor = DobExtractor::new(FixedText::new("01/02/1990"));

        extractor.extract(&image).await;
        assert_eq!(image, IMAGE);
    }

    #[tokio::test]
    async fn test_report_lists_other_candidates() {
        let extractor = DobExtractor::new(FixedText::new("ID# 12-34-5678 DOB 05-06-1990"));

        let report = extractor.extract_report("id.png", IMAGE).await;

        assert_eq!(report.source, "id.png");
        assert_eq!(report.status, ExtractionStatus::Found);
        assert_eq!(report.date_of_birth.as_ref().map(|d| d.as_str()), Some("12-34-5678"));
        assert_eq!(report.other_candidates.len(), 1);
        assert_eq!(report.other_candidates[0].as_str(), "05-06-1990");
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_report_for_failure() {
        let extractor = DobExtractor::new(Broken);

        let report = extractor.extract_report("broken.jpg", IMAGE).await;

        assert_eq!(report.status, ExtractionStatus::Failed);
        assert!(report.date_of_birth.is_none());
        assert!(report.error.unwrap().contains("corrupt header"));
    }
}
