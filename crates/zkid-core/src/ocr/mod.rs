//! OCR collaborator seam and the native engine.

#[cfg(feature = "native")]
mod engine;
mod preprocessing;

#[cfg(feature = "native")]
pub use engine::OnnxOcrEngine;
pub use preprocessing::ImagePreprocessor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Language the extractor requests when none is configured.
///
/// Names the recognition model set: `latin_rec.onnx` and `latin_dict.txt`.
pub const DEFAULT_LANGUAGE: &str = "latin";

/// Anything that can turn image bytes into recognized text.
///
/// Recognition may suspend for an unbounded time; callers impose no deadline.
#[async_trait]
pub trait OcrCollaborator: Send + Sync {
    /// Recognize text in `image` using the model for `language`.
    async fn recognize(&self, image: &[u8], language: &str) -> Result<RecognizedText, OcrError>;
}

/// A recognized text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Raw output of one recognition call.
///
/// Owned by the call that produced it and dropped once the date has been
/// pulled out of `text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedText {
    /// Full text (boxes joined with newlines).
    pub text: String,

    /// Recognized text boxes, empty when the collaborator only reports text.
    pub boxes: Vec<TextBox>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height) as seen by the engine.
    pub image_size: Option<(u32, u32)>,
}

impl RecognizedText {
    /// Wrap plain text from a collaborator that reports no layout.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Build a result from boxes, ordering them for reading and joining their text.
    pub fn from_boxes(boxes: Vec<TextBox>, image_size: (u32, u32), processing_time_ms: u64) -> Self {
        let mut result = Self {
            text: String::new(),
            boxes,
            processing_time_ms,
            image_size: Some(image_size),
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (ax, ay, _, _) = a.rect();
            let (bx, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.text = self
            .boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order_rows_then_columns() {
        let boxes = vec![
            text_box("15/08/1995", 120.0, 42.0),
            text_box("NAME", 10.0, 2.0),
            text_box("DOB", 10.0, 45.0),
            text_box("DOE JANE", 120.0, 5.0),
        ];

        let result = RecognizedText::from_boxes(boxes, (640, 480), 12);

        assert_eq!(result.text, "NAME\nDOE JANE\nDOB\n15/08/1995");
        assert_eq!(result.image_size, Some((640, 480)));
    }

    #[test]
    fn test_from_text_has_no_boxes() {
        let result = RecognizedText::from_text("DOB 01-02-1990");
        assert!(result.boxes.is_empty());
        assert_eq!(result.image_size, None);
    }
}
