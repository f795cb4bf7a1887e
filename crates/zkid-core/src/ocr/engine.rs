//! Native OCR engine backed by `pure-onnx-ocr` (PaddleOCR ONNX models, pure Rust).

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{ImagePreprocessor, OcrCollaborator, RecognizedText, TextBox};

/// OCR engine loaded for exactly one recognition language.
///
/// Cheap to clone; clones share the loaded models.
#[derive(Clone)]
pub struct OnnxOcrEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    engine: pure_onnx_ocr::engine::OcrEngine,
    language: String,
    preprocessor: ImagePreprocessor,
    config: OcrConfig,
}

impl OnnxOcrEngine {
    /// Create an engine from model files in a directory.
    ///
    /// Expects the detection model plus `<language>_rec.onnx` and
    /// `<language>_dict.txt` for the configured language.
    pub fn from_dir(
        model_dir: &Path,
        models: &ModelConfig,
        config: OcrConfig,
    ) -> Result<Self, OcrError> {
        let det_path = model_dir.join(&models.detection_model);
        let rec_path = model_dir.join(models.recognition_model(&config.language));
        let dict_path = model_dir.join(models.dictionary(&config.language));

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "missing model file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded '{}' OCR models from {}",
            config.language,
            model_dir.display()
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                engine,
                language: config.language.clone(),
                preprocessor: ImagePreprocessor::new().with_max_size(config.max_image_size),
                config,
            }),
        })
    }

    /// Language the loaded recognition model covers.
    pub fn language(&self) -> &str {
        &self.inner.language
    }

    /// Recognize text in a decoded image on the current thread.
    pub fn process(&self, image: &DynamicImage) -> Result<RecognizedText, OcrError> {
        self.inner.process(image)
    }
}

impl EngineInner {
    fn process(&self, image: &DynamicImage) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Processing image: {}x{}", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let boxes: Vec<TextBox> = results
            .iter()
            .filter(|r| r.confidence >= self.config.recognition_threshold)
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        let result =
            RecognizedText::from_boxes(boxes, (width, height), start.elapsed().as_millis() as u64);

        info!(
            "OCR complete: {} text boxes in {}ms",
            result.boxes.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

#[async_trait]
impl OcrCollaborator for OnnxOcrEngine {
    async fn recognize(&self, image: &[u8], language: &str) -> Result<RecognizedText, OcrError> {
        if language != self.inner.language {
            return Err(OcrError::UnsupportedLanguage {
                requested: language.to_string(),
                loaded: self.inner.language.clone(),
            });
        }

        let inner = Arc::clone(&self.inner);
        let bytes = image.to_vec();

        tokio::task::spawn_blocking(move || {
            let image = inner.preprocessor.prepare(&bytes)?;
            inner.process(&image)
        })
        .await
        .map_err(|e| OcrError::Task(e.to_string()))?
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
