use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use wattcheck_core::{AnomalyClassifier, AnomalyVerdict, ExtractedFields, WattCheckConfig};

use crate::extract::Extractor;
use crate::languages::{LanguageCatalog, ProfileSelector, RecognitionProfile};
use crate::preprocess::{self, NormalizedImage};
use crate::recognizer::{self, OcrBackend, OcrError, RecognitionResult};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// The result of one bill processing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillReport {
    pub fields: ExtractedFields,
    pub verdict: AnomalyVerdict,
}

/// Orchestrates: normalize → pick language profile → recognize → extract → classify.
/// Holds no per-run state, so one pipeline can serve many threads.
pub struct BillPipeline<R: OcrBackend> {
    recognizer: R,
    catalogs: Vec<Box<dyn LanguageCatalog>>,
    selector: ProfileSelector,
    extractor: Extractor,
    classifier: AnomalyClassifier,
}

impl<R: OcrBackend> BillPipeline<R> {
    pub fn new(recognizer: R, config: &WattCheckConfig) -> Self {
        Self {
            recognizer,
            catalogs: Vec::new(),
            selector: ProfileSelector::new(
                config.recognition.primary_language.clone(),
                config.recognition.secondary_language.clone(),
            ),
            extractor: Extractor::new(&config.keywords),
            classifier: AnomalyClassifier::new(config.anomaly),
        }
    }

    /// Add a language catalog; catalogs are queried in the order added.
    pub fn with_catalog(mut self, catalog: impl LanguageCatalog + 'static) -> Self {
        self.catalogs.push(Box::new(catalog));
        self
    }

    pub fn select_profile(&self) -> RecognitionProfile {
        let catalogs: Vec<&dyn LanguageCatalog> = self.catalogs.iter().map(|c| c.as_ref()).collect();
        self.selector.select(&catalogs)
    }

    /// Process an image file on disk, choosing the language profile automatically.
    pub fn process_file(&self, path: &Path) -> Result<BillReport, PipelineError> {
        self.process_file_with_hint(path, None)
    }

    /// Process an image file, using `lang_hint` (e.g. `eng+tam`) instead of querying
    /// the language catalogs when given.
    pub fn process_file_with_hint(
        &self,
        path: &Path,
        lang_hint: Option<&str>,
    ) -> Result<BillReport, PipelineError> {
        tracing::info!("Processing bill: {}", path.display());
        let image = preprocess::normalize_path(path)?;
        tracing::debug!("Normalized image: {}x{}", image.width(), image.height());

        let profile = match lang_hint.and_then(RecognitionProfile::parse) {
            Some(p) => p,
            None => self.select_profile(),
        };
        Ok(self.process_image(&image, profile)?)
    }

    /// Recognize, extract and classify an already-normalized image.
    pub fn process_image(
        &self,
        image: &NormalizedImage,
        profile: RecognitionProfile,
    ) -> Result<BillReport, OcrError> {
        let (recognition, profile) = self.recognize_with_retry(image, profile)?;

        let readings = self.extractor.extract(&recognition.flattened_text);
        let verdict = self.classifier.classify_units(readings.units.as_deref());
        tracing::info!(
            "Extracted consumer_no={:?} units={:?} -> {}",
            readings.consumer_no,
            readings.units,
            verdict.reason
        );

        let fields = ExtractedFields::new(
            readings,
            recognition.flattened_text,
            &recognition.tokens,
            profile.code(),
        );
        Ok(BillReport { fields, verdict })
    }

    /// A failed run is retried once with the configured primary language alone,
    /// unless that is what just failed.
    fn recognize_with_retry(
        &self,
        image: &NormalizedImage,
        profile: RecognitionProfile,
    ) -> Result<(RecognitionResult, RecognitionProfile), OcrError> {
        let fallback = self.selector.primary_only();
        match recognizer::recognize(&self.recognizer, image, &profile) {
            Ok(result) => Ok((result, profile)),
            Err(e) if profile != fallback => {
                tracing::warn!("Recognition with '{profile}' failed ({e}); retrying with '{fallback}'");
                let result = recognizer::recognize(&self.recognizer, image, &fallback)?;
                Ok((result, fallback))
            }
            Err(e) => Err(e),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
