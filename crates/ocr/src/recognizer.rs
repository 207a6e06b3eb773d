use serde::{Deserialize, Serialize};
use thiserror::Error;
use wattcheck_core::Token;

use crate::languages::RecognitionProfile;
use crate::preprocess::NormalizedImage;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR engine not available")]
    NotAvailable,
    #[error("Recognition failed (token mode: {token_error}; text mode: {text_error})")]
    RecognitionFailed {
        token_error: String,
        text_error: String,
    },
}

impl From<crate::preprocess::PreprocessError> for OcrError {
    fn from(e: crate::preprocess::PreprocessError) -> Self {
        OcrError::ImageEncode(e.to_string())
    }
}

/// Abstraction over a text-recognition backend.
pub trait OcrBackend: Send + Sync {
    /// Word-level output in reading order, with per-word confidence.
    fn recognize_tokens(
        &self,
        image: &NormalizedImage,
        profile: &RecognitionProfile,
    ) -> Result<Vec<Token>, OcrError>;

    /// Whole-page text, used when word-level output is unavailable.
    fn recognize_text(
        &self,
        image: &NormalizedImage,
        profile: &RecognitionProfile,
    ) -> Result<String, OcrError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecognitionResult {
    /// Kept token texts joined by single spaces, or the whole-text fallback output.
    pub flattened_text: String,
    /// Empty when the whole-text fallback was used.
    pub tokens: Vec<Token>,
}

impl RecognitionResult {
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let kept: Vec<Token> = tokens
            .into_iter()
            .filter_map(|t| {
                let text = t.text.trim();
                (!text.is_empty()).then(|| Token::new(text, t.confidence))
            })
            .collect();
        let flattened_text = kept.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ");
        Self { flattened_text, tokens: kept }
    }

    pub fn from_text(text: String) -> Self {
        Self { flattened_text: text, tokens: Vec::new() }
    }
}

/// Token mode first; any failure there falls back to whole-text mode with the same
/// profile. Only when both fail is [`OcrError::RecognitionFailed`] returned.
pub fn recognize<R: OcrBackend + ?Sized>(
    backend: &R,
    image: &NormalizedImage,
    profile: &RecognitionProfile,
) -> Result<RecognitionResult, OcrError> {
    let token_error = match backend.recognize_tokens(image, profile) {
        Ok(tokens) => return Ok(RecognitionResult::from_tokens(tokens)),
        Err(e) => e,
    };
    tracing::warn!("Token recognition failed for '{profile}', falling back to plain text: {token_error}");

    match backend.recognize_text(image, profile) {
        Ok(text) => Ok(RecognitionResult::from_text(text)),
        Err(text_error) => Err(OcrError::RecognitionFailed {
            token_error: token_error.to_string(),
            text_error: text_error.to_string(),
        }),
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, split into tokens or whole, so the extraction pipeline
/// can be exercised without Tesseract installed.
pub struct MockRecognizer {
    pub text: String,
    /// When false, token mode errors and callers must fall back to whole text.
    pub token_mode: bool,
    /// Confidence attached to every mock token.
    pub confidence: Option<u8>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), token_mode: true, confidence: Some(90) }
    }

    pub fn text_only(text: impl Into<String>) -> Self {
        Self { token_mode: false, ..Self::new(text) }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize_tokens(
        &self,
        _image: &NormalizedImage,
        _profile: &RecognitionProfile,
    ) -> Result<Vec<Token>, OcrError> {
        if !self.token_mode {
            return Err(OcrError::Engine("token output disabled".into()));
        }
        Ok(self
            .text
            .split_whitespace()
            .map(|w| Token::new(w, self.confidence))
            .collect())
    }

    fn recognize_text(
        &self,
        _image: &NormalizedImage,
        _profile: &RecognitionProfile,
    ) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::normalize;
    use image::{DynamicImage, GrayImage};

    fn blank() -> NormalizedImage {
        normalize(DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, image::Luma([255]))))
    }

    fn eng() -> RecognitionProfile {
        RecognitionProfile::single("eng")
    }

    struct Broken;

    impl OcrBackend for Broken {
        fn recognize_tokens(&self, _: &NormalizedImage, _: &RecognitionProfile) -> Result<Vec<Token>, OcrError> {
            Err(OcrError::Engine("no tsv".into()))
        }
        fn recognize_text(&self, _: &NormalizedImage, _: &RecognitionProfile) -> Result<String, OcrError> {
            Err(OcrError::Engine("no text".into()))
        }
    }

    struct FixedTokens(Vec<Token>);

    impl OcrBackend for FixedTokens {
        fn recognize_tokens(&self, _: &NormalizedImage, _: &RecognitionProfile) -> Result<Vec<Token>, OcrError> {
            Ok(self.0.clone())
        }
        fn recognize_text(&self, _: &NormalizedImage, _: &RecognitionProfile) -> Result<String, OcrError> {
            Ok("whole page text".into())
        }
    }

    #[test]
    fn token_mode_flattens_with_single_spaces() {
        let r = recognize(&MockRecognizer::new("Consumer  No\n 123456789"), &blank(), &eng()).unwrap();
        assert_eq!(r.flattened_text, "Consumer No 123456789");
        assert_eq!(r.tokens.len(), 3);
        assert_eq!(r.tokens[0].confidence, Some(90));
    }

    #[test]
    fn blank_tokens_are_dropped_and_trimmed() {
        let backend = FixedTokens(vec![
            Token::new("  Units ", Some(88)),
            Token::new("   ", Some(95)),
            Token::new("", None),
            Token::new("620", None),
        ]);
        let r = recognize(&backend, &blank(), &eng()).unwrap();
        assert_eq!(r.flattened_text, "Units 620");
        assert_eq!(r.tokens, vec![Token::new("Units", Some(88)), Token::new("620", None)]);
    }

    #[test]
    fn falls_back_to_plain_text() {
        let r = recognize(&MockRecognizer::text_only("Units\n620"), &blank(), &eng()).unwrap();
        assert_eq!(r.flattened_text, "Units\n620");
        assert!(r.tokens.is_empty());
    }

    #[test]
    fn both_modes_failing_is_recognition_failed() {
        let err = recognize(&Broken, &blank(), &eng()).unwrap_err();
        match err {
            OcrError::RecognitionFailed { token_error, text_error } => {
                assert!(token_error.contains("no tsv"));
                assert!(text_error.contains("no text"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new("hello");
        assert_eq!(r.recognize_text(&blank(), &eng()).unwrap(), "hello");
    }
}
