pub mod extract;
pub mod languages;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod tesseract;

pub use extract::{collapse_whitespace, extract_first_after, Extractor};
pub use languages::{LanguageCatalog, ProfileSelector, RecognitionProfile, StaticLanguages, TessdataDir};
pub use pipeline::{BillPipeline, BillReport, PipelineError};
pub use preprocess::{normalize, normalize_path, NormalizedImage, PreprocessError};
pub use recognizer::{recognize, MockRecognizer, OcrBackend, OcrError, RecognitionResult};
pub use tesseract::TesseractCli;
