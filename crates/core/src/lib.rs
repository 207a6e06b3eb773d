pub mod anomaly;
pub mod appliance;
pub mod config;
pub mod fields;
pub mod summary;

pub use anomaly::{detect_anomaly, AnomalyClassifier, AnomalyConfig, AnomalyReason, AnomalyVerdict};
pub use appliance::{format_appliance_percentages, ApplianceShare};
pub use config::{ConfigError, FieldKeywords, RecognitionConfig, WattCheckConfig};
pub use fields::{BillReadings, ExtractedFields, Token, MAX_REPORTED_TOKENS};
pub use summary::render_summary;
