use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::anomaly::AnomalyConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration. Every section falls back to its defaults, so an empty
/// file is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WattCheckConfig {
    pub anomaly: AnomalyConfig,
    pub recognition: RecognitionConfig,
    pub keywords: FieldKeywords,
}

impl WattCheckConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Language that is always requested, e.g. `eng`.
    pub primary_language: String,
    /// Added to the profile only when its pack is installed, e.g. `tam`.
    pub secondary_language: String,
    /// Name or path of the `tesseract` executable.
    pub tesseract_cmd: String,
    /// Directory holding `*.traineddata` files, consulted when `--list-langs` fails.
    pub tessdata_dir: Option<PathBuf>,
    /// `--oem` value.
    pub engine_mode: u8,
    /// `--psm` value.
    pub page_seg_mode: u8,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            primary_language: "eng".to_string(),
            secondary_language: "tam".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            tessdata_dir: None,
            engine_mode: 3,
            page_seg_mode: 6,
        }
    }
}

/// Label keywords per field, highest priority first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldKeywords {
    pub previous: Vec<String>,
    pub current: Vec<String>,
    pub units: Vec<String>,
    pub amount: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for FieldKeywords {
    fn default() -> Self {
        Self {
            previous: owned(&["previous reading", "previous", "prev read", "prev"]),
            current: owned(&[
                "present reading",
                "present",
                "current reading",
                "cur read",
                "present read",
            ]),
            units: owned(&[
                "units consumed",
                "units",
                "units billed",
                "kwh",
                "units this period",
                "consumption",
            ]),
            amount: owned(&[
                "total amount",
                "amount to be paid",
                "net amount",
                "amount",
                "total payable",
                "total",
            ]),
        }
    }
}
