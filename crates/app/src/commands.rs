use anyhow::Context;
use std::path::{Path, PathBuf};
use wattcheck_core::WattCheckConfig;
use wattcheck_ocr::{BillPipeline, BillReport, TessdataDir, TesseractCli};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "WATTCHECK_CONFIG";

/// `$WATTCHECK_CONFIG` if set, else `config.toml` in the platform config directory.
pub fn config_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    directories::ProjectDirs::from("com", "wattcheck", "WattCheck")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the config at `path`. A missing default file means defaults; a file named
/// explicitly through the environment must exist.
pub fn load_config(path: Option<&Path>, explicit: bool) -> anyhow::Result<WattCheckConfig> {
    match path {
        Some(p) if explicit || p.exists() => {
            tracing::info!("Loading config: {}", p.display());
            WattCheckConfig::load(p).with_context(|| format!("Failed to load config {}", p.display()))
        }
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(WattCheckConfig::default())
        }
    }
}

/// Build the tesseract-backed pipeline: `--list-langs` first, then the tessdata
/// directory (configured, else `$TESSDATA_PREFIX`) when listing fails.
pub fn build_pipeline(config: &WattCheckConfig) -> BillPipeline<TesseractCli> {
    let tesseract = TesseractCli::new(&config.recognition);
    let mut pipeline = BillPipeline::new(tesseract.clone(), config).with_catalog(tesseract);
    let tessdata = config
        .recognition
        .tessdata_dir
        .clone()
        .map(TessdataDir::new)
        .or_else(TessdataDir::from_env);
    if let Some(dir) = tessdata {
        pipeline = pipeline.with_catalog(dir);
    }
    pipeline
}

/// Run one bill image through the pipeline and render the report as JSON.
pub fn scan_bill(path: &Path, config: &WattCheckConfig) -> anyhow::Result<String> {
    let report: BillReport = build_pipeline(config)
        .process_file(path)
        .with_context(|| format!("Failed to process bill {}", path.display()))?;
    serde_json::to_string_pretty(&report).context("Failed to serialize report")
}
