//! Backend that shells out to the `tesseract` command-line tool.

use std::io::Write;
use std::process::{Command, Output};

use wattcheck_core::{RecognitionConfig, Token};

use crate::languages::{LanguageCatalog, RecognitionProfile};
use crate::preprocess::NormalizedImage;
use crate::recognizer::{OcrBackend, OcrError};

/// TSV column holding the word confidence (`-1` for non-word rows).
const TSV_CONF_COL: usize = 10;
const TSV_TEXT_COL: usize = 11;

#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    engine_mode: u8,
    page_seg_mode: u8,
}

impl TesseractCli {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            engine_mode: config.engine_mode,
            page_seg_mode: config.page_seg_mode,
        }
    }

    /// Write the image to a temporary PNG and run tesseract on it. The temp file is
    /// removed when this returns, whatever the outcome.
    fn run(
        &self,
        image: &NormalizedImage,
        profile: &RecognitionProfile,
        output_format: Option<&str>,
    ) -> Result<String, OcrError> {
        let png = image.to_png()?;
        let mut tmp = tempfile::Builder::new().prefix("wattcheck").suffix(".png").tempfile()?;
        tmp.write_all(&png)?;
        tmp.flush()?;

        let mut cmd = Command::new(&self.command);
        cmd.arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(profile.code())
            .arg("--oem")
            .arg(self.engine_mode.to_string())
            .arg("--psm")
            .arg(self.page_seg_mode.to_string());
        if let Some(format) = output_format {
            cmd.arg(format);
        }
        tracing::debug!("Running {:?}", cmd);
        let output = cmd.output().map_err(|e| spawn_error(&self.command, e))?;
        check_status(&self.command, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrBackend for TesseractCli {
    fn recognize_tokens(
        &self,
        image: &NormalizedImage,
        profile: &RecognitionProfile,
    ) -> Result<Vec<Token>, OcrError> {
        let tsv = self.run(image, profile, Some("tsv"))?;
        parse_tsv_tokens(&tsv)
    }

    fn recognize_text(
        &self,
        image: &NormalizedImage,
        profile: &RecognitionProfile,
    ) -> Result<String, OcrError> {
        self.run(image, profile, None)
    }
}

impl LanguageCatalog for TesseractCli {
    fn installed_languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .map_err(|e| spawn_error(&self.command, e))?;
        check_status(&self.command, &output)?;
        Ok(parse_lang_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn spawn_error(command: &str, e: std::io::Error) -> OcrError {
    if e.kind() == std::io::ErrorKind::NotFound {
        OcrError::NotAvailable
    } else {
        OcrError::Engine(format!("failed to run {command}: {e}"))
    }
}

fn check_status(command: &str, output: &Output) -> Result<(), OcrError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(OcrError::Engine(format!("{command} exited with {}: {}", output.status, stderr.trim())))
}

/// `--list-langs` prints a header line ("List of available languages ...") and then
/// one code per line.
fn parse_lang_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.to_lowercase().starts_with("list"))
        .map(String::from)
        .collect()
}

/// Word tokens from tesseract TSV output, in row order. Rows whose text is blank are
/// skipped; a negative or unparseable confidence is recorded as `None`.
pub fn parse_tsv_tokens(tsv: &str) -> Result<Vec<Token>, OcrError> {
    let mut lines = tsv.lines();
    match lines.next() {
        Some(header) if header.starts_with("level") => {}
        _ => return Err(OcrError::Engine("tesseract TSV output has no header".into())),
    }

    let mut tokens = Vec::new();
    for row in lines {
        let cols: Vec<&str> = row.split('\t').collect();
        let Some(text) = cols.get(TSV_TEXT_COL).map(|t| t.trim()) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        let confidence = cols.get(TSV_CONF_COL).and_then(|c| parse_confidence(c));
        tokens.push(Token::new(text, confidence));
    }
    Ok(tokens)
}

fn parse_confidence(raw: &str) -> Option<u8> {
    let conf: f64 = raw.trim().parse().ok()?;
    if !conf.is_finite() || conf < 0.0 {
        None
    } else {
        Some(conf.min(100.0) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t800\t600\t-1\t
2\t1\t1\t0\t0\t0\t10\t10\t300\t40\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t90\t20\t96.541\tConsumer
5\t1\t1\t1\t1\t2\t110\t10\t40\t20\t91\tNo:
5\t1\t1\t1\t1\t3\t160\t10\t120\t20\t-1\t01234567890
5\t1\t1\t1\t1\t4\t290\t10\t10\t20\t12\t
5\t1\t1\t1\t2\t1\t10\t40\t60\t20\tabc\tUnits";

    #[test]
    fn tsv_rows_become_tokens() {
        let tokens = parse_tsv_tokens(TSV).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new("Consumer", Some(96)),
                Token::new("No:", Some(91)),
                Token::new("01234567890", None),
                Token::new("Units", None),
            ]
        );
    }

    #[test]
    fn tsv_without_header_is_an_error() {
        assert!(parse_tsv_tokens("").is_err());
        assert!(parse_tsv_tokens("garbage\nrows").is_err());
    }

    #[test]
    fn header_only_tsv_has_no_tokens() {
        assert!(parse_tsv_tokens("level\tpage_num\n").unwrap().is_empty());
    }

    #[test]
    fn confidence_parsing() {
        assert_eq!(parse_confidence("0"), Some(0));
        assert_eq!(parse_confidence("100.0"), Some(100));
        assert_eq!(parse_confidence("-1"), None);
        assert_eq!(parse_confidence(""), None);
        assert_eq!(parse_confidence("NaN"), None);
    }

    #[test]
    fn lang_list_skips_header() {
        let out = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\ntam\n";
        assert_eq!(parse_lang_list(out), vec!["eng", "osd", "tam"]);
    }

    #[test]
    fn missing_binary_is_not_available() {
        let cli = TesseractCli::new(&RecognitionConfig {
            tesseract_cmd: "wattcheck-no-such-tesseract".into(),
            ..Default::default()
        });
        assert!(matches!(cli.installed_languages(), Err(OcrError::NotAvailable)));
    }
}
