use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::recognizer::OcrError;

/// Ordered language codes requested from the recognizer, e.g. `eng` then `tam`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecognitionProfile {
    languages: Vec<String>,
}

impl RecognitionProfile {
    pub fn single(language: impl Into<String>) -> Self {
        Self { languages: vec![language.into()] }
    }

    pub fn combined(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self { languages: vec![primary.into(), secondary.into()] }
    }

    /// Parse a `+`-joined code such as `eng+tam`. Empty segments are ignored.
    pub fn parse(code: &str) -> Option<Self> {
        let languages: Vec<String> = code
            .split('+')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if languages.is_empty() {
            None
        } else {
            Some(Self { languages })
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn primary(&self) -> &str {
        &self.languages[0]
    }

    pub fn is_single(&self) -> bool {
        self.languages.len() == 1
    }

    /// The `-l` argument form: codes joined with `+`.
    pub fn code(&self) -> String {
        self.languages.join("+")
    }
}

impl std::fmt::Display for RecognitionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

/// Anything that can report which language packs are installed.
pub trait LanguageCatalog: Send + Sync {
    fn installed_languages(&self) -> Result<Vec<String>, OcrError>;
}

/// A fixed list, for embedding applications that already know what is installed.
#[derive(Debug, Clone, Default)]
pub struct StaticLanguages(pub Vec<String>);

impl StaticLanguages {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(languages.into_iter().map(Into::into).collect())
    }
}

impl LanguageCatalog for StaticLanguages {
    fn installed_languages(&self) -> Result<Vec<String>, OcrError> {
        Ok(self.0.clone())
    }
}

/// Lists `<code>.traineddata` files in a tessdata directory.
#[derive(Debug, Clone)]
pub struct TessdataDir {
    dir: PathBuf,
}

impl TessdataDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory named by `TESSDATA_PREFIX`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var_os("TESSDATA_PREFIX").map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LanguageCatalog for TessdataDir {
    fn installed_languages(&self) -> Result<Vec<String>, OcrError> {
        let mut langs = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("traineddata") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                langs.push(stem.to_string());
            }
        }
        langs.sort();
        Ok(langs)
    }
}

/// Picks the richest profile the installed packs allow.
#[derive(Debug, Clone)]
pub struct ProfileSelector {
    primary: String,
    secondary: String,
}

impl ProfileSelector {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self { primary: primary.into(), secondary: secondary.into() }
    }

    pub fn primary_only(&self) -> RecognitionProfile {
        RecognitionProfile::single(self.primary.clone())
    }

    /// Ask each catalog in turn until one answers. Both packs installed gives the
    /// combined profile; anything else, including every catalog failing, gives the
    /// primary-only profile.
    pub fn select(&self, catalogs: &[&dyn LanguageCatalog]) -> RecognitionProfile {
        let installed = catalogs.iter().find_map(|catalog| match catalog.installed_languages() {
            Ok(langs) => Some(langs),
            Err(e) => {
                tracing::debug!("Language catalog query failed: {e}");
                None
            }
        });

        let Some(installed) = installed else {
            tracing::warn!(
                "No language catalog answered; defaulting to '{}'",
                self.primary
            );
            return self.primary_only();
        };

        let has = |code: &str| installed.iter().any(|l| l == code);
        if has(&self.primary) && has(&self.secondary) {
            RecognitionProfile::combined(self.primary.clone(), self.secondary.clone())
        } else {
            self.primary_only()
        }
    }
}
