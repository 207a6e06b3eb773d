use std::sync::OnceLock;

use regex::Regex;
use wattcheck_core::{BillReadings, FieldKeywords};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_consumer_label,
    r"(?i)(consumer(?:\s*no| no| number|\.no|:)?)[\s:]*([0-9]{6,14})");
re!(re_long_digit_run,
    r"\b([0-9]{8,14})\b");

/// How far past a keyword a value may start.
const MAX_GAP_CHARS: usize = 80;

/// One rule in a field's ordered fallback chain.
type Rule = fn(&str) -> Option<String>;

/// Labelled consumer number first, then any free-standing 8–14 digit run. The
/// fallback can pick up phone numbers or dates on bills without a label.
const CONSUMER_NO_RULES: [Rule; 2] = [labelled_consumer_no, free_standing_digit_run];

fn labelled_consumer_no(text: &str) -> Option<String> {
    let c = re_consumer_label().captures(text)?;
    Some(c.get(2)?.as_str().to_string())
}

fn free_standing_digit_run(text: &str) -> Option<String> {
    let c = re_long_digit_run().captures(text)?;
    Some(c.get(1)?.as_str().to_string())
}

/// A label keyword compiled into "keyword, up to 80 chars, digit run".
struct KeywordRule {
    pattern: Regex,
}

impl KeywordRule {
    fn new(keyword: &str) -> Self {
        let pat = format!(
            r"(?i){}.{{0,{MAX_GAP_CHARS}}}?([0-9]{{1,10}}[0-9,]*)",
            regex::escape(keyword)
        );
        // An escaped literal plus a fixed suffix always compiles.
        let pattern = Regex::new(&pat).expect("invalid keyword regex");
        Self { pattern }
    }

    fn find(&self, text: &str) -> Option<String> {
        let c = self.pattern.captures(text)?;
        Some(c.get(1)?.as_str().replace(',', ""))
    }
}

fn compile(keywords: &[String]) -> Vec<KeywordRule> {
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| KeywordRule::new(k))
        .collect()
}

/// The first keyword in list order that matches decides the value; later keywords
/// are never consulted, even if they occur earlier in the text.
fn first_after(text: &str, rules: &[KeywordRule]) -> Option<String> {
    rules.iter().find_map(|r| r.find(text))
}

/// Search `text` for each keyword in order and return the digits following the first
/// one found, with thousands separators removed.
pub fn extract_first_after(text: &str, keywords: &[&str]) -> Option<String> {
    keywords.iter().find_map(|k| KeywordRule::new(k).find(text))
}

/// Collapse all whitespace runs (including line breaks) to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor {
    previous: Vec<KeywordRule>,
    current: Vec<KeywordRule>,
    units: Vec<KeywordRule>,
    amount: Vec<KeywordRule>,
}

impl Extractor {
    pub fn new(keywords: &FieldKeywords) -> Self {
        Self {
            previous: compile(&keywords.previous),
            current: compile(&keywords.current),
            units: compile(&keywords.units),
            amount: compile(&keywords.amount),
        }
    }

    /// Extract billing fields from recognized text. Never fails; anything not found
    /// is `None`.
    pub fn extract(&self, ocr_text: &str) -> BillReadings {
        let text = collapse_whitespace(ocr_text);

        let mut readings = BillReadings {
            consumer_no: CONSUMER_NO_RULES.iter().find_map(|rule| rule(&text)),
            prev_read: first_after(&text, &self.previous),
            cur_read: first_after(&text, &self.current),
            units: first_after(&text, &self.units),
            amount: first_after(&text, &self.amount),
        };
        readings.derive_units();
        readings
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&FieldKeywords::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
