use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum number of tokens carried in an [`ExtractedFields`] record.
pub const MAX_REPORTED_TOKENS: usize = 200;

/// A single recognized word with the backend's confidence score (0–100).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// `None` when the backend reported no measurable score for this word.
    pub confidence: Option<u8>,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: Option<u8>) -> Self {
        Self { text: text.into(), confidence: confidence.map(|c| c.min(100)) }
    }
}

/// The five billing values recovered from a bill. Every value is a run of digits;
/// `None` means "not found", which callers must keep distinct from zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillReadings {
    pub consumer_no: Option<String>,
    pub prev_read: Option<String>,
    pub cur_read: Option<String>,
    pub units: Option<String>,
    pub amount: Option<String>,
}

impl BillReadings {
    /// Fill `units` from `cur_read - prev_read` when it was not read directly.
    /// Non-numeric readings leave `units` untouched.
    pub fn derive_units(&mut self) {
        if self.units.is_some() {
            return;
        }
        if let (Some(prev), Some(cur)) = (&self.prev_read, &self.cur_read) {
            self.units = difference(prev, cur);
        }
    }
}

/// Readings are whole numbers of any length up to `Decimal`'s 28 digits.
fn difference(prev: &str, cur: &str) -> Option<String> {
    let prev = whole_number(prev)?;
    let cur = whole_number(cur)?;
    cur.checked_sub(prev).map(|d| d.to_string())
}

fn whole_number(s: &str) -> Option<Decimal> {
    Decimal::from_str(s.trim()).ok().filter(|d| d.scale() == 0)
}

/// Everything the extraction stage produces for one bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedFields {
    #[serde(flatten)]
    pub readings: BillReadings,
    /// Recognizer output before whitespace collapsing.
    pub raw_text: String,
    /// Leading tokens, capped at [`MAX_REPORTED_TOKENS`].
    pub tokens: Vec<Token>,
    /// Language profile the text was recognized with, e.g. `eng+tam`.
    pub lang_used: String,
}

impl ExtractedFields {
    pub fn new(
        readings: BillReadings,
        raw_text: impl Into<String>,
        tokens: &[Token],
        lang_used: impl Into<String>,
    ) -> Self {
        let keep = tokens.len().min(MAX_REPORTED_TOKENS);
        Self {
            readings,
            raw_text: raw_text.into(),
            tokens: tokens[..keep].to_vec(),
            lang_used: lang_used.into(),
        }
    }
}
