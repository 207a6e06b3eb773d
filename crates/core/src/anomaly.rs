use serde::{Deserialize, Serialize};

/// Reference monthly consumption (kWh) used when nothing else is configured.
pub const DEFAULT_BASELINE_KWH: f64 = 200.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyReason {
    ZeroReadingDetected,
    SpikeDetectedPossibleAcOrCumulative,
    ExtremelyLargeReadingPossibleCumulativeOrDataError,
    NoMajorAnomaly,
    UnitsNotParsed,
}

impl AnomalyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyReason::ZeroReadingDetected => "zero-reading-detected",
            AnomalyReason::SpikeDetectedPossibleAcOrCumulative => {
                "spike-detected-possible-ac-or-cumulative"
            }
            AnomalyReason::ExtremelyLargeReadingPossibleCumulativeOrDataError => {
                "extremely-large-reading-possible-cumulative-or-data-error"
            }
            AnomalyReason::NoMajorAnomaly => "no-major-anomaly",
            AnomalyReason::UnitsNotParsed => "units-not-parsed",
        }
    }

    /// One-sentence explanation suitable for a complaint letter or narration.
    pub fn describe(self) -> &'static str {
        match self {
            AnomalyReason::ZeroReadingDetected => {
                "Zero consumption recorded; the meter may be faulty or was not read."
            }
            AnomalyReason::SpikeDetectedPossibleAcOrCumulative => {
                "Consumption is well above the usual level; possible air-conditioner load or cumulative billing."
            }
            AnomalyReason::ExtremelyLargeReadingPossibleCumulativeOrDataError => {
                "Consumption is several times the usual level; likely cumulative billing or a reading error."
            }
            AnomalyReason::NoMajorAnomaly => "No major anomaly found in the billed consumption.",
            AnomalyReason::UnitsNotParsed => "Consumed units could not be read from the bill.",
        }
    }
}

impl std::fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnomalyReason {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero-reading-detected" => Ok(AnomalyReason::ZeroReadingDetected),
            "spike-detected-possible-ac-or-cumulative" => {
                Ok(AnomalyReason::SpikeDetectedPossibleAcOrCumulative)
            }
            "extremely-large-reading-possible-cumulative-or-data-error" => {
                Ok(AnomalyReason::ExtremelyLargeReadingPossibleCumulativeOrDataError)
            }
            "no-major-anomaly" => Ok(AnomalyReason::NoMajorAnomaly),
            "units-not-parsed" => Ok(AnomalyReason::UnitsNotParsed),
            other => Err(format!("Unknown anomaly reason: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnomalyVerdict {
    #[serde(rename = "anomaly")]
    pub is_anomalous: bool,
    pub reason: AnomalyReason,
}

impl AnomalyVerdict {
    fn flagged(reason: AnomalyReason) -> Self {
        Self { is_anomalous: true, reason }
    }

    fn clear(reason: AnomalyReason) -> Self {
        Self { is_anomalous: false, reason }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Average consumption (kWh) the thresholds scale from.
    pub baseline_kwh: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self { baseline_kwh: DEFAULT_BASELINE_KWH }
    }
}

/// Tiered threshold rules over consumed units.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyClassifier {
    baseline: f64,
}

impl AnomalyClassifier {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { baseline: config.baseline_kwh }
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Classify an extracted units string. Missing or non-numeric units are reported
    /// as not anomalous rather than as an error.
    pub fn classify_units(&self, units: Option<&str>) -> AnomalyVerdict {
        match units.and_then(|u| u.trim().parse::<f64>().ok()) {
            Some(u) => self.classify(u),
            None => AnomalyVerdict::clear(AnomalyReason::UnitsNotParsed),
        }
    }

    /// First matching tier wins. `u == baseline * 1.5` is not a spike.
    pub fn classify(&self, u: f64) -> AnomalyVerdict {
        let b = self.baseline;
        if u == 0.0 {
            AnomalyVerdict::flagged(AnomalyReason::ZeroReadingDetected)
        } else if u > b * 1.5 && u <= b * 6.0 {
            AnomalyVerdict::flagged(AnomalyReason::SpikeDetectedPossibleAcOrCumulative)
        } else if u > b * 6.0 {
            AnomalyVerdict::flagged(AnomalyReason::ExtremelyLargeReadingPossibleCumulativeOrDataError)
        } else {
            AnomalyVerdict::clear(AnomalyReason::NoMajorAnomaly)
        }
    }
}

impl Default for AnomalyClassifier {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}

/// Classify `units` against `baseline` in one call.
pub fn detect_anomaly(units: &str, baseline: f64) -> AnomalyVerdict {
    AnomalyClassifier::new(AnomalyConfig { baseline_kwh: baseline }).classify_units(Some(units))
}
