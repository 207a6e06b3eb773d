use crate::anomaly::AnomalyVerdict;
use crate::fields::BillReadings;

const NOT_AVAILABLE: &str = "N/A";

/// Plain-text summary of a bill and its verdict, handed to document renderers and
/// narration tools.
pub fn render_summary(readings: &BillReadings, verdict: &AnomalyVerdict) -> String {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut lines = vec![
        format!("Consumer No: {}", or_na(&readings.consumer_no)),
        format!("Previous Reading: {}", or_na(&readings.prev_read)),
        format!("Present Reading: {}", or_na(&readings.cur_read)),
        format!("Units (kWh): {}", or_na(&readings.units)),
        format!("Amount (Rs): {}", or_na(&readings.amount)),
        String::new(),
        "Detected Anomaly:".to_string(),
        format!("  {} ({})", verdict.reason.describe(), verdict.reason),
    ];
    if verdict.is_anomalous {
        lines.push(String::new());
        lines.push(
            "Request: Please re-check my meter reading and issue a corrected bill / provisional billing as applicable."
                .to_string(),
        );
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::detect_anomaly;

    #[test]
    fn missing_fields_render_as_na() {
        let text = render_summary(&BillReadings::default(), &detect_anomaly("x", 200.0));
        assert!(text.contains("Consumer No: N/A"));
        assert!(text.contains("Units (kWh): N/A"));
        assert!(text.contains("(units-not-parsed)"));
        assert!(!text.contains("Request:"));
    }

    #[test]
    fn anomalous_bill_includes_request() {
        let readings = BillReadings {
            consumer_no: Some("12345678901".into()),
            prev_read: Some("12345".into()),
            cur_read: Some("12965".into()),
            units: Some("620".into()),
            amount: Some("4310".into()),
        };
        let text = render_summary(&readings, &detect_anomaly("620", 200.0));
        assert!(text.contains("Present Reading: 12965"));
        assert!(text.contains("Amount (Rs): 4310"));
        assert!(text.contains("spike-detected-possible-ac-or-cumulative"));
        assert!(text.contains("Request: Please re-check"));
    }
}
