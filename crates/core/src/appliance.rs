use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One appliance's estimated slice of the bill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplianceShare {
    pub name: String,
    pub kwh: f64,
    pub percent: f64,
}

/// Turn per-appliance kWh estimates into shares of the total, keeping input order.
/// A zero total yields 0.0 percent everywhere and leaves kWh unrounded.
pub fn format_appliance_percentages<I, S>(estimates: I) -> Vec<ApplianceShare>
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let estimates: Vec<(String, f64)> =
        estimates.into_iter().map(|(name, kwh)| (name.into(), kwh)).collect();
    let total: f64 = estimates.iter().map(|(_, kwh)| kwh).sum();

    if total == 0.0 {
        return estimates
            .into_iter()
            .map(|(name, kwh)| ApplianceShare { name, kwh, percent: 0.0 })
            .collect();
    }

    estimates
        .into_iter()
        .map(|(name, kwh)| ApplianceShare {
            name,
            kwh: round_tenth(kwh),
            percent: round_tenth(100.0 * kwh / total),
        })
        .collect()
}

/// Round half to even on the exact binary value, so `0.35` (stored just below the
/// midpoint) becomes `0.3` and `0.65` becomes `0.7`.
fn round_tenth(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .and_then(|d| d.round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven).to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_output() {
        let shares = format_appliance_percentages(Vec::<(String, f64)>::new());
        assert!(shares.is_empty());
    }

    #[test]
    fn all_zero_values_give_zero_percent() {
        let shares = format_appliance_percentages([("fan", 0.0), ("ac", 0.0)]);
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|s| s.percent == 0.0));
    }

    #[test]
    fn percentages_follow_kwh() {
        let shares = format_appliance_percentages([
            ("fan", 30.0),
            ("ac", 60.0),
            ("fridge", 10.0),
        ]);
        assert_eq!(shares[0].name, "fan");
        assert_eq!(shares[0].percent, 30.0);
        assert_eq!(shares[1].percent, 60.0);
        assert_eq!(shares[2].percent, 10.0);
    }

    #[test]
    fn values_round_to_one_decimal() {
        let shares = format_appliance_percentages([("lights", 1.0), ("geyser", 2.0)]);
        assert_eq!(shares[0].percent, 33.3);
        assert_eq!(shares[1].percent, 66.7);

        let shares = format_appliance_percentages([("fan", 12.345)]);
        assert_eq!(shares[0].kwh, 12.3);
        assert_eq!(shares[0].percent, 100.0);
    }

    #[test]
    fn midpoints_round_on_stored_value() {
        let shares = format_appliance_percentages([("a", 0.35), ("b", 0.65)]);
        assert_eq!(shares[0].kwh, 0.3);
        assert_eq!(shares[1].kwh, 0.7);
        assert_eq!(shares[0].percent, 35.0);

        assert_eq!(round_tenth(0.25), 0.2);
        assert_eq!(round_tenth(0.75), 0.8);
        assert_eq!(round_tenth(2.675), 2.7);
        assert_eq!(round_tenth(-0.35), -0.3);
    }
}
