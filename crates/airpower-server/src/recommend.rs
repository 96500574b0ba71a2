//! Rule-based usage recommendations.
//!
//! Rules run over a user's power readings and emit advice in a fixed
//! order so repeated calls over unchanged data produce identical output.

use std::collections::{HashMap, HashSet};

use airpower_core::PowerReading;

/// Daily average above which usage counts as high, in kWh.
const HIGH_DAILY_AVERAGE_KWH: f64 = 30.0;

/// Share of total usage above which a single location dominates.
const DOMINANT_LOCATION_SHARE: f64 = 0.6;

/// A generated piece of advice, not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedRecommendation {
    pub title: String,
    pub details: String,
}

/// Runs every rule over the readings.
///
/// Returns an empty vector only when `readings` is empty; otherwise at
/// least the baseline tip applies.
pub fn generate(readings: &[PowerReading]) -> Vec<GeneratedRecommendation> {
    if readings.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();

    if let Some(avg) = daily_average_kwh(readings) {
        if avg > HIGH_DAILY_AVERAGE_KWH {
            out.push(GeneratedRecommendation {
                title: "Shift heavy loads off peak hours".to_string(),
                details: format!(
                    "Your average consumption is {avg:.1} kWh per day. Running appliances \
                     like laundry and dishwashers outside peak hours can lower both load \
                     and cost."
                ),
            });
        }
    }

    let anomalous: Vec<&PowerReading> = readings.iter().filter(|r| r.anomaly).collect();
    if !anomalous.is_empty() {
        let mut devices: Vec<&str> = anomalous.iter().map(|r| r.device_id.as_str()).collect();
        devices.sort_unstable();
        devices.dedup();
        out.push(GeneratedRecommendation {
            title: "Inspect devices with anomalous readings".to_string(),
            details: format!(
                "{} of your readings were flagged as anomalies. Inspect {} for faults \
                 or unexpected standby consumption.",
                anomalous.len(),
                devices.join(", ")
            ),
        });
    }

    if let Some((location, share)) = dominant_location(readings) {
        if share > DOMINANT_LOCATION_SHARE {
            out.push(GeneratedRecommendation {
                title: format!("Audit usage in {location}"),
                details: format!(
                    "{location} accounts for {:.0}% of your measured consumption. An \
                     audit of the appliances there is the fastest way to reduce your \
                     total usage.",
                    share * 100.0
                ),
            });
        }
    }

    out.push(GeneratedRecommendation {
        title: "Track your usage regularly".to_string(),
        details: "Consistent measurements make trends visible early. Keep logging \
                  readings to catch creeping consumption before it shows up on a bill."
            .to_string(),
    });

    out
}

/// Average kWh per distinct reading day, `None` when no reading converts
/// to kWh.
fn daily_average_kwh(readings: &[PowerReading]) -> Option<f64> {
    let mut total = 0.0;
    let mut days = HashSet::new();
    for reading in readings {
        if let Some(kwh) = reading.usage_kwh() {
            total += kwh;
            days.insert(reading.timestamp.date());
        }
    }
    if days.is_empty() {
        return None;
    }
    Some(total / days.len() as f64)
}

/// The location with the largest kWh share, with its fraction of the
/// total.
fn dominant_location(readings: &[PowerReading]) -> Option<(String, f64)> {
    let mut by_location: HashMap<&str, f64> = HashMap::new();
    let mut total = 0.0;
    for reading in readings {
        let Some(kwh) = reading.usage_kwh() else {
            continue;
        };
        *by_location.entry(reading.location.as_str()).or_default() += kwh;
        total += kwh;
    }
    if total <= 0.0 {
        return None;
    }
    by_location
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(location, kwh)| (location.to_string(), kwh / total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airpower_core::UsageUnit;
    use time::OffsetDateTime;

    fn reading(usage: f64, unit: UsageUnit, location: &str, anomaly: bool) -> PowerReading {
        let mut r = PowerReading::new(
            "u1",
            usage,
            unit,
            OffsetDateTime::now_utc(),
            location,
            "hvac-1",
        )
        .unwrap();
        if anomaly {
            r.mark_anomaly();
        }
        r
    }

    #[test]
    fn no_readings_yields_no_recommendations() {
        assert!(generate(&[]).is_empty());
    }

    #[test]
    fn baseline_tip_always_present_with_readings() {
        let recs = generate(&[reading(1.0, UsageUnit::KilowattHours, "Kitchen", false)]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Track your usage regularly");
    }

    #[test]
    fn high_average_triggers_load_shifting() {
        // Same day, 45 kWh total, but a dominant-location hit too.
        let recs = generate(&[
            reading(20.0, UsageUnit::KilowattHours, "Garage", false),
            reading(25.0, UsageUnit::KilowattHours, "Garage", false),
        ]);
        assert!(recs[0].title.contains("off peak"));
    }

    #[test]
    fn anomalies_trigger_device_inspection() {
        let recs = generate(&[reading(2.0, UsageUnit::KilowattHours, "Kitchen", true)]);
        assert!(recs.iter().any(|r| r.details.contains("hvac-1")));
    }

    #[test]
    fn dominant_location_triggers_audit() {
        let recs = generate(&[
            reading(9.0, UsageUnit::KilowattHours, "Garage", false),
            reading(1.0, UsageUnit::KilowattHours, "Kitchen", false),
        ]);
        assert!(recs.iter().any(|r| r.title == "Audit usage in Garage"));
    }

    #[test]
    fn amp_readings_do_not_break_the_rules() {
        let recs = generate(&[
            reading(10.0, UsageUnit::Amps, "Garage", false),
            reading(1.0, UsageUnit::KilowattHours, "Kitchen", false),
        ]);
        assert!(recs.iter().any(|r| r.title == "Track your usage regularly"));
    }

    #[test]
    fn output_is_deterministic() {
        let readings = vec![
            reading(40.0, UsageUnit::KilowattHours, "Garage", true),
            reading(2.0, UsageUnit::KilowattHours, "Kitchen", false),
        ];
        assert_eq!(generate(&readings), generate(&readings));
    }
}
