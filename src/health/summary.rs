use std::fmt;

use super::record::HealthRecord;
use super::vital::VitalType;
use super::HealthError;

pub const SUMMARY_HEADER: &str = "Patient summary (last 7 days):";

/// Mean of one metric over the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricAverage {
    pub vital: VitalType,
    pub mean: f64,
    pub count: usize,
}

/// Per-metric averages in fixed order; metrics with no measurements are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSummary {
    pub averages: Vec<MetricAverage>,
}

impl HealthSummary {
    pub fn get(&self, vital: VitalType) -> Option<&MetricAverage> {
        self.averages.iter().find(|a| a.vital == vital)
    }

    /// Text handed to the diagnostic prompt. Every line ends with a newline.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SUMMARY_HEADER}")?;
        for avg in &self.averages {
            writeln!(f, "- Avg {}: {}", avg.vital.label(), avg.vital.format_value(avg.mean))?;
        }
        Ok(())
    }
}

/// Average heart rate, oxygen saturation and body temperature.
///
/// Entries of other types are skipped. A recognised entry without a numeric
/// value fails the whole summary.
pub fn summarize(record: &HealthRecord) -> Result<HealthSummary, HealthError> {
    let mut sums = [(0.0_f64, 0_usize); VitalType::ALL.len()];

    for entry in record.entries() {
        let Some(vital) = entry.kind().and_then(VitalType::from_identifier) else {
            continue;
        };
        let value = entry.numeric_value().ok_or_else(|| {
            HealthError::RecordMalformed(format!(
                "non-numeric value {:?} for {}",
                entry.value,
                vital.identifier()
            ))
        })?;
        let slot = &mut sums[slot_index(vital)];
        slot.0 += value;
        slot.1 += 1;
    }

    let averages = VitalType::ALL
        .iter()
        .zip(sums)
        .filter(|(_, (_, count))| *count > 0)
        .map(|(vital, (sum, count))| MetricAverage {
            vital: *vital,
            mean: sum / count as f64,
            count,
        })
        .collect::<Vec<_>>();

    tracing::debug!(metrics = averages.len(), "Health summary computed");
    Ok(HealthSummary { averages })
}

fn slot_index(vital: VitalType) -> usize {
    match vital {
        VitalType::HeartRate => 0,
        VitalType::OxygenSaturation => 1,
        VitalType::BodyTemperature => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::record::RecordEntry;
    use serde_json::json;

    fn record(entries: &[(&str, serde_json::Value)]) -> HealthRecord {
        HealthRecord::from_entries(
            entries
                .iter()
                .map(|(kind, value)| RecordEntry::new(kind, value.clone()))
                .collect(),
        )
    }

    const HR: &str = "HKQuantityTypeIdentifierHeartRate";
    const SPO2: &str = "HKQuantityTypeIdentifierOxygenSaturation";
    const TEMP: &str = "HKQuantityTypeIdentifierBodyTemperature";

    #[test]
    fn heart_rate_average() {
        let summary = summarize(&record(&[(HR, json!("60")), (HR, json!("70")), (HR, json!("80"))]))
            .unwrap();
        let hr = summary.get(VitalType::HeartRate).unwrap();
        assert_eq!(hr.mean, 70.0);
        assert_eq!(hr.count, 3);
        assert_eq!(
            summary.to_text(),
            "Patient summary (last 7 days):\n- Avg heart rate: 70.0 bpm\n"
        );
    }

    #[test]
    fn oxygen_only_record_has_one_line() {
        let summary =
            summarize(&record(&[(SPO2, json!(95.0)), (SPO2, json!(96.0)), (SPO2, json!(97.0))]))
                .unwrap();
        let text = summary.to_text();
        let metric_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(metric_lines, vec!["- Avg oxygen saturation: 96.0%"]);
    }

    #[test]
    fn metrics_follow_fixed_order() {
        let summary = summarize(&record(&[
            (TEMP, json!("36.6")),
            (SPO2, json!("98")),
            (HR, json!("64")),
        ]))
        .unwrap();
        assert_eq!(
            summary.to_text(),
            "Patient summary (last 7 days):\n\
             - Avg heart rate: 64.0 bpm\n\
             - Avg oxygen saturation: 98.0%\n\
             - Avg body temperature: 36.6°C\n"
        );
    }

    #[test]
    fn empty_record_yields_header_only() {
        let summary = summarize(&HealthRecord::default()).unwrap();
        assert!(summary.averages.is_empty());
        assert_eq!(summary.to_text(), "Patient summary (last 7 days):\n");
    }

    #[test]
    fn unrecognised_types_are_ignored() {
        let summary = summarize(&record(&[
            ("HKQuantityTypeIdentifierStepCount", json!("lots")),
            (HR, json!(50)),
        ]))
        .unwrap();
        assert_eq!(summary.averages.len(), 1);
    }

    #[test]
    fn non_numeric_recognised_value_is_malformed() {
        let err = summarize(&record(&[(HR, json!("60")), (HR, json!("fast"))])).unwrap_err();
        assert!(matches!(err, HealthError::RecordMalformed(_)));
    }

    #[test]
    fn missing_value_is_malformed() {
        let rec = HealthRecord::from_entries(vec![RecordEntry {
            kind: Some(json!(TEMP)),
            value: None,
        }]);
        assert!(matches!(summarize(&rec), Err(HealthError::RecordMalformed(_))));
    }

    #[test]
    fn numeric_type_is_skipped_like_any_unknown_metric() {
        let rec = HealthRecord::parse(&format!(
            r#"{{"HealthData":{{"Record":[{{"@type":42,"@value":"fast"}},{{"@type":"{HR}","@value":"64"}}]}}}}"#
        ))
        .unwrap();

        let summary = summarize(&rec).unwrap();
        assert_eq!(summary.averages.len(), 1);
        assert_eq!(summary.averages[0].vital, VitalType::HeartRate);
    }
}
