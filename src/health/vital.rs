/// Metrics the summarizer aggregates, in summary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VitalType {
    HeartRate,
    OxygenSaturation,
    BodyTemperature,
}

impl VitalType {
    /// Fixed order of lines in a summary.
    pub const ALL: [VitalType; 3] = [
        VitalType::HeartRate,
        VitalType::OxygenSaturation,
        VitalType::BodyTemperature,
    ];

    /// HealthKit quantity type identifier used in exported records.
    pub fn identifier(self) -> &'static str {
        match self {
            VitalType::HeartRate => "HKQuantityTypeIdentifierHeartRate",
            VitalType::OxygenSaturation => "HKQuantityTypeIdentifierOxygenSaturation",
            VitalType::BodyTemperature => "HKQuantityTypeIdentifierBodyTemperature",
        }
    }

    pub fn from_identifier(s: &str) -> Option<Self> {
        match s {
            "HKQuantityTypeIdentifierHeartRate" => Some(VitalType::HeartRate),
            "HKQuantityTypeIdentifierOxygenSaturation" => Some(VitalType::OxygenSaturation),
            "HKQuantityTypeIdentifierBodyTemperature" => Some(VitalType::BodyTemperature),
            _ => None,
        }
    }

    /// Human label used in summary lines.
    pub fn label(self) -> &'static str {
        match self {
            VitalType::HeartRate => "heart rate",
            VitalType::OxygenSaturation => "oxygen saturation",
            VitalType::BodyTemperature => "body temperature",
        }
    }

    pub fn default_unit(self) -> &'static str {
        match self {
            VitalType::HeartRate => "bpm",
            VitalType::OxygenSaturation => "%",
            VitalType::BodyTemperature => "°C",
        }
    }

    /// Render a value with its unit, e.g. `72.5 bpm`, `96.0%`, `36.8°C`.
    pub fn format_value(self, value: f64) -> String {
        match self {
            VitalType::HeartRate => format!("{value:.1} {}", self.default_unit()),
            _ => format!("{value:.1}{}", self.default_unit()),
        }
    }
}
