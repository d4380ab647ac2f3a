use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single sensor tick: parameter values plus the `timestamp` and `region`
/// metadata every reading must carry.
///
/// A parameter mapped to `None` was present in the source but had no value
/// (an empty cell); it is skipped by every check just like a missing key.
///
/// # Examples
///
/// ```
/// use soilmon_common::types::Reading;
///
/// let reading = Reading::new("2025-07-18T12:00:00", "tropical")
///     .with_value("soil_moisture", 6.5)
///     .with_missing("ph");
/// assert_eq!(reading.value("soil_moisture"), Some(6.5));
/// assert_eq!(reading.value("ph"), None);
/// assert_eq!(reading.value("ec"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Reading {
    pub fn new(timestamp: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            region: Some(region.into()),
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, parameter: impl Into<String>, value: f64) -> Self {
        self.values.insert(parameter.into(), Some(value));
        self
    }

    pub fn with_missing(mut self, parameter: impl Into<String>) -> Self {
        self.values.insert(parameter.into(), None);
        self
    }

    /// The numeric value for `parameter`, or `None` when absent or null.
    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.values.get(parameter).copied().flatten()
    }

    /// Parses the reading's timestamp into the calendar fields used by
    /// contextual rules.
    pub fn calendar(&self) -> Result<Calendar, ReadingError> {
        let raw = self
            .timestamp
            .as_deref()
            .ok_or(ReadingError::MissingField("timestamp"))?;
        parse_timestamp(raw).map(Calendar::from)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(self.values.len() + 2);
        if let Some(ts) = &self.timestamp {
            parts.push(format!("timestamp={ts}"));
        }
        if let Some(region) = &self.region {
            parts.push(format!("region={region}"));
        }
        for (name, value) in &self.values {
            match value {
                Some(v) => parts.push(format!("{name}={v}")),
                None => parts.push(format!("{name}=null")),
            }
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Why a reading could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadingError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid ISO-8601 timestamp '{0}': expected a date and a time")]
    InvalidTimestamp(String),
}

/// Month and hour of a reading, taken from the timestamp's own wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub at: NaiveDateTime,
    /// 1-12
    pub month: u32,
    /// 0-23
    pub hour: u32,
}

impl From<NaiveDateTime> for Calendar {
    fn from(at: NaiveDateTime) -> Self {
        Self {
            at,
            month: at.month(),
            hour: at.hour(),
        }
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp that carries both a date and a time.
///
/// Offsets are accepted but not applied: the wall-clock fields are kept as
/// written, since contextual rules are defined in local sensor time.
///
/// # Examples
///
/// ```
/// use chrono::Timelike;
/// use soilmon_common::types::parse_timestamp;
///
/// let at = parse_timestamp("2025-01-20T11:00:00").unwrap();
/// assert_eq!(at.hour(), 11);
/// assert_eq!(parse_timestamp("2025-01-20T23:30:00+05:00").unwrap().hour(), 23);
/// assert!(parse_timestamp("2025-01-20").is_err());
/// ```
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ReadingError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ReadingError::InvalidTimestamp(raw.to_string()))
}

/// Closed set of finding categories.
///
/// # Examples
///
/// ```
/// use soilmon_common::types::FindingKind;
///
/// assert_eq!(FindingKind::Statistical.to_string(), "statistical");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Point,
    Contextual,
    Statistical,
    Error,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::Point => write!(f, "point"),
            FindingKind::Contextual => write!(f, "contextual"),
            FindingKind::Statistical => write!(f, "statistical"),
            FindingKind::Error => write!(f, "error"),
        }
    }
}

/// The observed value a finding refers to. Error findings carry the
/// offending text instead of a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FindingValue {
    Number(f64),
    Text(String),
}

impl FindingValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FindingValue::Number(v) => Some(*v),
            FindingValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingValue::Number(v) => write!(f, "{v}"),
            FindingValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for FindingValue {
    fn from(v: f64) -> Self {
        FindingValue::Number(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub parameter: String,
    pub value: FindingValue,
    pub kind: FindingKind,
    /// Contextual rule name, or the z-score explanation for statistical findings.
    pub context: Option<String>,
    pub message: String,
}

impl Finding {
    pub fn error(
        parameter: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            value: FindingValue::Text(value.into()),
            kind: FindingKind::Error,
            context: None,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FindingKind::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_from_naive_timestamp() {
        let reading = Reading::new("2025-11-05T22:00:00", "temperate");
        let cal = reading.calendar().unwrap();
        assert_eq!(cal.month, 11);
        assert_eq!(cal.hour, 22);
    }

    #[test]
    fn calendar_accepts_space_separator_and_fraction() {
        let reading = Reading::new("2025-04-15 08:00:00.250", "temperate");
        let cal = reading.calendar().unwrap();
        assert_eq!(cal.month, 4);
        assert_eq!(cal.hour, 8);
    }

    #[test]
    fn calendar_keeps_wall_clock_of_offset_timestamp() {
        let reading = Reading::new("2025-06-25T02:00:00Z", "tropical");
        assert_eq!(reading.calendar().unwrap().hour, 2);
    }

    #[test]
    fn calendar_rejects_date_only() {
        let reading = Reading::new("2025-07-22", "tropical");
        assert_eq!(
            reading.calendar(),
            Err(ReadingError::InvalidTimestamp("2025-07-22".into()))
        );
    }

    #[test]
    fn calendar_reports_missing_timestamp() {
        let reading = Reading {
            timestamp: None,
            region: Some("temperate".into()),
            values: BTreeMap::new(),
        };
        assert_eq!(
            reading.calendar(),
            Err(ReadingError::MissingField("timestamp"))
        );
    }

    #[test]
    fn reading_display_lists_fields() {
        let reading = Reading::new("2025-07-22T10:00:00", "arctic")
            .with_value("soil_moisture", 50.0)
            .with_missing("ph");
        let s = reading.to_string();
        assert!(s.contains("region=arctic"));
        assert!(s.contains("soil_moisture=50"));
        assert!(s.contains("ph=null"));
    }

    #[test]
    fn finding_serializes_kind_lowercase() {
        let finding = Finding {
            parameter: "ec".into(),
            value: FindingValue::Number(3.7),
            kind: FindingKind::Contextual,
            context: Some("Winter road salt".into()),
            message: "Possible road salt contamination".into(),
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["kind"], "contextual");
        assert_eq!(json["value"], 3.7);
    }

    #[test]
    fn error_finding_carries_text_value() {
        let finding = Finding::error("region", "arctic", "unknown region");
        assert!(finding.is_error());
        assert_eq!(finding.value.as_f64(), None);
        assert_eq!(finding.value.to_string(), "arctic");
    }
}
