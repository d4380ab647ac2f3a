//! Stage 2: sliding-window z-score test.

use crate::config::DetectorConfig;
use crate::window::HistoryWindow;
use soilmon_common::types::{Finding, FindingKind, FindingValue, Reading};

/// Population statistics of a window and the z-score of a new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScore {
    pub mean: f64,
    pub std_dev: f64,
    pub z: f64,
}

impl ZScore {
    /// Computes mean and population (not Bessel-corrected) standard
    /// deviation of `values`, then the z-score of `current`.
    ///
    /// A zero-variance window has z = 0 when `current` equals the mean and
    /// an infinite z (signed by the direction of the deviation) otherwise.
    /// Returns `None` for an empty window.
    ///
    /// # Examples
    ///
    /// ```
    /// use soilmon_alert::stats::ZScore;
    ///
    /// let flat = [35.0; 10];
    /// assert_eq!(ZScore::compute(&flat, 35.0).unwrap().z, 0.0);
    /// assert!(ZScore::compute(&flat, 36.0).unwrap().z.is_infinite());
    /// ```
    pub fn compute(values: &[f64], current: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = (values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

        let z = if std_dev == 0.0 {
            if current == mean {
                0.0
            } else {
                f64::INFINITY.copysign(current - mean)
            }
        } else {
            (current - mean) / std_dev
        };
        Some(Self { mean, std_dev, z })
    }
}

/// Stateless z-score check over a fixed list of parameters.
///
/// The history it reads is owned and advanced by the stream runner; this
/// type retains nothing between calls.
#[derive(Debug, Clone)]
pub struct SlidingWindowStats {
    parameters: Vec<String>,
    window_size: usize,
    z_threshold: f64,
}

impl SlidingWindowStats {
    pub fn new(parameters: Vec<String>, window_size: usize, z_threshold: f64) -> Self {
        Self {
            parameters,
            window_size,
            z_threshold,
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(
            config.parameters.clone(),
            config.window_size,
            config.z_threshold,
        )
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn z_threshold(&self) -> f64 {
        self.z_threshold
    }

    /// Flags every configured parameter of `reading` whose |z| against the
    /// history exceeds the threshold.
    ///
    /// Returns nothing when the history holds fewer than `window_size`
    /// readings. A parameter is also skipped when fewer than `window_size`
    /// history entries carry a value for it.
    pub fn evaluate(&self, reading: &Reading, history: &HistoryWindow) -> Vec<Finding> {
        if history.len() < self.window_size {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for parameter in &self.parameters {
            let Some(current) = reading.value(parameter) else {
                continue;
            };

            let values: Vec<f64> = history
                .iter()
                .filter_map(|r| r.value(parameter))
                .filter(|v| !v.is_nan())
                .collect();
            if values.len() < self.window_size {
                tracing::debug!(
                    parameter = %parameter,
                    valid = values.len(),
                    required = self.window_size,
                    "Not enough history values for z-score"
                );
                continue;
            }

            let Some(score) = ZScore::compute(&values, current) else {
                continue;
            };
            if score.z.abs() > self.z_threshold {
                findings.push(self.finding(parameter, current, &score));
            }
        }
        findings
    }

    fn finding(&self, parameter: &str, value: f64, score: &ZScore) -> Finding {
        Finding {
            parameter: parameter.to_string(),
            value: FindingValue::Number(value),
            kind: FindingKind::Statistical,
            context: Some(format!(
                "Z-score of {:.2} exceeds threshold ({:.2}). Value is {:.2} std deviations from the {}-reading average of {:.2}.",
                score.z,
                self.z_threshold,
                score.z.abs(),
                self.window_size,
                score.mean,
            )),
            message: format!("statistical anomaly in {parameter}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(parameter: &str, values: &[f64]) -> HistoryWindow {
        let mut window = HistoryWindow::new(values.len());
        window.extend(values.iter().map(|v| {
            Reading::new("2025-07-01T00:00:00", "temperate").with_value(parameter, *v)
        }));
        window
    }

    fn current(parameter: &str, value: f64) -> Reading {
        Reading::new("2025-07-01T01:00:00", "temperate").with_value(parameter, value)
    }

    #[test]
    fn zscore_uses_population_std() {
        let score = ZScore::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 9.0).unwrap();
        assert!((score.mean - 5.0).abs() < 1e-12);
        assert!((score.std_dev - 2.0).abs() < 1e-12);
        assert!((score.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zscore_flat_window_below_mean_is_negative_infinity() {
        let score = ZScore::compute(&[10.0, 10.0], 9.0).unwrap();
        assert_eq!(score.z, f64::NEG_INFINITY);
    }

    #[test]
    fn zscore_empty_window_is_none() {
        assert!(ZScore::compute(&[], 1.0).is_none());
    }

    #[test]
    fn flat_history_same_value_is_not_flagged() {
        let stats = SlidingWindowStats::new(vec!["soil_moisture".into()], 10, 3.0);
        let window = history("soil_moisture", &[35.0; 10]);
        assert!(stats.evaluate(&current("soil_moisture", 35.0), &window).is_empty());
    }

    #[test]
    fn flat_history_different_value_is_flagged_with_infinite_z() {
        let stats = SlidingWindowStats::new(vec!["soil_moisture".into()], 10, 3.0);
        let window = history("soil_moisture", &[35.0; 10]);
        let findings = stats.evaluate(&current("soil_moisture", 36.0), &window);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::Statistical);
        let context = findings[0].context.as_deref().unwrap();
        assert!(context.contains("inf"), "context was: {context}");
        assert!(context.contains("10-reading average of 35.00"));
    }

    #[test]
    fn sudden_drop_is_flagged() {
        let stats = SlidingWindowStats::new(vec!["soil_moisture".into()], 10, 3.0);
        let window = history(
            "soil_moisture",
            &[35.1, 35.3, 35.2, 35.4, 35.3, 35.5, 35.4, 35.6, 35.5, 35.7],
        );
        assert_eq!(stats.evaluate(&current("soil_moisture", 25.0), &window).len(), 1);
        assert!(stats.evaluate(&current("soil_moisture", 35.8), &window).is_empty());
    }

    #[test]
    fn short_history_yields_nothing() {
        let stats = SlidingWindowStats::new(vec!["soil_moisture".into()], 10, 3.0);
        let window = history("soil_moisture", &[35.0; 4]);
        assert!(stats.evaluate(&current("soil_moisture", 99.0), &window).is_empty());
    }

    #[test]
    fn parameter_with_gaps_in_history_is_skipped() {
        let stats = SlidingWindowStats::new(vec!["ph".into(), "ec".into()], 3, 3.0);
        let mut window = HistoryWindow::new(3);
        window.push(
            Reading::new("2025-07-01T00:00:00", "arid")
                .with_value("ph", 7.0)
                .with_value("ec", 2.0),
        );
        window.push(
            Reading::new("2025-07-01T01:00:00", "arid")
                .with_value("ph", 7.0)
                .with_missing("ec"),
        );
        window.push(
            Reading::new("2025-07-01T02:00:00", "arid")
                .with_value("ph", 7.0)
                .with_value("ec", 2.0),
        );

        let reading = Reading::new("2025-07-01T03:00:00", "arid")
            .with_value("ph", 9.0)
            .with_value("ec", 9.0);
        let findings = stats.evaluate(&reading, &window);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].parameter, "ph");
    }

    #[test]
    fn unlisted_parameters_are_ignored() {
        let stats = SlidingWindowStats::new(vec!["ph".into()], 3, 3.0);
        let window = history("soil_moisture", &[35.0; 3]);
        assert!(stats.evaluate(&current("soil_moisture", 1.0), &window).is_empty());
    }
}
