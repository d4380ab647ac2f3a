use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of past readings kept as the statistical baseline.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
    /// Parameters the z-score stage looks at.
    #[serde(default = "default_parameters")]
    pub parameters: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            z_threshold: default_z_threshold(),
            parameters: default_parameters(),
        }
    }
}

fn default_window_size() -> usize {
    5
}

fn default_z_threshold() -> f64 {
    3.0
}

fn default_parameters() -> Vec<String> {
    [
        "soil_moisture",
        "soil_temperature",
        "ph",
        "ec",
        "n",
        "p",
        "k",
        "co2_flux",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(AlertError::InvalidConfig {
                name: "window_size",
                reason: "must be a positive integer".to_string(),
            });
        }
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(AlertError::InvalidConfig {
                name: "z_threshold",
                reason: format!("must be a positive number, got {}", self.z_threshold),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DetectorConfig::default();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.z_threshold, 3.0);
        assert_eq!(config.parameters.len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_window() {
        let config = DetectorConfig {
            window_size: 0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AlertError::InvalidConfig { name: "window_size", .. })
        ));
    }

    #[test]
    fn rejects_non_positive_threshold() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = DetectorConfig {
                z_threshold: bad,
                ..DetectorConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {bad}");
        }
    }
}
