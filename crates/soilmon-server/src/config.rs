use serde::{Deserialize, Serialize};
use soilmon_alert::config::DetectorConfig;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_rules_path")]
    pub rules_path: String,
    #[serde(default = "default_readings_path")]
    pub readings_path: String,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Region injected into readings whose source has no region cell.
    #[serde(default)]
    pub default_region: Option<String>,
    /// Raw source header -> canonical name (`timestamp`, `region`, or a
    /// parameter name). Unmapped headers are used as-is.
    #[serde(default)]
    pub column_mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: ReportFormat,
    /// Also emit readings that produced no findings.
    #[serde(default)]
    pub include_empty: bool,
}

fn default_rules_path() -> String {
    "config/soil_rules.csv".to_string()
}

fn default_readings_path() -> String {
    "data/prepared_data.csv".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
            readings_path: default_readings_path(),
            detector: DetectorConfig::default(),
            ingest: IngestConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path, e))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.detector.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.rules_path, "config/soil_rules.csv");
        assert_eq!(config.detector.window_size, 5);
        assert_eq!(config.detector.z_threshold, 3.0);
        assert_eq!(config.report.format, ReportFormat::Text);
        assert!(config.ingest.default_region.is_none());
    }

    #[test]
    fn parses_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
rules_path = "rules.csv"
readings_path = "readings.csv"

[detector]
window_size = 10
z_threshold = 2.5
parameters = ["soil_moisture"]

[ingest]
default_region = "temperate"

[ingest.column_mapping]
"Timestamp" = "timestamp"
"Moisture_VWC_%" = "soil_moisture"

[report]
format = "json"
include_empty = true
"#,
        )
        .unwrap();
        assert_eq!(config.readings_path, "readings.csv");
        assert_eq!(config.detector.window_size, 10);
        assert_eq!(config.detector.parameters, vec!["soil_moisture"]);
        assert_eq!(config.ingest.default_region.as_deref(), Some("temperate"));
        assert_eq!(
            config.ingest.column_mapping.get("Moisture_VWC_%").map(String::as_str),
            Some("soil_moisture")
        );
        assert_eq!(config.report.format, ReportFormat::Json);
        assert!(config.report.include_empty);
    }

    #[test]
    fn rejects_invalid_detector_settings() {
        let err = AppConfig::from_toml_str("[detector]\nz_threshold = -1.0\n").unwrap_err();
        assert!(err.to_string().contains("z_threshold"));
    }

    #[test]
    fn shipped_config_parses() {
        let content = include_str!("../../../config/soilmon.toml");
        let config = AppConfig::from_toml_str(content).unwrap();
        assert_eq!(config.ingest.column_mapping.len(), 9);
    }
}
