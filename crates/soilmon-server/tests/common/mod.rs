#![allow(dead_code)]

use anyhow::Result;
use soilmon_server::config::AppConfig;
use std::path::Path;
use tempfile::TempDir;

pub const RULES_HEADER: &str = "region,parameter,rule_type,low_threshold,high_threshold,message_low,message_high,context_name,months,hours\n";

pub const SEED_RULES: &str = include_str!("../../../../config/soil_rules.csv");

pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: AppConfig,
}

/// Writes the rule and reading sources into a temp dir and points a config at them.
pub fn build_test_context(rules_csv: &str, readings_csv: &str) -> Result<TestContext> {
    let temp_dir = TempDir::new()?;
    let rules_path = write_file(temp_dir.path(), "soil_rules.csv", rules_csv)?;
    let readings_path = write_file(temp_dir.path(), "readings.csv", readings_csv)?;

    let config = AppConfig {
        rules_path,
        readings_path,
        ..AppConfig::default()
    };
    Ok(TestContext { temp_dir, config })
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> Result<String> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path.display().to_string())
}

pub fn json_lines(bytes: Vec<u8>) -> Vec<serde_json::Value> {
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}
