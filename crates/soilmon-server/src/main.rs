use anyhow::Result;
use soilmon_server::config::AppConfig;
use soilmon_server::pipeline;
use soilmon_server::sink;
use std::io::{self, BufWriter, Write};
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  soilmon [config.toml]                  Run detection over the configured reading source");
    eprintln!("  soilmon check-rules <config.toml>      Load the rule source and print per-region rule counts");
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("soilmon=info".parse()?))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("check-rules") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("check-rules requires <config.toml> argument")
            })?;
            run_check_rules(config_path)
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/soilmon.toml");
            run_stream(config_path)
        }
    }
}

fn run_stream(config_path: &str) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let out = BufWriter::new(io::stdout());
    let mut sink = sink::build_sink(config.report.format, config.report.include_empty, out);
    pipeline::run_from_config(&config, sink.as_mut())?;
    Ok(())
}

fn run_check_rules(config_path: &str) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let rules = pipeline::load_rules(&config.rules_path)?;
    let summary = rules.summary();

    let mut out = io::stdout().lock();
    for region in rules.regions() {
        writeln!(out, "{region}: {} rules", rules.region_rule_count(region))?;
    }
    writeln!(
        out,
        "total: {} point, {} contextual, {} rows skipped",
        summary.point_rules, summary.contextual_rules, summary.skipped
    )?;
    Ok(())
}
