use crate::config::AppConfig;
use crate::ingest;
use crate::sink::ReportSink;
use anyhow::Result;
use soilmon_alert::engine::{RunSummary, StreamRunner};
use soilmon_alert::store::RuleStore;
use soilmon_common::types::Reading;
use std::sync::Arc;

/// Loads the rule source for a run. An empty store aborts: without rules
/// every reading would pass unchecked.
pub fn load_rules(path: &str) -> Result<Arc<RuleStore>> {
    let store = RuleStore::load(path)?;
    if store.is_empty() {
        anyhow::bail!("no rules available in '{path}'");
    }
    Ok(Arc::new(store))
}

/// Feeds readings through `runner` into `sink`, in order.
///
/// A source error (unreadable row) stops the run; per-reading problems are
/// reported as findings and never do.
pub fn run<I, S>(runner: &mut StreamRunner, readings: I, sink: &mut S) -> Result<RunSummary>
where
    I: IntoIterator<Item = Result<Reading>>,
    S: ReportSink + ?Sized,
{
    let mut summary = RunSummary::default();
    for reading in readings {
        let report = runner.process(reading?);
        summary.record(&report);
        sink.emit(&report)?;
    }
    sink.finish(&summary)?;

    tracing::info!(
        readings = summary.readings,
        reported = summary.reported,
        findings = summary.findings_by_kind.values().sum::<u64>(),
        "Stream processed"
    );
    Ok(summary)
}

/// Full run as configured: load rules, open the reading source, stream.
pub fn run_from_config(config: &AppConfig, sink: &mut dyn ReportSink) -> Result<RunSummary> {
    let rules = load_rules(&config.rules_path)?;
    let mut runner = StreamRunner::new(rules, &config.detector)?;
    let readings = ingest::open_readings(&config.readings_path, &config.ingest)?;

    tracing::info!(
        readings_path = %config.readings_path,
        window_size = config.detector.window_size,
        z_threshold = config.detector.z_threshold,
        "Starting stream"
    );
    run(&mut runner, readings, sink)
}
