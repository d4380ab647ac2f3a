use crate::config::DetectorConfig;
use crate::error::{AlertError, Result};
use crate::point_context;
use crate::reconcile;
use crate::stats::SlidingWindowStats;
use crate::store::RuleStore;
use crate::window::HistoryWindow;
use chrono::NaiveDateTime;
use serde::Serialize;
use soilmon_common::types::{Finding, FindingKind, Reading};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Final findings for one reading, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Zero-based position of the reading in the stream.
    pub index: u64,
    pub timestamp: Option<String>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub readings: u64,
    /// Readings whose report was not empty.
    pub reported: u64,
    pub findings_by_kind: BTreeMap<FindingKind, u64>,
}

impl RunSummary {
    pub fn record(&mut self, report: &Report) {
        self.readings += 1;
        if !report.is_empty() {
            self.reported += 1;
        }
        for finding in &report.findings {
            *self.findings_by_kind.entry(finding.kind).or_default() += 1;
        }
    }

    pub fn count(&self, kind: FindingKind) -> u64 {
        self.findings_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Sequential detector for one stream of readings.
///
/// Holds the shared, read-only [`RuleStore`] and the stream's own
/// [`HistoryWindow`]. Readings must be fed in timestamp order; each one is
/// admitted to the history only after its report has been produced, so the
/// statistical baseline never includes the reading being judged.
pub struct StreamRunner {
    rules: Arc<RuleStore>,
    stats: SlidingWindowStats,
    history: HistoryWindow,
    processed: u64,
    last_seen: Option<NaiveDateTime>,
}

impl StreamRunner {
    pub fn new(rules: Arc<RuleStore>, config: &DetectorConfig) -> Result<Self> {
        Self::with_history(rules, config, HistoryWindow::new(config.window_size))
    }

    /// Builds a runner over a caller-provided history, e.g. one pre-filled
    /// with readings from before the stream starts. Its capacity must equal
    /// `config.window_size`.
    pub fn with_history(
        rules: Arc<RuleStore>,
        config: &DetectorConfig,
        history: HistoryWindow,
    ) -> Result<Self> {
        config.validate()?;
        if history.capacity() != config.window_size {
            return Err(AlertError::InvalidConfig {
                name: "window_size",
                reason: format!(
                    "history holds {} readings but window_size is {}",
                    history.capacity(),
                    config.window_size
                ),
            });
        }
        Ok(Self {
            rules,
            stats: SlidingWindowStats::from_config(config),
            history,
            processed: 0,
            last_seen: None,
        })
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Runs both stages for one reading and admits it to the history.
    ///
    /// Never fails: malformed readings and unknown regions are reported as a
    /// single `error` finding and the stream moves on.
    pub fn process(&mut self, reading: Reading) -> Report {
        let index = self.processed;
        self.processed += 1;
        self.check_order(index, &reading);

        let rule_findings = point_context::evaluate(&reading, &self.rules);

        let findings = if rule_findings.iter().any(Finding::is_error) {
            tracing::debug!(index, "Reading rejected by rule stage");
            rule_findings.into_iter().filter(Finding::is_error).collect()
        } else if rule_findings.is_empty() {
            Vec::new()
        } else {
            let statistical =
                if reconcile::needs_statistics(&rule_findings) && self.history.is_full() {
                    self.stats.evaluate(&reading, &self.history)
                } else {
                    Vec::new()
                };
            reconcile::reconcile(rule_findings, &statistical)
        };

        let report = Report {
            index,
            timestamp: reading.timestamp.clone(),
            findings,
        };
        self.history.push(reading);
        report
    }

    /// Processes every reading in order and collects the reports.
    pub fn process_all<I>(&mut self, readings: I) -> Vec<Report>
    where
        I: IntoIterator<Item = Reading>,
    {
        readings.into_iter().map(|r| self.process(r)).collect()
    }

    fn check_order(&mut self, index: u64, reading: &Reading) {
        let Ok(calendar) = reading.calendar() else {
            return;
        };
        match self.last_seen {
            Some(last) if calendar.at < last => {
                tracing::warn!(
                    index,
                    timestamp = %calendar.at,
                    previous = %last,
                    "Reading arrived out of timestamp order"
                );
            }
            _ => self.last_seen = Some(calendar.at),
        }
    }
}
