use crate::config::ReportFormat;
use anyhow::Result;
use soilmon_alert::engine::{Report, RunSummary};
use std::io::Write;

/// Destination for per-reading reports.
///
/// The runner hands every report to the sink in stream order; sinks decide
/// how (and whether) empty reports are written.
pub trait ReportSink {
    fn emit(&mut self, report: &Report) -> Result<()>;

    /// Called once after the last reading.
    fn finish(&mut self, _summary: &RunSummary) -> Result<()> {
        Ok(())
    }
}

/// Human-readable output: a header per reading and one line per finding.
pub struct TextSink<W: Write> {
    out: W,
    include_empty: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W, include_empty: bool) -> Self {
        Self { out, include_empty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn emit(&mut self, report: &Report) -> Result<()> {
        if report.is_empty() && !self.include_empty {
            return Ok(());
        }
        let ts = report.timestamp.as_deref().unwrap_or("no timestamp");
        writeln!(self.out, "--- reading #{} ({}) ---", report.index, ts)?;
        if report.is_empty() {
            writeln!(self.out, "  no anomalies")?;
        }
        for finding in &report.findings {
            match &finding.context {
                Some(context) => writeln!(
                    self.out,
                    "  [{}] {}={} ({}): {}",
                    finding.kind, finding.parameter, finding.value, context, finding.message
                )?,
                None => writeln!(
                    self.out,
                    "  [{}] {}={}: {}",
                    finding.kind, finding.parameter, finding.value, finding.message
                )?,
            }
        }
        Ok(())
    }

    fn finish(&mut self, summary: &RunSummary) -> Result<()> {
        writeln!(
            self.out,
            "processed {} readings, {} with anomalies",
            summary.readings, summary.reported
        )?;
        for (kind, count) in &summary.findings_by_kind {
            writeln!(self.out, "  {kind}: {count}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One JSON object per report, newline-delimited.
pub struct JsonLinesSink<W: Write> {
    out: W,
    include_empty: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W, include_empty: bool) -> Self {
        Self { out, include_empty }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn emit(&mut self, report: &Report) -> Result<()> {
        if report.is_empty() && !self.include_empty {
            return Ok(());
        }
        serde_json::to_writer(&mut self.out, report)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, _summary: &RunSummary) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

pub fn build_sink<W: Write + 'static>(
    format: ReportFormat,
    include_empty: bool,
    out: W,
) -> Box<dyn ReportSink> {
    match format {
        ReportFormat::Text => Box::new(TextSink::new(out, include_empty)),
        ReportFormat::Json => Box::new(JsonLinesSink::new(out, include_empty)),
    }
}
