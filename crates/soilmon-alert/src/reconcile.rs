//! Merges Stage 1 and Stage 2 findings into the final report of a reading.
//!
//! Contextual findings are reported as-is. Point findings are reported only
//! when the statistical stage flagged the same parameter; unconfirmed ones
//! are dropped. Statistical findings never appear on their own.

use soilmon_common::types::{Finding, FindingKind};
use std::collections::HashSet;

/// Appended to the message of a point finding confirmed by the z-score stage.
pub const REINFORCED_SUFFIX: &str = " (reinforced by statistical check)";

/// Whether the statistical stage is worth running for these findings.
pub fn needs_statistics(rule_findings: &[Finding]) -> bool {
    rule_findings.iter().any(|f| f.kind == FindingKind::Point)
}

/// Final report for one reading: contextual findings first, then the
/// reinforced point findings, each group in Stage 1 order. Error findings
/// are not handled here.
pub fn reconcile(rule_findings: Vec<Finding>, statistical: &[Finding]) -> Vec<Finding> {
    let flagged: HashSet<&str> = statistical
        .iter()
        .filter(|f| f.kind == FindingKind::Statistical)
        .map(|f| f.parameter.as_str())
        .collect();

    let mut contextual = Vec::new();
    let mut reinforced = Vec::new();
    for mut finding in rule_findings {
        match finding.kind {
            FindingKind::Contextual => contextual.push(finding),
            FindingKind::Point if flagged.contains(finding.parameter.as_str()) => {
                finding.message.push_str(REINFORCED_SUFFIX);
                reinforced.push(finding);
            }
            FindingKind::Point => {
                tracing::debug!(
                    parameter = %finding.parameter,
                    value = %finding.value,
                    "Point finding not reinforced, dropped"
                );
            }
            FindingKind::Statistical | FindingKind::Error => {}
        }
    }
    contextual.extend(reinforced);
    contextual
}
