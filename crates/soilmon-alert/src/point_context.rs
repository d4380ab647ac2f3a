//! Stage 1: point and contextual threshold checks for a single reading.

use crate::store::RuleStore;
use crate::AnomalyRule;
use soilmon_common::types::{Finding, Reading, ReadingError};

/// Evaluates `reading` against the rules of its region.
///
/// A reading whose timestamp is missing or unparsable, or whose region is
/// missing or unknown, yields exactly one `error` finding and nothing else.
/// Otherwise every parameter that has both a value and rules is checked:
/// at most one point finding and any number of contextual findings per
/// parameter. Parameters without a value or without rules are skipped.
///
/// Pure: the same inputs always give the same findings.
pub fn evaluate(reading: &Reading, rules: &RuleStore) -> Vec<Finding> {
    let calendar = match reading.calendar() {
        Ok(calendar) => calendar,
        Err(e) => return vec![malformed(reading, &e)],
    };

    let Some(region) = reading.region.as_deref() else {
        return vec![malformed(reading, &ReadingError::MissingField("region"))];
    };

    let Some(region_rules) = rules.region(region) else {
        return vec![Finding::error(
            "region",
            region,
            format!("Region '{region}' not found in rules database."),
        )];
    };

    let mut findings = Vec::new();
    for (parameter, param_rules) in region_rules {
        let Some(value) = reading.value(parameter) else {
            continue;
        };

        if let Some(point) = &param_rules.point {
            findings.extend(point.evaluate(value, &calendar));
        }

        findings.extend(
            param_rules
                .contextual
                .iter()
                .filter_map(|rule| rule.evaluate(value, &calendar)),
        );
    }
    findings
}

fn malformed(reading: &Reading, error: &ReadingError) -> Finding {
    Finding::error(
        "metadata",
        reading.to_string(),
        format!("Invalid sensor reading format: {error}"),
    )
}
