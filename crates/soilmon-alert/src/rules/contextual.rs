use crate::rules::{Bounds, Messages};
use crate::AnomalyRule;
use soilmon_common::types::{Calendar, FindingKind};
use std::collections::BTreeSet;

/// Threshold that only applies during certain months and/or hours.
///
/// The rule is active when the reading's month is listed **or** its hour is
/// listed. A rule with neither list never activates.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextualRule {
    pub name: String,
    pub parameter: String,
    pub months: Option<BTreeSet<u32>>,
    pub hours: Option<BTreeSet<u32>>,
    pub bounds: Bounds,
    pub messages: Messages,
}

impl ContextualRule {
    pub fn has_window(&self) -> bool {
        self.months.is_some() || self.hours.is_some()
    }
}

impl AnomalyRule for ContextualRule {
    fn parameter(&self) -> &str {
        &self.parameter
    }

    fn kind(&self) -> FindingKind {
        FindingKind::Contextual
    }

    fn context(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn messages(&self) -> &Messages {
        &self.messages
    }

    fn is_active(&self, calendar: &Calendar) -> bool {
        let month_match = self
            .months
            .as_ref()
            .is_some_and(|m| m.contains(&calendar.month));
        let hour_match = self
            .hours
            .as_ref()
            .is_some_and(|h| h.contains(&calendar.hour));
        month_match || hour_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soilmon_common::types::parse_timestamp;

    fn night_heat() -> ContextualRule {
        ContextualRule {
            name: "Night heat".into(),
            parameter: "soil_temperature".into(),
            months: Some([6, 7].into_iter().collect()),
            hours: Some([0, 1, 2, 3].into_iter().collect()),
            bounds: Bounds {
                low: None,
                high: Some(30.0),
            },
            messages: Messages::default(),
        }
    }

    fn at(ts: &str) -> Calendar {
        Calendar::from(parse_timestamp(ts).unwrap())
    }

    #[test]
    fn activates_on_month_or_hour() {
        let rule = night_heat();
        // month matches, hour does not
        assert!(rule.is_active(&at("2025-06-25T14:00:00")));
        // hour matches, month does not
        assert!(rule.is_active(&at("2025-01-10T02:00:00")));
        // neither
        assert!(!rule.is_active(&at("2025-01-10T14:00:00")));
    }

    #[test]
    fn rule_without_window_never_activates() {
        let rule = ContextualRule {
            months: None,
            hours: None,
            ..night_heat()
        };
        assert!(!rule.has_window());
        assert!(!rule.is_active(&at("2025-06-25T02:00:00")));
        assert!(rule.evaluate(99.0, &at("2025-06-25T02:00:00")).is_none());
    }

    #[test]
    fn evaluate_carries_rule_name_as_context() {
        let finding = night_heat()
            .evaluate(34.0, &at("2025-06-25T02:00:00"))
            .unwrap();
        assert_eq!(finding.kind, FindingKind::Contextual);
        assert_eq!(finding.context.as_deref(), Some("Night heat"));
        assert_eq!(
            finding.message,
            "soil_temperature 34 above high threshold 30"
        );
    }
}
