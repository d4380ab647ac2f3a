use crate::rules::{Bounds, Messages};
use crate::AnomalyRule;
use soilmon_common::types::{Calendar, FindingKind};

/// Static min/max threshold, active at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRule {
    pub parameter: String,
    pub bounds: Bounds,
    pub messages: Messages,
}

impl AnomalyRule for PointRule {
    fn parameter(&self) -> &str {
        &self.parameter
    }

    fn kind(&self) -> FindingKind {
        FindingKind::Point
    }

    fn context(&self) -> Option<&str> {
        None
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn messages(&self) -> &Messages {
        &self.messages
    }

    fn is_active(&self, _calendar: &Calendar) -> bool {
        true
    }
}
