//! Two-stage anomaly detection for soil-sensor telemetry.
//!
//! Stage 1 checks each reading against region-scoped threshold rules
//! ([`point_context`]). Stage 2 is a sliding-window z-score test
//! ([`stats`]) that only runs to confirm point-rule violations. The
//! [`engine::StreamRunner`] owns the per-stream history and merges both
//! stages through [`reconcile`].

pub mod config;
pub mod engine;
pub mod error;
pub mod point_context;
pub mod reconcile;
pub mod rules;
pub mod stats;
pub mod store;
pub mod window;


use rules::{Bounds, Breach, Messages};
use soilmon_common::types::{Calendar, Finding, FindingKind, FindingValue};

/// A threshold rule bound to one parameter of one region.
///
/// Implementations decide *when* they apply ([`AnomalyRule::is_active`]);
/// the bound check and finding construction are shared. Rules are stored
/// in a [`store::RuleStore`] and evaluated by
/// [`point_context::evaluate`].
pub trait AnomalyRule: Send + Sync {
    /// The parameter this rule checks (e.g., `"soil_moisture"`).
    fn parameter(&self) -> &str;

    /// The kind of finding this rule produces.
    fn kind(&self) -> FindingKind;

    /// Context label carried on findings (the contextual rule name).
    fn context(&self) -> Option<&str>;

    fn bounds(&self) -> &Bounds;

    fn messages(&self) -> &Messages;

    /// Whether the rule applies at the given time.
    fn is_active(&self, calendar: &Calendar) -> bool;

    /// Checks `value` and returns a finding if the rule is active and a
    /// bound is violated. Low is checked before high, so at most one
    /// finding is produced per call.
    fn evaluate(&self, value: f64, calendar: &Calendar) -> Option<Finding> {
        if !self.is_active(calendar) {
            return None;
        }
        let breach: Breach = self.bounds().breach(value)?;
        Some(Finding {
            parameter: self.parameter().to_string(),
            value: FindingValue::Number(value),
            kind: self.kind(),
            context: self.context().map(str::to_string),
            message: self
                .messages()
                .render(breach, self.parameter(), value, self.bounds()),
        })
    }
}
