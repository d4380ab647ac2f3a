pub mod contextual;
pub mod point;

pub use contextual::ContextualRule;
pub use point::PointRule;

/// Which side of a [`Bounds`] was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breach {
    Low,
    High,
}

/// Optional low/high limits. A missing side means no bound on that side.
///
/// # Examples
///
/// ```
/// use soilmon_alert::rules::{Bounds, Breach};
///
/// let bounds = Bounds { low: Some(5.0), high: None };
/// assert_eq!(bounds.breach(1.0), Some(Breach::Low));
/// assert_eq!(bounds.breach(1.0e9), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl Bounds {
    /// Low first, then high. Inverted bounds (low > high) still yield a
    /// single breach: whichever side is checked first wins.
    pub fn breach(&self, value: f64) -> Option<Breach> {
        if self.low.is_some_and(|low| value < low) {
            Some(Breach::Low)
        } else if self.high.is_some_and(|high| value > high) {
            Some(Breach::High)
        } else {
            None
        }
    }
}

/// Per-side messages from the rule source. Missing ones are synthesized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Messages {
    pub low: Option<String>,
    pub high: Option<String>,
}

impl Messages {
    pub fn render(&self, breach: Breach, parameter: &str, value: f64, bounds: &Bounds) -> String {
        let (configured, side, limit) = match breach {
            Breach::Low => (&self.low, "below low", bounds.low),
            Breach::High => (&self.high, "above high", bounds.high),
        };
        if let Some(msg) = configured {
            return msg.clone();
        }
        match limit {
            Some(limit) => format!("{parameter} {value} {side} threshold {limit}"),
            None => format!("{parameter} {value} {side} threshold"),
        }
    }
}

/// A parsed rule row, before it is placed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Point(PointRule),
    Contextual(ContextualRule),
}

impl Rule {
    pub fn parameter(&self) -> &str {
        match self {
            Rule::Point(r) => &r.parameter,
            Rule::Contextual(r) => &r.parameter,
        }
    }
}
