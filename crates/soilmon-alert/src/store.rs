//! Region/parameter-indexed rule storage, built once from a CSV rule source.

use crate::error::{AlertError, Result, RuleRowError};
use crate::rules::{Bounds, ContextualRule, Messages, PointRule, Rule};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// One row of the rule source. Empty cells deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleRow {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub parameter: String,
    #[serde(default)]
    pub rule_type: String,
    #[serde(default)]
    pub low_threshold: Option<f64>,
    #[serde(default)]
    pub high_threshold: Option<f64>,
    #[serde(default)]
    pub message_low: Option<String>,
    #[serde(default)]
    pub message_high: Option<String>,
    #[serde(default)]
    pub context_name: Option<String>,
    #[serde(default)]
    pub months: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
}

/// All rules for one (region, parameter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamRules {
    pub point: Option<PointRule>,
    pub contextual: Vec<ContextualRule>,
}

/// Borrowed view returned by [`RuleStore::lookup`]; empty for unknown keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleLookup<'a> {
    pub point: Option<&'a PointRule>,
    pub contextual: &'a [ContextualRule],
}

impl RuleLookup<'_> {
    pub fn is_empty(&self) -> bool {
        self.point.is_none() && self.contextual.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows: usize,
    pub point_rules: usize,
    pub contextual_rules: usize,
    pub skipped: usize,
}

/// Read-only rule index: region -> parameter -> rules.
///
/// # Examples
///
/// ```
/// use soilmon_alert::store::RuleStore;
///
/// let csv = "\
/// region,parameter,rule_type,low_threshold,high_threshold,message_low,message_high,context_name,months,hours
/// temperate,soil_temperature,point,5,35,Too cold,Too hot,,,
/// ";
/// let store = RuleStore::from_reader(csv.as_bytes()).unwrap();
/// assert!(store.lookup("temperate", "soil_temperature").point.is_some());
/// assert!(store.lookup("arctic", "soil_temperature").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    regions: BTreeMap<String, BTreeMap<String, ParamRules>>,
    summary: LoadSummary,
}

impl RuleStore {
    /// Loads rules from a CSV file. A missing or unreadable file is fatal;
    /// a file with no usable rows yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| AlertError::RuleSource {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::info!(
            path = %path.display(),
            regions = store.regions.len(),
            point_rules = store.summary.point_rules,
            contextual_rules = store.summary.contextual_rules,
            skipped = store.summary.skipped,
            "Rule source loaded"
        );
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        // Fail early on a broken header instead of skipping every row.
        csv_reader.headers()?;

        let mut builder = RuleStoreBuilder::default();
        for (idx, result) in csv_reader.deserialize::<RuleRow>().enumerate() {
            let row_no = idx + 1;
            match result {
                Ok(row) => builder.add_row(row_no, &row),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => builder.reject(row_no, &RuleRowError::Unparsable(e.to_string())),
            }
        }
        Ok(builder.build())
    }

    /// Rules for `(region, parameter)`. Never fails; unknown keys give an
    /// empty lookup.
    pub fn lookup(&self, region: &str, parameter: &str) -> RuleLookup<'_> {
        match self.regions.get(region).and_then(|r| r.get(parameter)) {
            Some(rules) => RuleLookup {
                point: rules.point.as_ref(),
                contextual: &rules.contextual,
            },
            None => RuleLookup {
                point: None,
                contextual: &[],
            },
        }
    }

    /// All parameter rules of a region, ordered by parameter name.
    pub fn region(&self, region: &str) -> Option<&BTreeMap<String, ParamRules>> {
        self.regions.get(region)
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Total number of rules across all regions.
    pub fn len(&self) -> usize {
        self.summary.point_rules + self.summary.contextual_rules
    }

    /// Number of rules defined for `region`, or 0 if unknown.
    pub fn region_rule_count(&self, region: &str) -> usize {
        self.regions.get(region).map_or(0, |params| {
            params
                .values()
                .map(|p| usize::from(p.point.is_some()) + p.contextual.len())
                .sum()
        })
    }

    pub fn summary(&self) -> LoadSummary {
        self.summary
    }
}

/// Accumulates typed rules into a [`RuleStore`], rejecting rows that do not
/// describe a usable rule.
#[derive(Debug, Default)]
pub struct RuleStoreBuilder {
    regions: BTreeMap<String, BTreeMap<String, ParamRules>>,
    summary: LoadSummary,
}

impl RuleStoreBuilder {
    /// Parses and inserts one row, logging and counting it if rejected.
    pub fn add_row(&mut self, row_no: usize, row: &RuleRow) {
        match build_rule_from_row(row).and_then(|rule| self.insert(&row.region, rule)) {
            Ok(()) => self.summary.rows += 1,
            Err(e) => self.reject(row_no, &e),
        }
    }

    pub fn insert(&mut self, region: &str, rule: Rule) -> std::result::Result<(), RuleRowError> {
        let params = self.regions.entry(region.to_string()).or_default();
        let entry = params.entry(rule.parameter().to_string()).or_default();
        match rule {
            Rule::Point(point) => {
                if entry.point.is_some() {
                    return Err(RuleRowError::DuplicatePoint {
                        region: region.to_string(),
                        parameter: point.parameter,
                    });
                }
                entry.point = Some(point);
                self.summary.point_rules += 1;
            }
            Rule::Contextual(ctx) => {
                if !ctx.has_window() {
                    tracing::warn!(
                        region,
                        parameter = %ctx.parameter,
                        context = %ctx.name,
                        "Contextual rule has no months or hours and will never activate"
                    );
                }
                entry.contextual.push(ctx);
                self.summary.contextual_rules += 1;
            }
        }
        Ok(())
    }

    fn reject(&mut self, row_no: usize, error: &RuleRowError) {
        self.summary.rows += 1;
        self.summary.skipped += 1;
        tracing::warn!(row = row_no, error = %error, "Skipping invalid rule row");
    }

    pub fn build(self) -> RuleStore {
        RuleStore {
            regions: self.regions,
            summary: self.summary,
        }
    }
}

/// Converts one source row into a typed [`Rule`].
pub fn build_rule_from_row(row: &RuleRow) -> std::result::Result<Rule, RuleRowError> {
    if row.region.is_empty() {
        return Err(RuleRowError::MissingField("region"));
    }
    if row.parameter.is_empty() {
        return Err(RuleRowError::MissingField("parameter"));
    }
    let bounds = Bounds {
        low: row.low_threshold,
        high: row.high_threshold,
    };
    let messages = Messages {
        low: row.message_low.clone(),
        high: row.message_high.clone(),
    };
    match row.rule_type.to_lowercase().as_str() {
        "point" => Ok(Rule::Point(PointRule {
            parameter: row.parameter.clone(),
            bounds,
            messages,
        })),
        "contextual" => {
            let name = row
                .context_name
                .clone()
                .ok_or(RuleRowError::MissingField("context_name"))?;
            Ok(Rule::Contextual(ContextualRule {
                name,
                parameter: row.parameter.clone(),
                months: parse_list(row.months.as_deref(), "months", 1, 12)?,
                hours: parse_list(row.hours.as_deref(), "hours", 0, 23)?,
                bounds,
                messages,
            }))
        }
        "" => Err(RuleRowError::MissingField("rule_type")),
        _ => Err(RuleRowError::UnknownRuleType(row.rule_type.clone())),
    }
}

/// Parses a comma-separated integer list. `None` when the cell is empty.
fn parse_list(
    raw: Option<&str>,
    field: &'static str,
    min: u32,
    max: u32,
) -> std::result::Result<Option<BTreeSet<u32>>, RuleRowError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let mut set = BTreeSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let value = token
            .parse::<u32>()
            .ok()
            .filter(|v| (min..=max).contains(v))
            .ok_or_else(|| RuleRowError::InvalidList {
                field,
                token: token.to_string(),
                min,
                max,
            })?;
        set.insert(value);
    }
    Ok((!set.is_empty()).then_some(set))
}
