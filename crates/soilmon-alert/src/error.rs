/// Errors that stop detection from starting.
///
/// Per-reading problems (bad timestamp, unknown region) are not errors at
/// this level; they surface as `error`-kind findings in the report.
///
/// # Examples
///
/// ```rust
/// use soilmon_alert::error::AlertError;
///
/// let err = AlertError::InvalidConfig {
///     name: "window_size",
///     reason: "must be positive".to_string(),
/// };
/// assert!(err.to_string().contains("window_size"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The rule source is missing or unreadable. Nothing can be evaluated.
    #[error("Rules: cannot read rule source '{path}': {source}")]
    RuleSource {
        path: String,
        source: std::io::Error,
    },

    /// The rule source could be opened but its CSV framing is broken
    /// (bad header, I/O failure mid-file).
    #[error("Rules: malformed rule source: {0}")]
    Csv(#[from] csv::Error),

    /// A detector setting is out of range.
    #[error("Config: invalid {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
}

/// Convenience `Result` alias for detection setup.
pub type Result<T> = std::result::Result<T, AlertError>;

/// Why a single rule row was not admitted into the store. Rows are loaded
/// best-effort, so these are logged and skipped rather than returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleRowError {
    #[error("missing required column '{0}'")]
    MissingField(&'static str),

    #[error("unknown rule_type '{0}'")]
    UnknownRuleType(String),

    #[error("invalid {field} entry '{token}': expected an integer in {min}..={max}")]
    InvalidList {
        field: &'static str,
        token: String,
        min: u32,
        max: u32,
    },

    #[error("duplicate point rule for {region}/{parameter}, keeping the first one")]
    DuplicatePoint { region: String, parameter: String },

    #[error("unparsable row: {0}")]
    Unparsable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_source_display_names_path() {
        let err = AlertError::RuleSource {
            path: "missing.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn invalid_list_display() {
        let err = RuleRowError::InvalidList {
            field: "months",
            token: "13".into(),
            min: 1,
            max: 12,
        };
        assert_eq!(
            err.to_string(),
            "invalid months entry '13': expected an integer in 1..=12"
        );
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlertError>();
        assert_send_sync::<RuleRowError>();
    }
}
