//! Validation rules attached to schema fields.
//!
//! Rules are normally built directly as [`Rule`] values when a schema is
//! declared. The textual forms (`within(1,60)`, `oneOf(a,b)`,
//! `readableDirectory`, `writeableDirectory`) can be parsed with
//! [`Rule::parse`] for schemas declared from text.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::schema::FieldKind;
use super::ConfigError;

/// A single validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Integer must satisfy `low <= v <= high`.
    Within { low: i64, high: i64 },
    /// String must equal one of the listed values.
    OneOf(Vec<String>),
    /// String must name an existing directory whose entries can be listed.
    ReadableDirectory,
    /// String must name a directory in which a file can be created and removed.
    WriteableDirectory,
}

impl Rule {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// The field kind this rule applies to.
    pub fn applies_to(&self) -> FieldKind {
        match self {
            Rule::Within { .. } => FieldKind::Int,
            Rule::OneOf(_) | Rule::ReadableDirectory | Rule::WriteableDirectory => {
                FieldKind::String
            }
        }
    }

    /// Parses a textual rule expression for the field `key`.
    pub fn parse(key: &str, expr: &str) -> Result<Self, ConfigError> {
        let expr = expr.trim();
        let unsupported = || ConfigError::UnsupportedRule {
            key: key.to_string(),
            rule: expr.to_string(),
        };

        match expr {
            "readableDirectory" => return Ok(Rule::ReadableDirectory),
            "writeableDirectory" => return Ok(Rule::WriteableDirectory),
            _ => {}
        }

        if let Some(caps) = within_pattern().captures(expr) {
            let low: i64 = caps[1].parse().map_err(|_| unsupported())?;
            let high: i64 = caps[2].parse().map_err(|_| unsupported())?;
            if low > high {
                return Err(unsupported());
            }
            return Ok(Rule::Within { low, high });
        }

        if let Some(list) = expr
            .strip_prefix("oneOf(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let values: Vec<String> = list.split(',').map(|v| v.trim().to_string()).collect();
            if values.iter().any(String::is_empty) {
                return Err(unsupported());
            }
            return Ok(Rule::OneOf(values));
        }

        Err(unsupported())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Within { low, high } => write!(f, "within({low},{high})"),
            Rule::OneOf(values) => write!(f, "oneOf({})", values.join(",")),
            Rule::ReadableDirectory => f.write_str("readableDirectory"),
            Rule::WriteableDirectory => f.write_str("writeableDirectory"),
        }
    }
}

/// Compiled once on first use and shared afterwards.
fn within_pattern() -> &'static Regex {
    static WITHIN: OnceLock<Regex> = OnceLock::new();
    WITHIN.get_or_init(|| {
        Regex::new(r"^within\(\s*([-+]?\d+)\s*,\s*([-+]?\d+)\s*\)$")
            .expect("within pattern is a valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_within() {
        assert_eq!(
            Rule::parse("timeout_seconds", "within(5,3600)").unwrap(),
            Rule::Within { low: 5, high: 3600 }
        );
        assert_eq!(
            Rule::parse("offset", "within( -10 , +10 )").unwrap(),
            Rule::Within { low: -10, high: 10 }
        );
    }

    #[test]
    fn test_parse_one_of_and_directories() {
        assert_eq!(
            Rule::parse("log_level", "oneOf(debug,info, warn,error)").unwrap(),
            Rule::one_of(["debug", "info", "warn", "error"])
        );
        assert_eq!(
            Rule::parse("var_dir", "writeableDirectory").unwrap(),
            Rule::WriteableDirectory
        );
        assert_eq!(
            Rule::parse("config_dir", "readableDirectory").unwrap(),
            Rule::ReadableDirectory
        );
    }

    #[test]
    fn test_parse_rejects_unknown_expressions() {
        for expr in ["between(1,2)", "within(1)", "within(9,1)", "oneOf()", "oneOf(a,,b)", ""] {
            let result = Rule::parse("field", expr);
            assert!(
                matches!(result, Err(ConfigError::UnsupportedRule { .. })),
                "{expr:?} should be unsupported"
            );
        }
    }

    #[test]
    fn test_display_matches_parse() {
        for rule in [
            Rule::Within { low: 1, high: 60 },
            Rule::one_of(["a", "b"]),
            Rule::ReadableDirectory,
            Rule::WriteableDirectory,
        ] {
            assert_eq!(Rule::parse("k", &rule.to_string()).unwrap(), rule);
        }
    }
}
