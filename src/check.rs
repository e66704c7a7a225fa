//! Monitoring check definitions.
//!
//! Each check lives in its own `<name>.ini` file inside the check definitions
//! directory. Values a check file leaves out come from the shared
//! `check_defaults.ini` in the config directory, and failing that from the
//! hardcoded defaults below.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::app::AppConfig;
use crate::config::{
    load_flat_file, map, validate, ConfigError, DefaultsCascade, FieldSpec, RawMapping, Rule,
    Schema, Schematic,
};
use crate::store::{EntityStore, StoreError};

/// Name of the shared defaults file inside the config directory.
pub const CHECK_DEFAULTS_FILE_NAME: &str = "check_defaults.ini";

const INTERVAL: Rule = Rule::Within { low: 5, high: 3600 };
const DELAY: Rule = Rule::Within { low: 0, high: 600 };
const TIMEOUT: Rule = Rule::Within { low: 1, high: 120 };
const STOP_AFTER_TIMEOUTS: Rule = Rule::Within { low: 1, high: 10 };

/// The timing settings every check inherits unless it overrides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDefinitionDefaults {
    pub interval_seconds_between_checks: i64,
    pub delay_seconds_before_first_check: i64,
    pub timeout_seconds: i64,
    pub stop_checking_after_number_of_timeouts: i64,
}

impl Default for CheckDefinitionDefaults {
    fn default() -> Self {
        Self {
            interval_seconds_between_checks: 120,
            delay_seconds_before_first_check: 0,
            timeout_seconds: 60,
            stop_checking_after_number_of_timeouts: 3,
        }
    }
}

impl Schematic for CheckDefinitionDefaults {
    fn schema() -> &'static Schema<Self> {
        type Field = FieldSpec<CheckDefinitionDefaults>;
        static SCHEMA: OnceLock<Schema<CheckDefinitionDefaults>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(vec![
                Field::int(
                    "interval_seconds_between_checks",
                    |d| d.interval_seconds_between_checks,
                    |d, v| d.interval_seconds_between_checks = v,
                )
                .rule(INTERVAL),
                Field::int(
                    "delay_seconds_before_first_check",
                    |d| d.delay_seconds_before_first_check,
                    |d, v| d.delay_seconds_before_first_check = v,
                )
                .rule(DELAY),
                Field::int(
                    "timeout_seconds",
                    |d| d.timeout_seconds,
                    |d, v| d.timeout_seconds = v,
                )
                .rule(TIMEOUT),
                Field::int(
                    "stop_checking_after_number_of_timeouts",
                    |d| d.stop_checking_after_number_of_timeouts,
                    |d, v| d.stop_checking_after_number_of_timeouts = v,
                )
                .rule(STOP_AFTER_TIMEOUTS),
            ])
        })
    }
}

impl CheckDefinitionDefaults {
    /// The bottom layer of the check defaults cascade.
    pub fn hardcoded() -> RawMapping {
        Self::schema().render(&Self::default())
    }
}

/// One check, as read from its definition file.
///
/// The timing fields of [`CheckDefinitionDefaults`] are flattened into this
/// type so that a check file can override each of them individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDefinition {
    pub check_command: String,
    pub interval_seconds_between_checks: i64,
    pub delay_seconds_before_first_check: i64,
    pub timeout_seconds: i64,
    pub stop_checking_after_number_of_timeouts: i64,
}

impl Default for CheckDefinition {
    fn default() -> Self {
        let d = CheckDefinitionDefaults::default();
        Self {
            check_command: String::new(),
            interval_seconds_between_checks: d.interval_seconds_between_checks,
            delay_seconds_before_first_check: d.delay_seconds_before_first_check,
            timeout_seconds: d.timeout_seconds,
            stop_checking_after_number_of_timeouts: d.stop_checking_after_number_of_timeouts,
        }
    }
}

impl Schematic for CheckDefinition {
    fn schema() -> &'static Schema<Self> {
        type Field = FieldSpec<CheckDefinition>;
        static SCHEMA: OnceLock<Schema<CheckDefinition>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(vec![
                Field::string(
                    "check_command",
                    |c| c.check_command.as_str(),
                    |c, v| c.check_command = v,
                )
                .required(),
                Field::int(
                    "interval_seconds_between_checks",
                    |c| c.interval_seconds_between_checks,
                    |c, v| c.interval_seconds_between_checks = v,
                )
                .rule(INTERVAL),
                Field::int(
                    "delay_seconds_before_first_check",
                    |c| c.delay_seconds_before_first_check,
                    |c, v| c.delay_seconds_before_first_check = v,
                )
                .rule(DELAY),
                Field::int(
                    "timeout_seconds",
                    |c| c.timeout_seconds,
                    |c, v| c.timeout_seconds = v,
                )
                .rule(TIMEOUT),
                Field::int(
                    "stop_checking_after_number_of_timeouts",
                    |c| c.stop_checking_after_number_of_timeouts,
                    |c, v| c.stop_checking_after_number_of_timeouts = v,
                )
                .rule(STOP_AFTER_TIMEOUTS),
            ])
        })
    }
}

/// Builds the check defaults cascade from the hardcoded values and an
/// optional shared defaults file.
///
/// A shared file that exists must itself be a valid set of check defaults:
/// unknown keys, non-integers and out-of-range values are rejected here
/// rather than failing every check file the same way.
pub fn load_check_defaults(path: impl AsRef<Path>) -> Result<DefaultsCascade, ConfigError> {
    let path = path.as_ref();
    let cascade = DefaultsCascade::new(CheckDefinitionDefaults::hardcoded());

    tracing::info!(path = %path.display(), "loading check definition defaults");
    let Some(shared) = load_flat_file(path, false)? else {
        tracing::warn!(path = %path.display(), "check definition defaults file not found");
        return Ok(cascade);
    };

    let schema = CheckDefinitionDefaults::schema();
    let defaults = map(schema, &shared, &CheckDefinitionDefaults::default())
        .and_then(|d| validate(schema, &d).map(|()| d))
        .map_err(|e| e.in_file(path))?;
    tracing::debug!(path = %path.display(), ?defaults, "check definition defaults loaded");

    Ok(cascade.with_shared(shared))
}

/// The store of check definition files.
pub type CheckDefinitionStore = EntityStore<CheckDefinition>;

impl EntityStore<CheckDefinition> {
    /// Opens the check store described by a validated application config.
    pub fn open(config: &AppConfig) -> Result<Self, StoreError> {
        let defaults_path = Path::new(&config.config_dir).join(CHECK_DEFAULTS_FILE_NAME);
        let cascade = load_check_defaults(&defaults_path).map_err(StoreError::Defaults)?;
        Ok(Self::new(
            &config.check_definitions_dir,
            cascade,
            CheckDefinition::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_hardcoded_defaults() {
        let hardcoded = CheckDefinitionDefaults::hardcoded();
        assert_eq!(hardcoded["interval_seconds_between_checks"], "120");
        assert_eq!(hardcoded["delay_seconds_before_first_check"], "0");
        assert_eq!(hardcoded["timeout_seconds"], "60");
        assert_eq!(hardcoded["stop_checking_after_number_of_timeouts"], "3");
        assert_eq!(hardcoded.len(), 4);
    }

    #[test]
    fn test_empty_defaults_file_keeps_hardcoded() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CHECK_DEFAULTS_FILE_NAME, "");

        let cascade = load_check_defaults(&path).unwrap();
        assert!(cascade.shared().is_empty());
        assert_eq!(cascade.hardcoded(), &CheckDefinitionDefaults::hardcoded());
    }

    #[test]
    fn test_defaults_file_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, CHECK_DEFAULTS_FILE_NAME, "interval_seconds_between_checks = 50\n");

        let cascade = load_check_defaults(&path).unwrap();
        let (merged, provenance) = cascade.resolve(&RawMapping::new());
        assert_eq!(merged["interval_seconds_between_checks"], "50");
        assert_eq!(merged["timeout_seconds"], "60");
        assert_eq!(
            provenance.get("interval_seconds_between_checks"),
            Some(Source::SharedDefaultFile)
        );
    }

    #[test]
    fn test_invalid_defaults_file() {
        let dir = TempDir::new().unwrap();

        let path = write(&dir, "bad_int.ini", "interval_seconds_between_checks = foo\n");
        let err = load_check_defaults(&path).unwrap_err();
        assert!(matches!(err.root(), ConfigError::TypeCoercion { .. }));

        let path = write(&dir, "bad_key.ini", "interval_seconds_between_checks = 30\nfoo = 30\n");
        let err = load_check_defaults(&path).unwrap_err();
        assert!(matches!(err.root(), ConfigError::UnknownKeys(keys) if keys == &["foo"]));

        let path = write(&dir, "bad_range.ini", "timeout_seconds = 0\n");
        let err = load_check_defaults(&path).unwrap_err();
        assert!(matches!(err.root(), ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_check_command_is_required() {
        let dir = TempDir::new().unwrap();
        write(&dir, "load.ini", "timeout_seconds = 10\n");

        let store = CheckDefinitionStore::new(
            dir.path(),
            DefaultsCascade::new(CheckDefinitionDefaults::hardcoded()),
            CheckDefinition::default(),
        );
        let err = store.load("load.ini").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredKey(ref key) if key == "check_command"));
    }

    #[test]
    fn test_open_from_app_config() {
        let root = TempDir::new().unwrap();
        let checks = root.path().join("checks");
        fs::create_dir(&checks).unwrap();
        fs::write(
            root.path().join(CHECK_DEFAULTS_FILE_NAME),
            "timeout_seconds = 30\n",
        )
        .unwrap();
        fs::write(checks.join("ping.ini"), "check_command = /bin/ping -c1 localhost\n").unwrap();

        let config = AppConfig {
            config_dir: root.path().to_string_lossy().into_owned(),
            check_definitions_dir: checks.to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let store = CheckDefinitionStore::open(&config).unwrap();
        let scan = store.scan().unwrap();

        let ping = &scan.entities["ping.ini"];
        assert_eq!(ping.value.timeout_seconds, 30);
        assert_eq!(ping.provenance.get("timeout_seconds"), Some(Source::SharedDefaultFile));
        assert_eq!(ping.provenance.get("check_command"), Some(Source::EntityFile));
    }

    #[test]
    fn test_open_rejects_broken_defaults() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join(CHECK_DEFAULTS_FILE_NAME), "oops\n").unwrap();

        let config = AppConfig {
            config_dir: root.path().to_string_lossy().into_owned(),
            check_definitions_dir: root.path().to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        assert!(matches!(
            CheckDefinitionStore::open(&config),
            Err(StoreError::Defaults(ConfigError::Syntax { .. }))
        ));
    }
}
