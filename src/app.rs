//! The daemon's own configuration file.

use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::config::{
    ConfigError, FieldSpec, Loader, RawMapping, Resolved, Rule, Schema, Schematic, Source,
};

/// Where the application config file lives unless the caller says otherwise.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kamonitu/kamonitu.ini";

const CHECK_DEFINITIONS_SUBDIR: &str = "check_definitions";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub var_dir: String,
    pub config_dir: String,
    pub log_dir: String,
    pub log_level: String,
    pub interval_seconds_between_main_loop_runs: i64,
    pub check_definitions_dir: String,
}

type Field = FieldSpec<AppConfig>;

impl Schematic for AppConfig {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<AppConfig>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(vec![
                Field::string("var_dir", |c| c.var_dir.as_str(), |c, v| c.var_dir = v)
                    .required()
                    .rule(Rule::WriteableDirectory),
                Field::string("config_dir", |c| c.config_dir.as_str(), |c, v| c.config_dir = v)
                    .required()
                    .rule(Rule::ReadableDirectory),
                Field::string("log_dir", |c| c.log_dir.as_str(), |c, v| c.log_dir = v)
                    .required()
                    .rule(Rule::WriteableDirectory),
                Field::string("log_level", |c| c.log_level.as_str(), |c, v| c.log_level = v)
                    .rule(Rule::one_of(["debug", "info", "warn", "error"])),
                Field::int(
                    "interval_seconds_between_main_loop_runs",
                    |c| c.interval_seconds_between_main_loop_runs,
                    |c, v| c.interval_seconds_between_main_loop_runs = v,
                )
                .rule(Rule::Within { low: 1, high: 60 }),
                Field::string(
                    "check_definitions_dir",
                    |c| c.check_definitions_dir.as_str(),
                    |c, v| c.check_definitions_dir = v,
                )
                .rule(Rule::ReadableDirectory),
            ])
        })
    }
}

impl AppConfig {
    /// Values used for any key the config file leaves out.
    pub fn hardcoded_defaults() -> RawMapping {
        [
            ("var_dir", "/var/lib/kamonitu"),
            ("config_dir", "/etc/kamonitu"),
            ("log_dir", "/var/log/kamonitu"),
            ("log_level", "warn"),
            ("interval_seconds_between_main_loop_runs", "60"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// `<config_dir>/check_definitions`, for configs that don't name their
    /// check definitions directory.
    pub fn derive_check_definitions_dir(merged: &RawMapping) -> Option<String> {
        let config_dir = merged.get("config_dir")?;
        let derived = Path::new(config_dir).join(CHECK_DEFINITIONS_SUBDIR);
        Some(derived.to_string_lossy().into_owned())
    }

    /// The loading pipeline for the config file at `path`: hardcoded
    /// defaults, then the required file, then the derived check directory.
    pub fn loader(path: impl AsRef<Path>) -> Loader {
        Loader::new()
            .with_defaults(Self::hardcoded_defaults(), Source::Hardcoded)
            .with_file(path, true, Source::IniFile)
            .with_derived(
                "check_definitions_dir",
                Self::derive_check_definitions_dir,
                Source::Hardcoded,
            )
    }

    /// Loads and validates the application config from `path`.
    ///
    /// The file must exist. `check_definitions_dir` defaults to
    /// `<config_dir>/check_definitions` when the file doesn't set it.
    pub fn load(path: impl AsRef<Path>) -> Result<Resolved<AppConfig>, ConfigError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading application config file");
        let resolved = Self::loader(path).load(&AppConfig::default())?;
        tracing::debug!(path = %path.display(), config = ?resolved.value, "application config loaded");
        Ok(resolved)
    }
}
