use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// One entity file that could not be loaded.
#[derive(Debug, Error)]
#[error("failed to load entity file {file:?}: {error}")]
pub struct EntityFailure {
    pub file: String,
    #[source]
    pub error: ConfigError,
}

/// Independent per-file failures collected during one scan, in file order.
#[derive(Debug, Default)]
pub struct AggregateError {
    failures: Vec<EntityFailure>,
}

impl AggregateError {
    pub(crate) fn push(&mut self, file: String, error: ConfigError) {
        self.failures.push(EntityFailure { file, error });
    }

    pub fn failures(&self) -> &[EntityFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the failure recorded for `file`, if any.
    pub fn get(&self, file: &str) -> Option<&ConfigError> {
        self.failures
            .iter()
            .find(|f| f.file == file)
            .map(|f| &f.error)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entity file(s) failed to load", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n  * {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl IntoIterator for AggregateError {
    type Item = EntityFailure;
    type IntoIter = std::vec::IntoIter<EntityFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read entity directory '{path}': {source}")]
    ListDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to load shared defaults: {0}")]
    Defaults(#[source] ConfigError),

    #[error("no valid entity files in '{directory}'")]
    NoEntities {
        directory: PathBuf,
        failures: AggregateError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_lists_every_failure() {
        let mut errors = AggregateError::default();
        errors.push("cpu.ini".into(), ConfigError::MissingRequiredKey("check_command".into()));
        errors.push(
            "disk.ini".into(),
            ConfigError::UnknownKeys(vec!["foo".into(), "bar".into()]),
        );

        let message = errors.to_string();
        assert!(message.starts_with("2 entity file(s) failed to load"));
        assert!(message.contains("\"cpu.ini\": missing required key: check_command"));
        assert!(message.contains("\"disk.ini\": unknown keys: foo, bar"));

        assert!(matches!(errors.get("cpu.ini"), Some(ConfigError::MissingRequiredKey(_))));
        assert!(errors.get("mem.ini").is_none());
    }
}
