use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found or not readable: {path}: {source}")]
    NotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid line {line} in '{path}': {content:?}: {reason}")]
    Syntax {
        path: PathBuf,
        line: usize,
        content: String,
        reason: SyntaxReason,
    },

    #[error("missing required key: {0}")]
    MissingRequiredKey(String),

    #[error("invalid integer for key {key}: {value:?}")]
    TypeCoercion { key: String, value: String },

    #[error("unknown keys: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    #[error("field {key} must be within {low} and {high}, but is {value}")]
    OutOfRange {
        key: String,
        low: i64,
        high: i64,
        value: i64,
    },

    #[error("field {key} must be one of [{}], but is {value:?}", .allowed.join(", "))]
    NotOneOf {
        key: String,
        allowed: Vec<String>,
        value: String,
    },

    #[error("field {key} must be a {access} directory, but {path}: {detail}")]
    Permission {
        key: String,
        path: PathBuf,
        access: Access,
        detail: String,
    },

    #[error("validation rule {rule:?} not supported for field {key}")]
    UnsupportedRule { key: String, rule: String },

    #[error("{path}: {source}")]
    InFile {
        path: PathBuf,
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attaches the path of the file being loaded to this error.
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Reader errors already carry their path.
            e @ (ConfigError::NotFound { .. }
            | ConfigError::Read { .. }
            | ConfigError::Syntax { .. }
            | ConfigError::InFile { .. }) => e,
            e => ConfigError::InFile {
                path: path.into(),
                source: Box::new(e),
            },
        }
    }

    /// The schema key this error is about, if it concerns a single key.
    ///
    /// For unknown keys this is the first one reported.
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::MissingRequiredKey(key)
            | ConfigError::TypeCoercion { key, .. }
            | ConfigError::OutOfRange { key, .. }
            | ConfigError::NotOneOf { key, .. }
            | ConfigError::Permission { key, .. }
            | ConfigError::UnsupportedRule { key, .. } => Some(key),
            ConfigError::UnknownKeys(keys) => keys.first().map(String::as_str),
            ConfigError::InFile { source, .. } => source.key(),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through any file context.
    pub fn root(&self) -> &ConfigError {
        match self {
            ConfigError::InFile { source, .. } => source.root(),
            e => e,
        }
    }
}

/// Why a flat file line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    MissingEquals,
    EmptyKey,
    EmptyValue,
    KeyContainsWhitespace,
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyntaxReason::MissingEquals => "no '=' found",
            SyntaxReason::EmptyKey => "key is empty",
            SyntaxReason::EmptyValue => "value is empty",
            SyntaxReason::KeyContainsWhitespace => "key contains whitespace",
        })
    }
}

/// The kind of directory access a rule demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Readable,
    Writeable,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Readable => "readable",
            Access::Writeable => "writeable",
        })
    }
}
