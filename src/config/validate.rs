//! Rule evaluation for mapped objects.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::error::Access;
use super::rule::Rule;
use super::schema::{FieldValue, Schema};
use super::ConfigError;

const WRITE_CHECK_NAME: &str = ".tmp_write_test";

/// Checks every field rule of `target` in schema order.
///
/// Stops at the first violation.
pub fn validate<T>(schema: &Schema<T>, target: &T) -> Result<(), ConfigError> {
    for field in schema.fields() {
        let Some(rule) = field.validation_rule() else {
            continue;
        };
        let key = field.key();
        let value = field.value(target);
        tracing::trace!(field = key, %rule, %value, "checking rule");

        match (rule, value) {
            (Rule::Within { low, high }, FieldValue::Int(v)) => {
                if v < *low || v > *high {
                    return Err(ConfigError::OutOfRange {
                        key: key.to_string(),
                        low: *low,
                        high: *high,
                        value: v,
                    });
                }
            }
            (Rule::OneOf(allowed), FieldValue::Str(v)) => {
                if !allowed.iter().any(|a| a == v) {
                    return Err(ConfigError::NotOneOf {
                        key: key.to_string(),
                        allowed: allowed.clone(),
                        value: v.to_string(),
                    });
                }
            }
            (Rule::ReadableDirectory, FieldValue::Str(v)) => check_readable(key, Path::new(v))?,
            (Rule::WriteableDirectory, FieldValue::Str(v)) => check_writeable(key, Path::new(v))?,
            (rule, _) => {
                return Err(ConfigError::UnsupportedRule {
                    key: key.to_string(),
                    rule: rule.to_string(),
                })
            }
        }
    }

    Ok(())
}

fn permission(key: &str, path: &Path, access: Access, detail: impl Into<String>) -> ConfigError {
    ConfigError::Permission {
        key: key.to_string(),
        path: path.to_path_buf(),
        access,
        detail: detail.into(),
    }
}

fn check_directory(key: &str, path: &Path, access: Access) -> Result<(), ConfigError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(permission(key, path, access, "not a directory")),
        Err(e) => Err(permission(key, path, access, format!("not accessible: {e}"))),
    }
}

fn check_readable(key: &str, path: &Path) -> Result<(), ConfigError> {
    check_directory(key, path, Access::Readable)?;

    let mut entries =
        fs::read_dir(path).map_err(|e| permission(key, path, Access::Readable, e.to_string()))?;
    if let Some(Err(e)) = entries.next() {
        return Err(permission(key, path, Access::Readable, e.to_string()));
    }
    Ok(())
}

/// Creates, writes and removes a scratch file. Permission bits alone don't
/// account for ACLs or read-only mounts.
fn check_writeable(key: &str, path: &Path) -> Result<(), ConfigError> {
    check_directory(key, path, Access::Writeable)?;

    let scratch = path.join(WRITE_CHECK_NAME);
    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&scratch)
        .and_then(|mut file| file.write_all(b"kamonitu"));
    if let Err(e) = written {
        // The file may exist even though the write failed.
        let _ = fs::remove_file(&scratch);
        return Err(permission(key, path, Access::Writeable, e.to_string()));
    }

    fs::remove_file(&scratch).map_err(|e| {
        permission(
            key,
            path,
            Access::Writeable,
            format!("write check file could not be removed: {e}"),
        )
    })
}
