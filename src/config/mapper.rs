use super::file::RawMapping;
use super::schema::{FieldKind, Schema};
use super::ConfigError;

/// Builds a `T` from `raw`, starting from `defaults`.
///
/// Fields are processed in schema order. A required field missing from `raw`
/// fails immediately; optional fields missing from `raw` keep the value they
/// have in `defaults`. Once every field is processed, all keys the schema does
/// not know are reported together.
pub fn map<T: Clone>(schema: &Schema<T>, raw: &RawMapping, defaults: &T) -> Result<T, ConfigError> {
    let mut target = defaults.clone();

    for field in schema.fields() {
        let key = field.key();
        let Some(value) = raw.get(key) else {
            if field.is_required() {
                return Err(ConfigError::MissingRequiredKey(key.to_string()));
            }
            continue;
        };

        match field.kind() {
            FieldKind::Int => {
                let parsed = parse_int(value).ok_or_else(|| ConfigError::TypeCoercion {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
                field.set_int(&mut target, parsed);
            }
            FieldKind::String => {
                field.set_string(&mut target, value.clone());
            }
        }
    }

    let unknown: Vec<String> = raw
        .keys()
        .filter(|key| !schema.contains(key))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigError::UnknownKeys(unknown));
    }

    Ok(target)
}

/// Decimal integer with an optional sign; nothing else.
fn parse_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
