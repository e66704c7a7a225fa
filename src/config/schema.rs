//! Static field tables describing how a typed object maps to flat keys.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Each spec names the
//! external key, whether it is required, an optional validation [`Rule`], and
//! a pair of accessors that read and write the field on the target type. The
//! accessor pair fixes the field's [`FieldKind`], so the mapper never has to
//! inspect the target type at runtime.

use std::fmt;

use super::file::RawMapping;
use super::rule::Rule;

/// The value kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    String,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Int => "integer",
            FieldKind::String => "string",
        })
    }
}

/// A borrowed view of a field's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Int(i64),
    Str(&'a str),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

enum Accessor<T> {
    Int {
        get: fn(&T) -> i64,
        set: fn(&mut T, i64),
    },
    Str {
        get: fn(&T) -> &str,
        set: fn(&mut T, String),
    },
}

/// Describes one field of a schema.
pub struct FieldSpec<T> {
    key: &'static str,
    required: bool,
    rule: Option<Rule>,
    accessor: Accessor<T>,
}

impl<T> FieldSpec<T> {
    /// Declares an integer field.
    pub fn int(key: &'static str, get: fn(&T) -> i64, set: fn(&mut T, i64)) -> Self {
        Self {
            key,
            required: false,
            rule: None,
            accessor: Accessor::Int { get, set },
        }
    }

    /// Declares a string field.
    pub fn string(key: &'static str, get: fn(&T) -> &str, set: fn(&mut T, String)) -> Self {
        Self {
            key,
            required: false,
            rule: None,
            accessor: Accessor::Str { get, set },
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attaches a validation rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn validation_rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    pub fn kind(&self) -> FieldKind {
        match self.accessor {
            Accessor::Int { .. } => FieldKind::Int,
            Accessor::Str { .. } => FieldKind::String,
        }
    }

    /// Reads the field from `target`.
    pub fn value<'a>(&self, target: &'a T) -> FieldValue<'a> {
        match &self.accessor {
            Accessor::Int { get, .. } => FieldValue::Int(get(target)),
            Accessor::Str { get, .. } => FieldValue::Str(get(target)),
        }
    }

    pub(crate) fn set_int(&self, target: &mut T, value: i64) -> bool {
        match &self.accessor {
            Accessor::Int { set, .. } => {
                set(target, value);
                true
            }
            Accessor::Str { .. } => false,
        }
    }

    pub(crate) fn set_string(&self, target: &mut T, value: String) -> bool {
        match &self.accessor {
            Accessor::Str { set, .. } => {
                set(target, value);
                true
            }
            Accessor::Int { .. } => false,
        }
    }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("kind", &self.kind())
            .field("required", &self.required)
            .field("rule", &self.rule)
            .finish()
    }
}

/// An ordered, immutable field table for `T`.
pub struct Schema<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> Schema<T> {
    pub fn new(fields: Vec<FieldSpec<T>>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Renders every field of `target` back into its external string form.
    pub fn render(&self, target: &T) -> RawMapping {
        self.fields
            .iter()
            .map(|f| (f.key.to_string(), f.value(target).to_string()))
            .collect()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

/// A type with a statically declared schema.
///
/// Implementors build their schema once, usually behind a `OnceLock`, and
/// hand out the same reference on every call.
pub trait Schematic: Clone + Sized + 'static {
    fn schema() -> &'static Schema<Self>;
}
