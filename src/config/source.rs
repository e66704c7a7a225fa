use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::file::RawMapping;
use super::schema::Schema;

/// The layer that supplied a field's final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Hardcoded,
    SharedDefaultFile,
    EntityFile,
    IniFile,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Hardcoded => "hardcoded",
            Source::SharedDefaultFile => "shared-default-file",
            Source::EntityFile => "entity-file",
            Source::IniFile => "ini-file",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-key record of which layer supplied each value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Provenance(BTreeMap<String, Source>);

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Source> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, source: Source) {
        self.0.insert(key.into(), source);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Source)> {
        self.0.iter().map(|(k, s)| (k.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Marks every schema field no layer supplied as `hardcoded`, since the
    /// default instance's value is what the mapped object ends up with.
    pub(crate) fn complete_for<T>(&mut self, schema: &Schema<T>) {
        for field in schema.fields() {
            self.0
                .entry(field.key().to_string())
                .or_insert(Source::Hardcoded);
        }
    }
}

/// A mapped and validated object together with the provenance of its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub value: T,
    pub provenance: Provenance,
}

/// Overlays `layer` onto `base`, recording `source` for every key it defines.
///
/// Keys the layer doesn't define keep their current value and provenance.
pub fn overlay(base: &mut RawMapping, provenance: &mut Provenance, layer: &RawMapping, source: Source) {
    for (key, value) in layer {
        base.insert(key.clone(), value.clone());
        provenance.insert(key.clone(), source);
    }
}
