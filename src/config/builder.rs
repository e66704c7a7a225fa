use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::file::{load_flat_file, RawMapping};
use super::mapper::map;
use super::schema::{Schema, Schematic};
use super::source::{overlay, Provenance, Resolved, Source};
use super::validate::validate;
use super::ConfigError;

/// Computes a value for a key from the layers merged so far.
pub type Derive = fn(&RawMapping) -> Option<String>;

/// A layer in the loading pipeline.
enum Layer {
    Mapping {
        mapping: RawMapping,
        source: Source,
    },
    File {
        path: PathBuf,
        required: bool,
        source: Source,
    },
    Derived {
        key: String,
        derive: Derive,
        source: Source,
    },
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Mapping { mapping, source } => f
                .debug_struct("Mapping")
                .field("mapping", mapping)
                .field("source", source)
                .finish(),
            Layer::File {
                path,
                required,
                source,
            } => f
                .debug_struct("File")
                .field("path", path)
                .field("required", required)
                .field("source", source)
                .finish(),
            Layer::Derived { key, source, .. } => f
                .debug_struct("Derived")
                .field("key", key)
                .field("source", source)
                .finish_non_exhaustive(),
        }
    }
}

/// Builder for loading one typed object from layered flat files.
///
/// Layers are applied in registration order, with later layers overriding
/// earlier ones key by key. Each layer carries the [`Source`] label that ends
/// up in the result's [`Provenance`].
///
/// Mapping and validation errors are wrapped in [`ConfigError::InFile`] with
/// the file that supplied the offending key. Keys no file supplied are
/// reported against the last file loaded.
///
/// ## Example
///
/// ```no_run
/// use kamonitu_config::{AppConfig, Loader, Source};
///
/// let app = Loader::new()
///     .with_defaults(AppConfig::hardcoded_defaults(), Source::Hardcoded)
///     .with_file("/etc/kamonitu/kamonitu.ini", true, Source::IniFile)
///     .with_derived(
///         "check_definitions_dir",
///         AppConfig::derive_check_definitions_dir,
///         Source::Hardcoded,
///     )
///     .load(&AppConfig::default())?;
///
/// println!("{}", app.value.var_dir);
/// # Ok::<(), kamonitu_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "loaders do nothing until .load() is called"]
pub struct Loader {
    layers: Vec<Layer>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an in-memory layer.
    pub fn with_defaults(mut self, mapping: RawMapping, source: Source) -> Self {
        self.layers.push(Layer::Mapping { mapping, source });
        self
    }

    /// Adds a flat file layer.
    ///
    /// If `required` is `true`, loading fails if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool, source: Source) -> Self {
        self.layers.push(Layer::File {
            path: path.as_ref().to_path_buf(),
            required,
            source,
        });
        self
    }

    /// Sets `key` from the layers registered before this one, unless one of
    /// them already set it.
    ///
    /// Nothing is set when `derive` returns `None`.
    pub fn with_derived(mut self, key: impl Into<String>, derive: Derive, source: Source) -> Self {
        self.layers.push(Layer::Derived {
            key: key.into(),
            derive,
            source,
        });
        self
    }

    /// Loads, merges, maps and validates into `T` using its declared schema.
    pub fn load<T: Schematic>(self, defaults: &T) -> Result<Resolved<T>, ConfigError> {
        self.load_with(T::schema(), defaults)
    }

    /// Like [`load`](Self::load), with an explicit schema.
    pub fn load_with<T: Clone>(
        self,
        schema: &Schema<T>,
        defaults: &T,
    ) -> Result<Resolved<T>, ConfigError> {
        let mut merged = RawMapping::new();
        let mut provenance = Provenance::new();
        // The file that supplied each key's current value.
        let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut last_file = None;

        for layer in self.layers {
            match layer {
                Layer::Mapping { mapping, source } => {
                    for key in mapping.keys() {
                        origins.remove(key);
                    }
                    overlay(&mut merged, &mut provenance, &mapping, source);
                }
                Layer::File {
                    path,
                    required,
                    source,
                } => {
                    if let Some(mapping) = load_flat_file(&path, required)? {
                        tracing::debug!(path = %path.display(), keys = mapping.len(), "parsed flat file");
                        for key in mapping.keys() {
                            origins.insert(key.clone(), path.clone());
                        }
                        overlay(&mut merged, &mut provenance, &mapping, source);
                        last_file = Some(path);
                    }
                }
                Layer::Derived {
                    key,
                    derive,
                    source,
                } => {
                    if merged.contains_key(&key) {
                        continue;
                    }
                    if let Some(value) = derive(&merged) {
                        tracing::debug!(key = %key, value = %value, "derived value");
                        provenance.insert(key.clone(), source);
                        merged.insert(key, value);
                    }
                }
            }
        }

        materialize(schema, &merged, provenance, defaults).map_err(|e| {
            let blamed = e.key().and_then(|key| origins.get(key)).cloned();
            match blamed.or(last_file) {
                Some(path) => e.in_file(path),
                None => e,
            }
        })
    }
}

/// Maps and validates an already merged mapping.
///
/// Provenance is completed for schema fields no layer supplied.
pub fn materialize<T: Clone>(
    schema: &Schema<T>,
    merged: &RawMapping,
    mut provenance: Provenance,
    defaults: &T,
) -> Result<Resolved<T>, ConfigError> {
    let value = map(schema, merged, defaults)?;
    validate(schema, &value)?;
    provenance.complete_for(schema);
    Ok(Resolved { value, provenance })
}
