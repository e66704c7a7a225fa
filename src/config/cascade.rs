//! Three-layer default resolution for entity files.

use std::path::Path;

use super::file::{load_flat_file, RawMapping};
use super::source::{overlay, Provenance, Source};
use super::ConfigError;

/// Resolves `hardcoded < shared < entity`, recording which layer won each key.
pub fn resolve(
    hardcoded: &RawMapping,
    shared: &RawMapping,
    entity: &RawMapping,
) -> (RawMapping, Provenance) {
    let mut merged = RawMapping::new();
    let mut provenance = Provenance::new();

    overlay(&mut merged, &mut provenance, hardcoded, Source::Hardcoded);
    overlay(&mut merged, &mut provenance, shared, Source::SharedDefaultFile);
    overlay(&mut merged, &mut provenance, entity, Source::EntityFile);

    (merged, provenance)
}

/// The hardcoded and shared default layers, fixed for the duration of a scan.
#[derive(Debug, Clone, Default)]
pub struct DefaultsCascade {
    hardcoded: RawMapping,
    shared: RawMapping,
}

impl DefaultsCascade {
    /// Creates a cascade with only hardcoded defaults.
    pub fn new(hardcoded: RawMapping) -> Self {
        Self {
            hardcoded,
            shared: RawMapping::new(),
        }
    }

    /// Replaces the shared defaults layer.
    pub fn with_shared(mut self, shared: RawMapping) -> Self {
        self.shared = shared;
        self
    }

    /// Reads the shared defaults layer from `path`.
    ///
    /// A missing file leaves the layer empty.
    pub fn with_shared_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "loading shared defaults");
        match load_flat_file(path, false)? {
            Some(shared) => {
                tracing::debug!(path = %path.display(), ?shared, "parsed shared defaults");
                Ok(self.with_shared(shared))
            }
            None => {
                tracing::warn!(path = %path.display(), "shared defaults file not found, using hardcoded defaults");
                Ok(self)
            }
        }
    }

    pub fn hardcoded(&self) -> &RawMapping {
        &self.hardcoded
    }

    pub fn shared(&self) -> &RawMapping {
        &self.shared
    }

    /// Layers `entity` over the defaults.
    pub fn resolve(&self, entity: &RawMapping) -> (RawMapping, Provenance) {
        resolve(&self.hardcoded, &self.shared, entity)
    }
}
