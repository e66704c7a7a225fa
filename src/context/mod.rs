//! Everything the daemon reads from disk at startup.

use std::path::Path;

use crate::app::AppConfig;
use crate::check::CheckDefinitionStore;
use crate::config::{Provenance, Resolved};
use crate::store::EmptyScan;
use crate::Error;

/// The loaded application config and the check store it points at.
///
/// ## Example
///
/// ```no_run
/// use kamonitu_config::{AppContext, DEFAULT_CONFIG_PATH};
///
/// let ctx = AppContext::load(DEFAULT_CONFIG_PATH)?;
/// let scan = ctx.checks().scan()?;
/// for (file, check) in &scan.entities {
///     println!("{file}: {}", check.value.check_command);
/// }
/// # Ok::<(), kamonitu_config::Error>(())
/// ```
#[derive(Debug)]
pub struct AppContext {
    config: Resolved<AppConfig>,
    checks: CheckDefinitionStore,
}

impl AppContext {
    /// Loads the application config at `path` and opens its check store.
    ///
    /// Scans of the returned store accept an empty check directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::load_with(path, EmptyScan::Allow)
    }

    /// Like [`load`](Self::load), choosing how empty scans are treated.
    pub fn load_with(path: impl AsRef<Path>, on_empty: EmptyScan) -> Result<Self, Error> {
        let config = AppConfig::load(path)?;
        let checks = CheckDefinitionStore::open(&config.value)?.with_empty_scan(on_empty);
        Ok(Self { config, checks })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config.value
    }

    /// Which layer supplied each application config value.
    pub fn config_provenance(&self) -> &Provenance {
        &self.config.provenance
    }

    pub fn checks(&self) -> &CheckDefinitionStore {
        &self.checks
    }
}
