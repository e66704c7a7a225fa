pub mod app;
pub mod check;
pub mod config;
pub mod context;
mod error;
pub mod store;

pub use app::{AppConfig, DEFAULT_CONFIG_PATH};
pub use check::{
    load_check_defaults, CheckDefinition, CheckDefinitionDefaults, CheckDefinitionStore,
    CHECK_DEFAULTS_FILE_NAME,
};
pub use config::{ConfigError, Loader, Provenance, Resolved, Schematic, Source};
pub use context::AppContext;
pub use error::Error;
pub use store::{AggregateError, EmptyScan, EntityStore, Scan, StoreError};
