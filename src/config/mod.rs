//! Schema-driven loading of flat key/value configuration files.

mod builder;
mod cascade;
mod error;
mod file;
mod mapper;
mod rule;
mod schema;
mod source;
mod validate;

pub use builder::{materialize, Derive, Loader};
pub use cascade::{resolve, DefaultsCascade};
pub use error::{Access, ConfigError, SyntaxReason};
pub use file::{load_flat_file, read_flat_file, render_flat, RawMapping};
pub use mapper::map;
pub use rule::Rule;
pub use schema::{FieldKind, FieldSpec, FieldValue, Schema, Schematic};
pub use source::{overlay, Provenance, Resolved, Source};
pub use validate::validate;
