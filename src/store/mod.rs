//! Directory-backed collections of independent entity files.
//!
//! Every file in the directory with the entity suffix is resolved through a
//! [`DefaultsCascade`], mapped and validated on its own. A file that fails is
//! recorded in an [`AggregateError`] and the scan moves on to the next one.

mod error;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{
    materialize, read_flat_file, ConfigError, DefaultsCascade, Resolved, Schema, Schematic,
};

pub use error::{AggregateError, EntityFailure, StoreError};

/// Suffix entity files must carry to be picked up by a scan.
pub const ENTITY_FILE_SUFFIX: &str = ".ini";

/// Successfully loaded entities keyed by file name.
pub type EntityCollection<T> = BTreeMap<String, Resolved<T>>;

/// What a scan that produced no entities at all means to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyScan {
    /// An empty result is a valid "nothing to do" state.
    #[default]
    Allow,
    /// An empty result is returned as [`StoreError::NoEntities`].
    Reject,
}

/// The outcome of one directory scan.
#[derive(Debug)]
pub struct Scan<T> {
    pub entities: EntityCollection<T>,
    pub errors: Option<AggregateError>,
}

impl<T> Scan<T> {
    /// True when no entity loaded, whether or not any file failed.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_none()
    }

    /// Splits the scan into its entities, failing if any file failed.
    pub fn into_result(self) -> Result<EntityCollection<T>, AggregateError> {
        match self.errors {
            Some(errors) => Err(errors),
            None => Ok(self.entities),
        }
    }
}

/// Scans `directory` for files ending in `suffix` and loads each one.
///
/// Fails only if the directory itself can't be listed.
pub fn scan_directory<T: Clone>(
    directory: &Path,
    suffix: &str,
    schema: &Schema<T>,
    cascade: &DefaultsCascade,
    defaults: &T,
) -> Result<Scan<T>, StoreError> {
    let _span = tracing::info_span!("scan", directory = %directory.display()).entered();

    let list_err = |source| StoreError::ListDirectory {
        path: directory.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        // Non-UTF-8 names are keyed lossily but still loaded from their real path.
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if is_entity_file(&name, suffix) && path.is_file() {
            files.push((name, path));
        }
    }
    files.sort();
    tracing::debug!(count = files.len(), "found entity files");

    let mut entities = EntityCollection::new();
    let mut errors = AggregateError::default();
    for (name, path) in files {
        match load_entity(&path, schema, cascade, defaults) {
            Ok(resolved) => {
                entities.insert(name, resolved);
            }
            Err(error) => {
                tracing::warn!(file = %name, %error, "failed to load entity file");
                errors.push(name, error);
            }
        }
    }

    tracing::info!(
        loaded = entities.len(),
        failed = errors.len(),
        "entity directory scanned"
    );
    Ok(Scan {
        entities,
        errors: (!errors.is_empty()).then_some(errors),
    })
}

/// Reads one entity file and resolves it over the cascade.
pub fn load_entity<T: Clone>(
    path: &Path,
    schema: &Schema<T>,
    cascade: &DefaultsCascade,
    defaults: &T,
) -> Result<Resolved<T>, ConfigError> {
    let raw = read_flat_file(path)?;
    let (merged, provenance) = cascade.resolve(&raw);
    tracing::debug!(path = %path.display(), ?merged, "resolved entity file");
    materialize(schema, &merged, provenance, defaults)
}

fn is_entity_file(name: &str, suffix: &str) -> bool {
    name.len() > suffix.len() && name.ends_with(suffix)
}

/// A directory of entity files of type `T` sharing one defaults cascade.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    directory: PathBuf,
    cascade: DefaultsCascade,
    defaults: T,
    suffix: String,
    on_empty: EmptyScan,
}

impl<T: Schematic> EntityStore<T> {
    pub fn new(directory: impl AsRef<Path>, cascade: DefaultsCascade, defaults: T) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            cascade,
            defaults,
            suffix: ENTITY_FILE_SUFFIX.to_string(),
            on_empty: EmptyScan::default(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_empty_scan(mut self, on_empty: EmptyScan) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn cascade(&self) -> &DefaultsCascade {
        &self.cascade
    }

    /// Re-reads every entity file from disk.
    pub fn scan(&self) -> Result<Scan<T>, StoreError> {
        let scan = scan_directory(
            &self.directory,
            &self.suffix,
            T::schema(),
            &self.cascade,
            &self.defaults,
        )?;

        if scan.is_empty() && self.on_empty == EmptyScan::Reject {
            return Err(StoreError::NoEntities {
                directory: self.directory.clone(),
                failures: scan.errors.unwrap_or_default(),
            });
        }
        Ok(scan)
    }

    /// Loads a single entity file by name from the store's directory.
    pub fn load(&self, file_name: &str) -> Result<Resolved<T>, ConfigError> {
        load_entity(
            &self.directory.join(file_name),
            T::schema(),
            &self.cascade,
            &self.defaults,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldSpec, RawMapping, Rule, Source};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Ping {
        target: String,
        retries: i64,
    }

    type Field = FieldSpec<Ping>;

    impl Schematic for Ping {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: std::sync::OnceLock<Schema<Ping>> = std::sync::OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new(vec![
                    Field::string("target", |p| p.target.as_str(), |p, v| p.target = v)
                        .required(),
                    Field::int("retries", |p| p.retries, |p, v| p.retries = v)
                        .rule(Rule::Within { low: 0, high: 3 }),
                ])
            })
        }
    }

    fn cascade() -> DefaultsCascade {
        let hardcoded: RawMapping = [("retries".to_string(), "1".to_string())].into();
        DefaultsCascade::new(hardcoded)
    }

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn test_scan_isolates_failures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        write(&dir, "b.ini", "target = beta\nretries = 3\n");
        write(&dir, "c.ini", "retries = 2\n");
        write(&dir, "d.ini", "target = delta\nretries = 7\n");
        write(&dir, "e.ini", "target = echo\nretries = many\n");

        let store = EntityStore::new(dir.path(), cascade(), Ping::default());
        let scan = store.scan().unwrap();

        assert_eq!(scan.entities.len(), 2);
        assert_eq!(scan.entities["a.ini"].value.retries, 1);
        assert_eq!(scan.entities["a.ini"].provenance.get("retries"), Some(Source::Hardcoded));
        assert_eq!(scan.entities["b.ini"].value.retries, 3);
        assert_eq!(scan.entities["b.ini"].provenance.get("retries"), Some(Source::EntityFile));

        let errors = scan.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors.get("c.ini"), Some(ConfigError::MissingRequiredKey(_))));
        assert!(matches!(errors.get("d.ini"), Some(ConfigError::OutOfRange { .. })));
        assert!(matches!(errors.get("e.ini"), Some(ConfigError::TypeCoercion { .. })));
        assert!(!scan.is_complete());
    }

    #[test]
    fn test_scan_skips_unrelated_entries() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        write(&dir, "README.md", "not an entity\n");
        write(&dir, ".ini", "target = hidden\n");
        write(&dir, "a.ini.bak", "garbage\n");
        fs::create_dir(dir.path().join("nested.ini")).unwrap();

        let scan = EntityStore::new(dir.path(), cascade(), Ping::default())
            .scan()
            .unwrap();

        assert_eq!(scan.entities.keys().collect::<Vec<_>>(), vec!["a.ini"]);
        assert!(scan.is_complete());
    }

    #[test]
    fn test_custom_suffix() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        write(&dir, "b.check", "target = beta\n");

        let scan = EntityStore::new(dir.path(), cascade(), Ping::default())
            .with_suffix(".check")
            .scan()
            .unwrap();
        assert_eq!(scan.entities.keys().collect::<Vec<_>>(), vec!["b.check"]);
    }

    #[test]
    fn test_empty_scan_policy() {
        let dir = TempDir::new().unwrap();
        let store = EntityStore::new(dir.path(), cascade(), Ping::default());

        let scan = store.scan().unwrap();
        assert!(scan.is_empty());
        assert!(scan.is_complete());

        write(&dir, "bad.ini", "retries = 1\n");
        let result = store.with_empty_scan(EmptyScan::Reject).scan();
        match result {
            Err(StoreError::NoEntities { failures, .. }) => {
                assert_eq!(failures.len(), 1);
                assert!(failures.get("bad.ini").is_some());
            }
            other => panic!("expected no entities, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_directory() {
        let store = EntityStore::new("/nonexistent/checks", cascade(), Ping::default());
        assert!(matches!(store.scan(), Err(StoreError::ListDirectory { .. })));
    }

    #[test]
    fn test_into_result() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        let store = EntityStore::new(dir.path(), cascade(), Ping::default());
        assert_eq!(store.scan().unwrap().into_result().unwrap().len(), 1);

        write(&dir, "b.ini", "nonsense\n");
        let errors = store.scan().unwrap().into_result().unwrap_err();
        assert!(matches!(errors.get("b.ini"), Some(ConfigError::Syntax { .. })));
    }

    #[test]
    fn test_load_single_entity() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        let store = EntityStore::new(dir.path(), cascade(), Ping::default());

        let resolved = store.load("a.ini").unwrap();
        assert_eq!(resolved.value.target, "alpha");
        assert!(matches!(store.load("zz.ini"), Err(ConfigError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_not_dropped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        write(&dir, "a.ini", "target = alpha\n");
        let raw = dir.path().join(OsStr::from_bytes(b"caf\xff.ini"));
        if fs::write(&raw, "target = cafe\n").is_err() {
            // Some filesystems refuse names that aren't valid UTF-8.
            return;
        }

        let scan = EntityStore::new(dir.path(), cascade(), Ping::default())
            .scan()
            .unwrap();

        assert_eq!(scan.entities.len(), 2);
        assert_eq!(scan.entities["caf\u{FFFD}.ini"].value.target, "cafe");
        assert!(scan.entities.contains_key("a.ini"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_failure_is_recorded() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let raw = dir.path().join(OsStr::from_bytes(b"\xfe.ini"));
        if fs::write(&raw, "retries = 2\n").is_err() {
            return;
        }

        let scan = EntityStore::new(dir.path(), cascade(), Ping::default())
            .scan()
            .unwrap();

        assert!(scan.is_empty());
        let errors = scan.errors.unwrap();
        assert!(matches!(
            errors.get("\u{FFFD}.ini"),
            Some(ConfigError::MissingRequiredKey(key)) if key == "target"
        ));
    }
}
