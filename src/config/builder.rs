use std::path::{Path, PathBuf};

use super::store::ConfigStore;
use crate::schema::Schema;
use crate::Error;

/// Builder for a [`ConfigStore`].
///
/// The store needs two collaborators: where its file lives and which schema
/// it follows. Either can be given directly or through a supplier closure,
/// which is called once when the store is built.
///
/// ## Example
///
/// ```no_run
/// use typed_ini::{ConfigStore, Kind, Schema, SchemaItem, SchemaSection};
///
/// fn schema() -> Schema {
///     Schema::new().section(
///         SchemaSection::new("ABT")
///             .item(SchemaItem::new("koh", Kind::Integer, "1", "ABT koh value")),
///     )
/// }
///
/// let store = ConfigStore::builder()
///     .with_file("specific_algorithm_config.ini")
///     .with_schema_fn(schema)
///     .open()?;
///
/// let koh: i64 = store.get_value("ABT", "koh")?;
/// # Ok::<(), typed_ini::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigStoreBuilder {
    path: Option<PathBuf>,
    schema: Option<Schema>,
}

impl ConfigStoreBuilder {
    /// Sets the config file location.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the config file location from a supplier.
    pub fn with_file_fn<F, P>(self, supplier: F) -> Self
    where
        F: FnOnce() -> P,
        P: AsRef<Path>,
    {
        self.with_file(supplier())
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the schema from a supplier.
    pub fn with_schema_fn(self, supplier: impl FnOnce() -> Schema) -> Self {
        self.with_schema(supplier())
    }

    /// Builds an uninitialized store.
    ///
    /// Returns an error if the file location or the schema is missing.
    pub fn build(self) -> Result<ConfigStore, Error> {
        let path = self.path.ok_or(Error::MissingPath)?;
        let schema = self.schema.ok_or(Error::MissingSchema)?;
        Ok(ConfigStore::new(path, schema))
    }

    /// Builds the store and runs [`ConfigStore::initialize`].
    pub fn open(self) -> Result<ConfigStore, Error> {
        let mut store = self.build()?;
        store.initialize()?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, SchemaItem, SchemaSection};
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new().section(
            SchemaSection::new("ABT").item(SchemaItem::new("koh", Kind::Integer, "1", "")),
        )
    }

    #[test]
    fn test_build_requires_path() {
        let result = ConfigStore::builder().with_schema(schema()).build();
        assert!(matches!(result, Err(Error::MissingPath)));
    }

    #[test]
    fn test_build_requires_schema() {
        let result = ConfigStore::builder().with_file("config.ini").build();
        assert!(matches!(result, Err(Error::MissingSchema)));
    }

    #[test]
    fn test_suppliers_are_resolved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let store = ConfigStore::builder()
            .with_file_fn(|| path.clone())
            .with_schema_fn(schema)
            .open()
            .unwrap();

        assert_eq!(store.config_file_path(), path.as_path());
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_open_surfaces_initialize_errors() {
        let dir = tempdir().unwrap();
        let bad = Schema::new().section(
            SchemaSection::new("ABT").item(SchemaItem::new("koh", Kind::Integer, "one", "")),
        );

        let result = ConfigStore::builder()
            .with_file(dir.path().join("config.ini"))
            .with_schema(bad)
            .open();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
