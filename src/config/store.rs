use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::builder::ConfigStoreBuilder;
use super::ini::{self, Line};
use super::rule::Rule;
use super::section::Section;
use super::value::{ConfigType, Value};
use super::ConfigError;
use crate::schema::{generate_config, invalid_default, Schema};

/// Typed, validated configuration backed by an INI-like file.
///
/// The store is seeded from a [`Schema`], then overlaid with whatever the
/// config file holds. Loading never fails on bad content: a value that does
/// not parse as its declared kind, or that breaks its rule, falls back to the
/// schema default and is recorded in the returned [`LoadReport`].
///
/// The store is not synchronized. Callers sharing it across threads must
/// wrap the whole store in their own lock.
///
/// ## Example
///
/// ```no_run
/// use typed_ini::{ConfigStore, Kind, Rule, Schema, SchemaItem, SchemaSection};
///
/// let schema = Schema::new().section(
///     SchemaSection::new("ABT").item(
///         SchemaItem::new("kor", Kind::Float, "500.0", "ABT kor value")
///             .with_rule(Rule::AlwaysPositive),
///     ),
/// );
///
/// let store = ConfigStore::open("specific_algorithm_config.ini", schema)?;
/// let kor: f64 = store.get_value("ABT", "kor")?;
/// # Ok::<(), typed_ini::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    schema: Schema,
    sections: BTreeMap<String, Section>,
}

/// What happened while reading a config file.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// The file did not exist and was generated from the schema.
    pub generated: bool,
    /// The file could not be read; the store kept its previous values.
    pub unreadable: bool,
    /// Entries whose text was rejected.
    pub fallbacks: Vec<Fallback>,
    /// Entries not declared in the schema, stored as text.
    pub passthrough: Vec<(String, String)>,
    /// 1-based numbers of lines that could not be attributed to a key.
    pub discarded_lines: Vec<usize>,
}

impl LoadReport {
    /// True when every line was either accepted or a comment.
    pub fn is_clean(&self) -> bool {
        !self.unreadable && self.fallbacks.is_empty() && self.discarded_lines.is_empty()
    }
}

/// A rejected entry.
///
/// Declared keys are reset to their schema default; undeclared keys keep
/// whatever they held before.
#[derive(Debug)]
pub struct Fallback {
    pub section: String,
    pub key: String,
    pub text: String,
    pub reason: ConfigError,
}

impl ConfigStore {
    /// Creates a builder for a store.
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::default()
    }

    /// Creates an empty, uninitialized store. Call [`initialize`](Self::initialize)
    /// before reading values.
    pub fn new(path: impl AsRef<Path>, schema: Schema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
            sections: BTreeMap::new(),
        }
    }

    /// Creates and initializes a store in one step.
    pub fn open(path: impl AsRef<Path>, schema: Schema) -> Result<Self, ConfigError> {
        let mut store = Self::new(path, schema);
        store.initialize()?;
        Ok(store)
    }

    /// Seeds defaults and rules, generates the file if it is missing, then
    /// loads it.
    ///
    /// Fails only on structural defects: a schema that fails
    /// [`Schema::validate`], or a missing file that cannot be generated.
    pub fn initialize(&mut self) -> Result<LoadReport, ConfigError> {
        self.schema.validate()?;
        self.sections.clear();
        self.seed_defaults()?;

        let generated = !self.path.exists();
        if generated {
            self.write_generated()?;
        }

        let mut report = self.load_config();
        report.generated = generated;
        Ok(report)
    }

    fn seed_defaults(&mut self) -> Result<(), ConfigError> {
        for schema_section in self.schema.sections() {
            let section = self.sections.entry(schema_section.name.clone()).or_default();
            for item in &schema_section.items {
                if let Some(rule) = &item.rule {
                    section.set_validation_rule(item.name.clone(), Arc::clone(rule));
                }
                item.default_value()
                    .and_then(|value| section.set(item.name.clone(), value))
                    .map_err(|e| invalid_default(&schema_section.name, &item.name, e))?;
            }
        }
        Ok(())
    }

    fn write_generated(&self) -> Result<(), ConfigError> {
        let io_error = |source: std::io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_error)?;
        }
        std::fs::write(&self.path, generate_config(&self.schema)).map_err(io_error)?;

        info!("generated default config file at {}", self.path.display());
        Ok(())
    }

    /// Re-reads the config file over the current values.
    ///
    /// Keys missing from the file keep what they hold now. Bad lines are
    /// handled as in [`initialize`](Self::initialize) and listed in the report.
    pub fn reload(&mut self) -> LoadReport {
        self.load_config()
    }

    /// Reads the config file over the current values.
    ///
    /// Never fails: an unreadable file leaves the store untouched, and each
    /// bad line is handled on its own. Entries before the first section
    /// header and lines that are not valid UTF-8 are discarded.
    fn load_config(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        let contents = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("unable to read config file {}: {e}", self.path.display());
                report.unreadable = true;
                return report;
            }
        };

        let mut current: Option<String> = None;
        for (index, raw) in contents.split(|b| *b == b'\n').enumerate() {
            let line_no = index + 1;
            let Ok(line) = std::str::from_utf8(raw) else {
                debug!("line {line_no}: not valid UTF-8, ignored");
                report.discarded_lines.push(line_no);
                continue;
            };
            match ini::parse_line(line) {
                Line::Blank | Line::Comment => {}
                Line::Section(name) => current = Some(name.to_string()),
                Line::Entry { key, value } => match &current {
                    Some(section) => self.apply_entry(section, key, value, &mut report),
                    None => {
                        debug!("line {line_no}: '{key}' appears before any section, ignored");
                        report.discarded_lines.push(line_no);
                    }
                },
                Line::Malformed => {
                    debug!("line {line_no}: not a section header or key/value pair, ignored");
                    report.discarded_lines.push(line_no);
                }
            }
        }

        report
    }

    fn apply_entry(&mut self, section_name: &str, key: &str, text: &str, report: &mut LoadReport) {
        let section = self.sections.entry(section_name.to_string()).or_default();

        let Some(item) = self.schema.find(section_name, key) else {
            debug!("[{section_name}] {key} is not declared, kept as text");
            match section.set(key, Value::Text(text.to_string())) {
                Ok(()) => report
                    .passthrough
                    .push((section_name.to_string(), key.to_string())),
                Err(reason) => {
                    warn!("[{section_name}] {key} = '{text}' rejected: {reason}");
                    report.fallbacks.push(Fallback {
                        section: section_name.to_string(),
                        key: key.to_string(),
                        text: text.to_string(),
                        reason,
                    });
                }
            }
            return;
        };

        let Err(reason) = Value::parse(item.kind, text).and_then(|value| section.set(key, value))
        else {
            return;
        };

        warn!("[{section_name}] {key} = '{text}' rejected ({reason}), using default '{}'", item.default);
        if let Err(e) = item.default_value().and_then(|value| section.set(key, value)) {
            warn!("[{section_name}] {key}: default '{}' not applied: {e}", item.default);
        }
        report.fallbacks.push(Fallback {
            section: section_name.to_string(),
            key: key.to_string(),
            text: text.to_string(),
            reason,
        });
    }

    /// Writes every section and key back to the config file.
    ///
    /// Sections and keys are written in lexical order. Comments from the
    /// original file are not preserved.
    ///
    /// Fails with [`ConfigError::NotSaveable`], before touching the file, if
    /// any entry would not read back as the same value: text holding `#`, a
    /// line break or surrounding blanks, or a declared key that currently
    /// holds a kind other than its declared one.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        self.check_saveable()?;
        let contents = ini::render(
            self.sections
                .iter()
                .map(|(name, section)| (name.as_str(), section)),
        );
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("saved config file to {}", self.path.display());
        Ok(())
    }

    fn check_saveable(&self) -> Result<(), ConfigError> {
        let not_saveable = |section: &str, key: &str, reason: String| ConfigError::NotSaveable {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        };

        for (name, section) in &self.sections {
            let name = name.as_str();
            ini::check_section_name(name).map_err(|r| not_saveable(name, "", r.to_string()))?;
            for (key, value) in section.values() {
                ini::check_entry(key, &value.to_text())
                    .map_err(|r| not_saveable(name, key, r.to_string()))?;
                if let Some(item) = self.schema.find(name, key) {
                    if item.kind != value.kind() {
                        return Err(not_saveable(
                            name,
                            key,
                            format!("declared as {}, holds {}", item.kind, value.kind()),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns a copy of `key` in `section` as `T`.
    pub fn get_value<T: ConfigType>(&self, section: &str, key: &str) -> Result<T, ConfigError> {
        self.sections
            .get(section)
            .ok_or_else(|| ConfigError::SectionNotFound(section.to_string()))?
            .get_value(key)
    }

    /// Stores `value` under `key`, creating the section if needed.
    ///
    /// A value rejected by the key's rule leaves the store unchanged.
    pub fn set_value<T: ConfigType>(
        &mut self,
        section: &str,
        key: &str,
        value: T,
    ) -> Result<(), ConfigError> {
        match self.sections.get_mut(section) {
            Some(existing) => existing.set_value(key, value),
            None => {
                let mut created = Section::new();
                created.set_value(key, value)?;
                self.sections.insert(section.to_string(), created);
                Ok(())
            }
        }
    }

    pub fn has_value(&self, section: &str, key: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|s| s.has_key(key))
    }

    /// Installs or replaces the rule for `key` without re-checking its value.
    pub fn set_validation_rule(&mut self, section: &str, key: &str, rule: impl Into<Arc<Rule>>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .set_validation_rule(key, rule.into());
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Iterates over sections in name order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    pub fn config_file_path(&self) -> &Path {
        &self.path
    }

    pub fn config_sections(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, SchemaItem, SchemaSection};
    use std::fs;
    use tempfile::tempdir;

    fn schema() -> Schema {
        let between_0_and_100 = Arc::new(Rule::in_range(0.0, 100.0));
        Schema::new()
            .section(
                SchemaSection::new("ABT")
                    .item(
                        SchemaItem::new("kor", Kind::Float, "500.0", "ABT kor value")
                            .with_rule(Rule::AlwaysPositive),
                    )
                    .item(SchemaItem::new("koh", Kind::Integer, "1", "ABT koh value")),
            )
            .section(
                SchemaSection::new("General")
                    .item(
                        SchemaItem::new("FW", Kind::Float, "10.0", "Fixed Wing value")
                            .with_rule(Arc::clone(&between_0_and_100)),
                    )
                    .item(
                        SchemaItem::new("CM", Kind::Float, "30.0", "Cruise Missile value")
                            .with_rule(between_0_and_100),
                    )
                    .item(SchemaItem::new(
                        "Misc",
                        Kind::FloatList,
                        "1.0,2.0,3.0",
                        "Misc item",
                    )),
            )
    }

    fn open_with(contents: &str) -> (tempfile::TempDir, ConfigStore, LoadReport) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, contents).unwrap();

        let mut store = ConfigStore::new(&path, schema());
        let report = store.initialize().unwrap();
        (dir, store, report)
    }

    #[test]
    fn test_missing_file_is_generated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut store = ConfigStore::new(&path, schema());
        let report = store.initialize().unwrap();

        assert!(report.generated);
        assert!(report.is_clean());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("[ABT]"));
        assert_eq!(store.get_value::<f64>("ABT", "kor").unwrap(), 500.0);
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 1);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let (_dir, store, report) = open_with("[ABT]\nkor = 250.5\nkoh = 3\n");

        assert!(report.is_clean());
        assert!(!report.generated);
        assert_eq!(store.get_value::<f64>("ABT", "kor").unwrap(), 250.5);
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 3);
        assert_eq!(store.get_value::<f64>("General", "FW").unwrap(), 10.0);
    }

    #[test]
    fn test_rule_violation_falls_back_to_default() {
        let (_dir, store, report) = open_with("[ABT]\nkor = 100.0\nkor = -5\n");

        assert_eq!(store.get_value::<f64>("ABT", "kor").unwrap(), 500.0);
        assert_eq!(report.fallbacks.len(), 1);
        assert_eq!(report.fallbacks[0].text, "-5");
        assert!(matches!(
            report.fallbacks[0].reason,
            ConfigError::Validation { .. }
        ));
    }

    #[test]
    fn test_parse_failure_falls_back_to_default() {
        let (_dir, store, report) = open_with("[ABT]\nkoh = 2.5\n[General]\nMisc = 1.0,x\n");

        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 1);
        assert_eq!(
            store.get_value::<Vec<f64>>("General", "Misc").unwrap(),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(report.fallbacks.len(), 2);
        assert!(report
            .fallbacks
            .iter()
            .all(|f| matches!(f.reason, ConfigError::Parse { .. })));
    }

    #[test]
    fn test_lines_before_any_section_are_discarded() {
        let (_dir, store, report) = open_with("kor = 7.0\ngarbage line\n[ABT]\nkoh = 4\n");

        assert_eq!(report.discarded_lines, vec![1, 2]);
        assert_eq!(store.get_value::<f64>("ABT", "kor").unwrap(), 500.0);
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 4);
    }

    #[test]
    fn test_unknown_section_and_key_pass_through() {
        let (_dir, store, report) = open_with("[Extra]\nname = hello world\n");

        assert_eq!(
            store.get_value::<String>("Extra", "name").unwrap(),
            "hello world"
        );
        assert_eq!(
            report.passthrough,
            vec![("Extra".to_string(), "name".to_string())]
        );
    }

    #[test]
    fn test_declared_key_keeps_its_kind_after_load() {
        let (_dir, store, _report) = open_with("[General]\nFW = 42\n");

        assert_eq!(store.get_value::<f64>("General", "FW").unwrap(), 42.0);
        assert!(matches!(
            store.get_value::<String>("General", "FW"),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_get_from_missing_section() {
        let (_dir, store, _report) = open_with("");
        assert!(matches!(
            store.get_value::<f64>("TBM", "kor"),
            Err(ConfigError::SectionNotFound(name)) if name == "TBM"
        ));
        assert!(matches!(
            store.get_value::<f64>("ABT", "missing"),
            Err(ConfigError::KeyNotFound(_))
        ));
        assert!(!store.has_value("TBM", "kor"));
    }

    #[test]
    fn test_set_value_respects_rules() {
        let (_dir, mut store, _report) = open_with("");

        assert!(matches!(
            store.set_value("General", "FW", 150.0),
            Err(ConfigError::Validation { .. })
        ));
        assert_eq!(store.get_value::<f64>("General", "FW").unwrap(), 10.0);

        store.set_value("General", "FW", 20.0).unwrap();
        assert_eq!(store.get_value::<f64>("General", "FW").unwrap(), 20.0);
    }

    #[test]
    fn test_set_value_creates_section() {
        let (_dir, mut store, _report) = open_with("");
        store.set_value("Runtime", "seed", 42_i64).unwrap();
        assert!(store.has_value("Runtime", "seed"));
    }

    #[test]
    fn test_set_validation_rule_applies_to_later_loads() {
        let (_dir, mut store, _report) = open_with("[Extra]\nmode = turbo\n");
        store.set_validation_rule("Extra", "mode", Rule::in_set(["fast", "slow"]));

        let report = store.reload();
        assert_eq!(report.fallbacks.len(), 1);
        assert_eq!(store.get_value::<String>("Extra", "mode").unwrap(), "turbo");
    }

    #[test]
    fn test_reload_reads_file_edits() {
        let (dir, mut store, _report) = open_with("[ABT]\nkoh = 3\n");
        store.set_value("General", "FW", 55.0).unwrap();
        fs::write(dir.path().join("config.ini"), "[ABT]\nkoh = 9\n").unwrap();

        let report = store.reload();
        assert!(report.is_clean());
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 9);
        assert_eq!(store.get_value::<f64>("General", "FW").unwrap(), 55.0);
    }

    #[test]
    fn test_empty_section_header_is_discarded() {
        let (_dir, store, report) = open_with("[]\nname = x\n[ABT]\nkoh = 2\n");

        assert_eq!(report.discarded_lines, vec![1, 2]);
        assert!(store.section("").is_none());
        assert_eq!(store.get_value::<i64>("ABT", "koh").unwrap(), 2);
    }

    #[test]
    fn test_duplicate_schema_section_fails_initialize() {
        let dir = tempdir().unwrap();
        let duplicated = schema().section(
            SchemaSection::new("ABT").item(SchemaItem::new("koh", Kind::Integer, "5", "")),
        );

        let mut store = ConfigStore::new(dir.path().join("config.ini"), duplicated);
        assert!(matches!(
            store.initialize(),
            Err(ConfigError::DuplicateSection(name)) if name == "ABT"
        ));
        assert!(!dir.path().join("config.ini").exists());
    }

    #[test]
    fn test_invalid_schema_default_fails_initialize() {
        let dir = tempdir().unwrap();
        let bad = Schema::new().section(SchemaSection::new("ABT").item(
            SchemaItem::new("kor", Kind::Float, "0.0", "").with_rule(Rule::AlwaysPositive),
        ));

        let mut store = ConfigStore::new(dir.path().join("config.ini"), bad);
        assert!(matches!(
            store.initialize(),
            Err(ConfigError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_unreadable_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        // A directory exists at the path, so generation is skipped and the
        // read fails.
        let mut store = ConfigStore::new(dir.path(), schema());
        let report = store.initialize().unwrap();

        assert!(report.unreadable);
        assert_eq!(store.get_value::<f64>("ABT", "kor").unwrap(), 500.0);
    }

    #[test]
    fn test_generation_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let mut store = ConfigStore::new(blocker.join("config.ini"), schema());
        assert!(matches!(store.initialize(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let dir = tempdir().unwrap();
        let (_keep, store, _report) = open_with("");
        let moved = ConfigStore {
            path: dir.path().join("missing").join("config.ini"),
            ..store
        };

        let err = moved.save_config().unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("config file I/O failed for '"));
        assert_eq!(moved.get_value::<f64>("ABT", "kor").unwrap(), 500.0);
    }

    #[test]
    fn test_sections_iterate_in_name_order() {
        let (_dir, store, _report) = open_with("[Extra]\nx = 1\n");
        let names: Vec<_> = store.sections().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ABT", "Extra", "General"]);
    }
}
