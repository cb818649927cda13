//! Loader for configurations split across several files.
//!
//! The main file may name other files with an `include` key. Every top-level
//! section has to come from exactly one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use toml::Table;

/// Loads a configuration file together with its includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against
	base_path: PathBuf,
	/// Files already read, to reject include cycles
	loaded_files: HashSet<PathBuf>,
	/// File each top-level section came from
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Reads `config_path` and its includes, merges them and validates the result.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let mut merged = self.read_table(&config_path).await?;
		let includes = take_includes(&mut merged)?;

		self.record_sections(&merged, &config_path)?;
		for include in includes {
			let include_path = self.resolve_path(&include)?;
			let table = self.read_table(&include_path).await?;
			if table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested includes are not supported: {}",
					include_path.display()
				)));
			}
			self.record_sections(&table, &include_path)?;
			merged.extend(table);
		}

		let config: Config = toml::Value::Table(merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	async fn read_table(&mut self, path: &Path) -> Result<Table, ConfigError> {
		let canonical_path = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(resolved.parse::<Table>()?)
	}

	fn record_sections(&mut self, table: &Table, source: &Path) -> Result<(), ConfigError> {
		for key in table.keys() {
			if let Some(existing) = self.section_sources.get(key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing.display(),
					source.display()
				)));
			}
			self.section_sources
				.insert(key.clone(), source.to_path_buf());
		}
		Ok(())
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// Removes the `include` key and returns the listed paths.
fn take_includes(table: &mut Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
