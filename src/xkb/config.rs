//! Configuration loader for xkbsym.
//!
//! `defaults/xkbsym.default.toml` is embedded into the binary so that docs and
//! runtime behavior stay in sync. User files and command-line settings are layered
//! on top of those defaults via [`Loader`] before deserializing into [`Config`].

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/xkbsym.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub log: LogConfig,
    pub include: IncludeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub verbosity: i32,
    pub filter: String,
}

/// Where included files are searched for.
#[derive(Debug, Clone, Deserialize)]
pub struct IncludeConfig {
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder =
            config::Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for command-line settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = Loader::new().build().expect("defaults to deserialize");
        assert_eq!(config.log.verbosity, 0);
        assert_eq!(config.log.filter, "warn");
        assert!(config.include.roots.is_empty());
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("log.verbosity", 10)
            .expect("override to apply")
            .set_override("output.format", "yaml")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.log.verbosity, 10);
        assert_eq!(config.output.format, OutputFormat::Yaml);
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[log]\nverbosity = 7").expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.log.verbosity, 7);
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn missing_user_file_is_an_error() {
        let result = Loader::new()
            .with_file("/nonexistent/xkbsym.toml")
            .build();
        assert!(result.is_err());
    }
}
