//! Typed settings for mmin, layered from defaults, TOML files and environment.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults,
//! 2. `config/default.toml` under the root directory,
//! 3. `config/{env}.toml` when an environment name is given,
//! 4. an explicit configuration file,
//! 5. `MMIN__*` environment variables (`MMIN__WINDOW=7`, `MMIN__LOG__LEVEL=debug`).

#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};

use mmin_indicators::WindowSize;
use mmin_stream::{MinStream, SamplePolicy};

/// Prefix of environment variables recognised by the loader.
pub const ENV_PREFIX: &str = "MMIN";

/// Effective settings of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MminConfig {
    /// Number of samples per window. Must be a number; strings are rejected.
    pub window: WindowSize,
    /// Handling of NaN and infinite samples.
    pub sample_policy: SamplePolicy,
    /// Bound of the channel between the reader and the writer of a pipeline.
    pub channel_capacity: usize,
    /// Logging output.
    pub log: LogConfig,
}

impl Default for MminConfig {
    fn default() -> Self {
        Self {
            window: WindowSize::default(),
            sample_policy: SamplePolicy::default(),
            channel_capacity: 1024,
            log: LogConfig::default(),
        }
    }
}

impl MminConfig {
    /// Checks the settings the type system cannot.
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            bail!("channel_capacity must be at least 1");
        }
        if self.log.level.trim().is_empty() {
            bail!("log.level must not be empty");
        }
        Ok(())
    }

    /// Builds a stream factory from these settings.
    pub fn min_stream(&self) -> MinStream {
        MinStream::new(self.window, self.sample_policy)
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// Line format of log records.
    pub format: LogFormat,
    /// When set, logs go to `mmin.log` in this directory instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

/// Log record format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per record.
    Json,
}

/// Layered configuration loader.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    root: PathBuf,
    env: Option<String>,
    file: Option<PathBuf>,
    environment: Option<Map<String, String>>,
}

impl ConfigLoader {
    /// Creates a loader that looks for `config/*.toml` under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Selects the `config/{name}.toml` overlay.
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Adds an explicit file that must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Replaces the process environment with the given variables.
    pub fn environment<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Merges every source and validates the result.
    pub fn load(&self) -> Result<MminConfig> {
        let config_dir = self.root.join("config");
        let mut builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false));

        if let Some(env) = &self.env {
            builder = builder
                .add_source(File::from(config_dir.join(format!("{env}.toml"))).required(false));
        }

        if let Some(path) = &self.file {
            if !path.exists() {
                bail!("configuration file {} does not exist", path.display());
            }
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(self.environment.clone()),
        );

        let config: MminConfig = builder
            .build()
            .context("failed to read configuration sources")?
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Loads configuration relative to the current directory.
pub fn load_config(env: Option<&str>, file: Option<&Path>) -> Result<MminConfig> {
    let mut loader = ConfigLoader::new(".");
    if let Some(env) = env {
        loader = loader.env(env);
    }
    if let Some(file) = file {
        loader = loader.file(file);
    }
    loader.load()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_any_source() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path()).environment(no_env()).load().unwrap();
        assert_eq!(config, MminConfig::default());
        assert_eq!(config.window.get(), 5);
        assert_eq!(config.min_stream().window(), 5);
    }

    #[test]
    fn layers_files_then_environment() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("config/default.toml"),
            "window = 3\nsample_policy = \"skip\"\n[log]\nlevel = \"info\"\n",
        );
        write(&dir.path().join("config/ci.toml"), "window = 4\n");

        let config = ConfigLoader::new(dir.path())
            .env("ci")
            .environment([("MMIN__CHANNEL_CAPACITY", "16"), ("MMIN__LOG__FORMAT", "json")])
            .load()
            .unwrap();

        assert_eq!(config.window.get(), 4);
        assert_eq!(config.sample_policy, SamplePolicy::Skip);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn environment_overrides_window() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("config/default.toml"), "window = 3\n");
        let config = ConfigLoader::new(dir.path())
            .environment([("MMIN__WINDOW", "11")])
            .load()
            .unwrap();
        assert_eq!(config.window.get(), 11);
    }

    #[test]
    fn very_large_window_is_accepted() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new(dir.path())
            .environment([("MMIN__WINDOW", "1000000000000000")])
            .load()
            .unwrap();
        assert_eq!(config.window.get(), 1_000_000_000_000_000);
        let _instance = config.min_stream().stream::<f64>();
    }

    #[test]
    fn explicit_file_wins_over_directory_files() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("config/default.toml"), "window = 3\n");
        let explicit = dir.path().join("custom.toml");
        let mut settings = MminConfig::default();
        settings.window = WindowSize::new(8).unwrap();
        write(&explicit, &toml::to_string(&settings).unwrap());

        let config = ConfigLoader::new(dir.path())
            .file(&explicit)
            .environment(no_env())
            .load()
            .unwrap();
        assert_eq!(config.window.get(), 8);
    }

    #[test]
    fn rejects_string_window() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("config/default.toml"), "window = \"5\"\n");
        let err = ConfigLoader::new(dir.path())
            .environment(no_env())
            .load()
            .unwrap_err();
        assert!(format!("{err:#}").contains("window must be numeric"), "{err:#}");
    }

    #[test]
    fn rejects_non_integral_and_zero_windows() {
        for contents in ["window = 2.5\n", "window = 0\n", "window = [3]\n", "window = true\n"] {
            let dir = tempdir().unwrap();
            write(&dir.path().join("config/default.toml"), contents);
            let result = ConfigLoader::new(dir.path()).environment(no_env()).load();
            assert!(result.is_err(), "{contents} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_capacity() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("config/default.toml"), "channel_capacity = 0\n");
        let err = ConfigLoader::new(dir.path())
            .environment(no_env())
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = ConfigLoader::new(dir.path())
            .file(dir.path().join("absent.toml"))
            .environment(no_env())
            .load();
        assert!(result.is_err());
    }
}
