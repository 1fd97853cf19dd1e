//! Layered configuration with precedence tracking.
//!
//! Values are resolved from, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Project config: `<workspace>/.archer/config.json`
//! 3. Environment variables (`ARCHER_DATA`, `ARCHER_MAX_DEPTH`,
//!    `ARCHER_KEEP_EXTERNAL`)
//! 4. CLI flags
//!
//! Every resolved value remembers where it came from.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::filter::ParseOptions;
use crate::model::DEFAULT_DATA_FILE;

/// Directory holding the project config, relative to the workspace root.
pub const CONFIG_DIR: &str = ".archer";

/// Project config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

pub const ENV_DATA: &str = "ARCHER_DATA";
pub const ENV_MAX_DEPTH: &str = "ARCHER_MAX_DEPTH";
pub const ENV_KEEP_EXTERNAL: &str = "ARCHER_KEEP_EXTERNAL";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A setting whose text cannot be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    Default = 0,
    /// From `.archer/config.json`.
    ProjectConfig = 1,
    EnvVar = 2,
    /// From a CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Project Config File
// ============================================================================

/// Contents of `.archer/config.json`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Dataset path, relative to the workspace root.
    pub data: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub keep_external: Option<bool>,
    pub roots: Vec<String>,
}

impl ProjectConfig {
    /// Read the project config of `workspace_root`, if there is one.
    pub fn load(workspace_root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = workspace_root.join(CONFIG_DIR).join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let config =
            serde_json::from_str(&text).map_err(|source| ConfigError::Json { path, source })?;
        Ok(Some(config))
    }
}

// ============================================================================
// Configuration Resolution
// ============================================================================

/// CLI configuration overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--data`
    pub data: Option<PathBuf>,
    /// `--max-depth`
    pub max_depth: Option<usize>,
    /// `--external`; only `true` overrides.
    pub keep_external: bool,
    /// `-r/--root`
    pub roots: Vec<String>,
}

/// Resolved configuration with precedence information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Dataset path.
    pub data: ConfigValue<PathBuf>,
    /// Default depth bound of edge rules. `None` is unbounded.
    pub max_depth: Option<ConfigValue<usize>>,
    pub keep_external: ConfigValue<bool>,
    /// Root filter terms. CLI roots replace configured ones.
    pub roots: Vec<ConfigValue<String>>,
}

impl ResolvedConfig {
    /// Resolve configuration from all sources, reading the process environment.
    pub fn resolve(workspace_root: &Path, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        ResolvedConfig::resolve_with_env(workspace_root, overrides, |key| {
            std::env::var(key).ok()
        })
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve_with_env<F>(
        workspace_root: &Path,
        overrides: &CliOverrides,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ResolvedConfig::defaults(workspace_root);

        if let Some(project) = ProjectConfig::load(workspace_root)? {
            config.apply_project_config(workspace_root, project);
        }
        config.apply_env_vars(env)?;
        config.apply_cli_overrides(overrides);

        debug!(
            data = %config.data.value.display(),
            max_depth = ?config.max_depth.as_ref().map(|v| v.value),
            keep_external = config.keep_external.value,
            roots = config.roots.len(),
            "resolved config"
        );
        Ok(config)
    }

    fn defaults(workspace_root: &Path) -> Self {
        ResolvedConfig {
            data: ConfigValue::new(
                workspace_root.join(DEFAULT_DATA_FILE),
                ConfigSource::Default,
            ),
            max_depth: None,
            keep_external: ConfigValue::new(false, ConfigSource::Default),
            roots: Vec::new(),
        }
    }

    fn apply_project_config(&mut self, workspace_root: &Path, project: ProjectConfig) {
        let source = ConfigSource::ProjectConfig;
        if let Some(data) = project.data {
            self.set_data(workspace_root.join(data), source);
        }
        if let Some(depth) = project.max_depth {
            self.set_max_depth(depth, source);
        }
        if let Some(keep) = project.keep_external {
            self.keep_external = self.keep_external.clone().merge(ConfigValue::new(keep, source));
        }
        if !project.roots.is_empty() {
            self.roots = project
                .roots
                .into_iter()
                .map(|r| ConfigValue::new(r, source))
                .collect();
        }
    }

    fn apply_env_vars<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = ConfigSource::EnvVar;
        if let Some(data) = env(ENV_DATA).filter(|v| !v.trim().is_empty()) {
            self.set_data(PathBuf::from(data), source);
        }
        if let Some(depth) = env(ENV_MAX_DEPTH).filter(|v| !v.trim().is_empty()) {
            let parsed = depth
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_MAX_DEPTH.to_string(),
                    value: depth.clone(),
                })?;
            self.set_max_depth(parsed, source);
        }
        if let Some(keep) = env(ENV_KEEP_EXTERNAL).filter(|v| !v.trim().is_empty()) {
            let parsed = parse_bool(&keep).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_KEEP_EXTERNAL.to_string(),
                value: keep.clone(),
            })?;
            self.keep_external = self
                .keep_external
                .clone()
                .merge(ConfigValue::new(parsed, source));
        }
        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        let source = ConfigSource::CliFlag;
        if let Some(ref data) = overrides.data {
            self.set_data(data.clone(), source);
        }
        if let Some(depth) = overrides.max_depth {
            self.set_max_depth(depth, source);
        }
        if overrides.keep_external {
            self.keep_external = ConfigValue::new(true, source);
        }
        if !overrides.roots.is_empty() {
            self.roots = overrides
                .roots
                .iter()
                .map(|r| ConfigValue::new(r.clone(), source))
                .collect();
        }
    }

    fn set_data(&mut self, path: PathBuf, source: ConfigSource) {
        self.data = self.data.clone().merge(ConfigValue::new(path, source));
    }

    fn set_max_depth(&mut self, depth: usize, source: ConfigSource) {
        let value = ConfigValue::new(depth, source);
        self.max_depth = Some(match self.max_depth.take() {
            Some(current) => current.merge(value),
            None => value,
        });
    }

    /// Root terms as plain strings.
    pub fn root_terms(&self) -> Vec<String> {
        self.roots.iter().map(|r| r.value.clone()).collect()
    }

    /// Parser options implied by this configuration.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new().with_default_max_depth(self.max_depth.as_ref().map(|v| v.value))
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
