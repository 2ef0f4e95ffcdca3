// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: files, environment, CLI, defaults.

use std::collections::HashMap;
use std::path::PathBuf;

use honeybadger_sourcemap::ApiKey;
use tracing::{debug, trace};

use crate::layer::*;
use crate::ConfigError;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "honeybadger.toml";

/// Prefix shared by every recognised environment variable.
pub const ENV_PREFIX: &str = "HONEYBADGER_";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	File = 30,
	Environment = 50,
	Cli = 60,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	/// Name for logging
	fn name(&self) -> &'static str;

	fn precedence(&self) -> Precedence;

	/// Load configuration layer from this source
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading defaults");
		// Defaults are applied when the runtime config is built
		Ok(ConfigLayer::default())
	}
}

/// TOML file source.
pub struct FileSource {
	path: PathBuf,
	required: bool,
}

impl FileSource {
	/// `./honeybadger.toml`, skipped when absent.
	pub fn workspace() -> Result<Self, ConfigError> {
		let cwd = std::env::current_dir()?;
		Ok(Self {
			path: cwd.join(DEFAULT_CONFIG_FILE),
			required: false,
		})
	}

	/// A file named on the command line. Missing is an error.
	pub fn explicit(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &'static str {
		"config-file"
	}
	fn precedence(&self) -> Precedence {
		Precedence::File
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");

		let content = std::fs::read_to_string(&self.path)?;
		let layer: ConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!(path = %self.path.display(), "parsed config layer");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `HONEYBADGER_<FIELD>`, with `HONEYBADGER_DEPLOY_*` and
/// `HONEYBADGER_LOG_*` for the nested sections. The API key may also be read
/// from the file named by `HONEYBADGER_API_KEY_FILE`.
pub struct EnvSource {
	vars: HashMap<String, String>,
}

impl EnvSource {
	/// Snapshot of the process environment.
	pub fn from_env() -> Self {
		Self::from_vars(std::env::vars())
	}

	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.filter(|(k, _)| k.starts_with(ENV_PREFIX))
				.collect(),
		}
	}

	fn api_key(&self) -> Result<Option<ApiKey>, ConfigError> {
		let file_var = "HONEYBADGER_API_KEY_FILE";
		if let Some(path) = self.vars.get(file_var) {
			if path.is_empty() {
				return Err(ConfigError::invalid_value(file_var, "path is empty"));
			}
			let path = PathBuf::from(path);
			let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::SecretFile {
				var: file_var.to_string(),
				path: path.clone(),
				source,
			})?;
			trace!("loaded API key from file");
			return Ok(non_empty_key(&content));
		}

		Ok(self
			.vars
			.get("HONEYBADGER_API_KEY")
			.and_then(|value| non_empty_key(value)))
	}
}

/// Blank keys are treated as unset so they never shadow a lower layer.
fn non_empty_key(value: &str) -> Option<ApiKey> {
	let value = value.trim();
	(!value.is_empty()).then(|| ApiKey::new(value))
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let mut layer = ConfigLayer {
			api_key: self.api_key()?,
			..Default::default()
		};

		for (key, value) in &self.vars {
			let value = value.trim().to_string();
			if value.is_empty() {
				continue;
			}

			trace!(key = %key, "processing env var");

			match key.as_str() {
				"HONEYBADGER_ASSETS_URL" => layer.assets_url = Some(value),
				"HONEYBADGER_ENDPOINT" => layer.endpoint = Some(value),
				"HONEYBADGER_REVISION" => layer.revision = Some(value),
				"HONEYBADGER_SILENT" => layer.silent = Some(parse_bool(key, &value)?),
				"HONEYBADGER_IGNORE_ERRORS" => {
					layer.ignore_errors = Some(parse_bool(key, &value)?);
				}
				"HONEYBADGER_RETRIES" => layer.retries = Some(parse_number(key, &value)?),
				"HONEYBADGER_REQUEST_TIMEOUT_SECS" => {
					layer.request_timeout_secs = Some(parse_number(key, &value)?);
				}

				// Deploy
				"HONEYBADGER_DEPLOY_ENVIRONMENT" => layer.deploy_mut().environment = Some(value),
				"HONEYBADGER_DEPLOY_REPOSITORY" => layer.deploy_mut().repository = Some(value),
				"HONEYBADGER_DEPLOY_LOCAL_USERNAME" => {
					layer.deploy_mut().local_username = Some(value);
				}

				// Logging
				"HONEYBADGER_LOG_LEVEL" => layer.logging_mut().level = Some(value),
				"HONEYBADGER_LOG_FORMAT" => layer.logging_mut().format = Some(value),

				_ => {
					// Unknown or already handled
				}
			}
		}

		Ok(layer)
	}
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::invalid_value(
			field,
			format!("expected a boolean, got '{value}'"),
		)),
	}
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
	value.parse().map_err(|_| {
		ConfigError::invalid_value(field, format!("expected a non-negative integer, got '{value}'"))
	})
}

/// CLI override source.
pub struct CliSource {
	overrides: CliOverrides,
}

/// CLI argument overrides.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub api_key: Option<ApiKey>,
	pub assets_url: Option<String>,
	pub endpoint: Option<String>,
	pub revision: Option<String>,
	pub silent: Option<bool>,
	pub ignore_errors: Option<bool>,
	pub retries: Option<u32>,
	pub request_timeout_secs: Option<u64>,
	pub deploy_environment: Option<String>,
	pub deploy_repository: Option<String>,
	pub deploy_local_username: Option<String>,
	pub log_level: Option<String>,
	pub log_format: Option<String>,
	pub config_file: Option<PathBuf>,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &'static str {
		"cli"
	}
	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		debug!("loading CLI overrides");
		let o = self.overrides.clone();
		let mut layer = ConfigLayer {
			api_key: o.api_key,
			assets_url: o.assets_url,
			endpoint: o.endpoint,
			revision: o.revision,
			silent: o.silent,
			ignore_errors: o.ignore_errors,
			retries: o.retries,
			request_timeout_secs: o.request_timeout_secs,
			..Default::default()
		};

		if let Some(environment) = o.deploy_environment {
			layer.deploy_mut().environment = Some(environment);
		}
		if let Some(repository) = o.deploy_repository {
			layer.deploy_mut().repository = Some(repository);
		}
		if let Some(local_username) = o.deploy_local_username {
			layer.deploy_mut().local_username = Some(local_username);
		}
		if let Some(level) = o.log_level {
			layer.logging_mut().level = Some(level);
		}
		if let Some(format) = o.log_format {
			layer.logging_mut().format = Some(format);
		}

		Ok(layer)
	}
}
