// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use std::str::FromStr;
use std::time::Duration;

use honeybadger_sourcemap::{
	ApiKey, DeployConfig, PluginConfig, DEFAULT_ENDPOINT, DEFAULT_RETRIES, DEFAULT_REVISION,
	MAX_RETRIES,
};
use serde::Serialize;

use crate::layer::*;
use crate::ConfigError;

/// The merged configuration for one uploader run.
///
/// Required options stay optional here; the plugin reports them when it runs.
#[derive(Debug, Clone, Serialize)]
pub struct HoneybadgerConfig {
	pub api_key: Option<ApiKey>,
	pub assets_url: Option<String>,
	pub endpoint: String,
	pub revision: String,
	pub silent: bool,
	pub ignore_errors: bool,
	pub retries: u32,
	pub request_timeout_secs: Option<u64>,
	pub deploy: Option<DeployConfig>,
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

impl FromStr for LogLevel {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"error" => Ok(LogLevel::Error),
			"warn" | "warning" => Ok(LogLevel::Warn),
			"info" => Ok(LogLevel::Info),
			"debug" => Ok(LogLevel::Debug),
			"trace" => Ok(LogLevel::Trace),
			other => Err(ConfigError::invalid_value(
				"logging.level",
				format!("unknown level '{other}'"),
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
	Compact,
}

impl FromStr for LogFormat {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			"compact" => Ok(LogFormat::Compact),
			other => Err(ConfigError::invalid_value(
				"logging.format",
				format!("unknown format '{other}'"),
			)),
		}
	}
}

impl HoneybadgerConfig {
	/// Build runtime config from a merged layer.
	pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
		let logging = build_logging_config(layer.logging)?;

		Ok(Self {
			api_key: layer.api_key,
			assets_url: layer.assets_url,
			endpoint: layer
				.endpoint
				.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			revision: layer
				.revision
				.unwrap_or_else(|| DEFAULT_REVISION.to_string()),
			silent: layer.silent.unwrap_or(false),
			ignore_errors: layer.ignore_errors.unwrap_or(false),
			retries: layer.retries.unwrap_or(DEFAULT_RETRIES).min(MAX_RETRIES),
			request_timeout_secs: layer.request_timeout_secs,
			deploy: layer.deploy.map(|d| DeployConfig {
				environment: d.environment,
				repository: d.repository,
				local_username: d.local_username,
			}),
			logging,
		})
	}

	/// The options handed to the plugin.
	pub fn plugin_config(&self) -> PluginConfig {
		let mut builder = PluginConfig::builder()
			.endpoint(self.endpoint.clone())
			.revision(self.revision.clone())
			.silent(self.silent)
			.ignore_errors(self.ignore_errors)
			.retries(self.retries);

		if let Some(api_key) = &self.api_key {
			builder = builder.api_key(api_key.clone());
		}
		if let Some(assets_url) = &self.assets_url {
			builder = builder.assets_url(assets_url.clone());
		}
		if let Some(deploy) = &self.deploy {
			builder = builder.deploy(deploy.clone());
		}
		if let Some(secs) = self.request_timeout_secs {
			builder = builder.request_timeout(Duration::from_secs(secs));
		}

		builder.build()
	}
}

fn build_logging_config(layer: Option<LoggingLayer>) -> Result<LoggingConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	Ok(LoggingConfig {
		level: layer
			.level
			.as_deref()
			.map(str::parse)
			.transpose()?
			.unwrap_or_default(),
		format: layer
			.format
			.as_deref()
			.map(str::parse)
			.transpose()?
			.unwrap_or_default(),
	})
}
