// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Honeybadger source map uploader.
//!
//! This crate provides:
//! - Layered configuration from multiple sources
//! - TOML configuration file parsing
//! - Environment variable overrides, including `*_FILE` secrets
//! - Conversion into the plugin's [`PluginConfig`](honeybadger_sourcemap::PluginConfig)

pub mod error;
pub mod layer;
pub mod registry;
pub mod runtime;
pub mod sources;

pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use registry::ConfigRegistry;
pub use runtime::{HoneybadgerConfig, LogFormat, LogLevel, LoggingConfig};
pub use sources::{CliOverrides, ConfigSource, Precedence, DEFAULT_CONFIG_FILE};

/// Load configuration with CLI overrides.
///
/// Reads `overrides.config_file` when given, else `./honeybadger.toml` if it
/// exists, then the `HONEYBADGER_*` environment, then the overrides.
pub fn load_config_with_cli(cli: CliOverrides) -> Result<HoneybadgerConfig, ConfigError> {
	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	match &cli.config_file {
		Some(path) => registry.register(Box::new(sources::FileSource::explicit(path))),
		None => registry.register(Box::new(sources::FileSource::workspace()?)),
	}
	registry.register(Box::new(sources::EnvSource::from_env()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load()
}

/// Load configuration from defaults, file and environment.
pub fn load_config() -> Result<HoneybadgerConfig, ConfigError> {
	load_config_with_cli(CliOverrides::default())
}
