// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plugin configuration, resolved once and immutable afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigValidationError;
use crate::secret::ApiKey;

/// Default source map upload endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.honeybadger.io/v1/source_maps";
/// Deploy notification endpoint.
pub const DEPLOY_ENDPOINT: &str = "https://api.honeybadger.io/v1/deploys";
/// Revision reported when none is configured.
pub const DEFAULT_REVISION: &str = "master";
/// Transport retries when none are configured.
pub const DEFAULT_RETRIES: u32 = 3;
/// Upper bound for configured retries.
pub const MAX_RETRIES: u32 = 10;

type UrlFn = dyn Fn(&str) -> String + Send + Sync;

/// Where the minified scripts are served from.
///
/// Either a base URL that asset names are appended to, or a function that
/// computes the full URL for a given asset name.
#[derive(Clone)]
pub enum AssetsUrl {
	Literal(String),
	Computed(Arc<UrlFn>),
}

impl AssetsUrl {
	pub fn computed<F>(f: F) -> Self
	where
		F: Fn(&str) -> String + Send + Sync + 'static,
	{
		AssetsUrl::Computed(Arc::new(f))
	}

	/// Public URL of `source_file`.
	///
	/// Literal bases are joined with exactly one `/`.
	pub fn resolve_url(&self, source_file: &str) -> String {
		match self {
			AssetsUrl::Literal(base) => {
				let sep = if base.ends_with('/') { "" } else { "/" };
				format!("{base}{sep}{source_file}")
			}
			AssetsUrl::Computed(f) => f(source_file),
		}
	}

	fn is_present(&self) -> bool {
		match self {
			AssetsUrl::Literal(base) => !base.is_empty(),
			AssetsUrl::Computed(_) => true,
		}
	}
}

impl fmt::Debug for AssetsUrl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AssetsUrl::Literal(base) => f.debug_tuple("Literal").field(base).finish(),
			AssetsUrl::Computed(_) => f.write_str("Computed(<fn>)"),
		}
	}
}

impl From<String> for AssetsUrl {
	fn from(base: String) -> Self {
		AssetsUrl::Literal(base)
	}
}

impl From<&str> for AssetsUrl {
	fn from(base: &str) -> Self {
		AssetsUrl::Literal(base.to_string())
	}
}

/// Deploy attributes. The notification is only sent when all three are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub repository: Option<String>,
	#[serde(default, alias = "localUsername")]
	pub local_username: Option<String>,
}

/// A deploy descriptor with every field present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployTarget<'a> {
	pub environment: &'a str,
	pub repository: &'a str,
	pub local_username: &'a str,
}

impl DeployConfig {
	pub fn new(
		environment: impl Into<String>,
		repository: impl Into<String>,
		local_username: impl Into<String>,
	) -> Self {
		Self {
			environment: Some(environment.into()),
			repository: Some(repository.into()),
			local_username: Some(local_username.into()),
		}
	}

	/// All three attributes, or `None` if any is absent or empty.
	pub fn target(&self) -> Option<DeployTarget<'_>> {
		fn present(v: &Option<String>) -> Option<&str> {
			v.as_deref().filter(|s| !s.is_empty())
		}

		Some(DeployTarget {
			environment: present(&self.environment)?,
			repository: present(&self.repository)?,
			local_username: present(&self.local_username)?,
		})
	}
}

/// Options that must be present before anything is uploaded.
#[derive(Debug, Clone, Copy)]
pub struct RequiredOptions<'a> {
	pub api_key: &'a ApiKey,
	pub assets_url: &'a AssetsUrl,
}

/// Resolved plugin configuration.
#[derive(Debug, Clone)]
pub struct PluginConfig {
	api_key: Option<ApiKey>,
	assets_url: Option<AssetsUrl>,
	endpoint: String,
	deploy_endpoint: String,
	revision: String,
	silent: bool,
	ignore_errors: bool,
	retries: u32,
	deploy: Option<DeployConfig>,
	request_timeout: Option<Duration>,
}

impl PluginConfig {
	pub fn builder() -> PluginConfigBuilder {
		PluginConfigBuilder::new()
	}

	pub fn api_key(&self) -> Option<&ApiKey> {
		self.api_key.as_ref()
	}

	pub fn assets_url(&self) -> Option<&AssetsUrl> {
		self.assets_url.as_ref()
	}

	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn deploy_endpoint(&self) -> &str {
		&self.deploy_endpoint
	}

	pub fn revision(&self) -> &str {
		&self.revision
	}

	pub fn silent(&self) -> bool {
		self.silent
	}

	pub fn ignore_errors(&self) -> bool {
		self.ignore_errors
	}

	/// Transport retries per request, already clamped to [`MAX_RETRIES`].
	pub fn retries(&self) -> u32 {
		self.retries
	}

	pub fn deploy(&self) -> Option<&DeployConfig> {
		self.deploy.as_ref()
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout
	}

	/// Checks the required options.
	///
	/// Returns one error per missing field, in the order `apiKey`, `assetsUrl`.
	pub fn validate(&self) -> Result<RequiredOptions<'_>, Vec<ConfigValidationError>> {
		let api_key = self.api_key.as_ref().filter(|k| !k.is_empty());
		let assets_url = self.assets_url.as_ref().filter(|u| u.is_present());

		match (api_key, assets_url) {
			(Some(api_key), Some(assets_url)) => Ok(RequiredOptions {
				api_key,
				assets_url,
			}),
			(api_key, assets_url) => {
				let mut errors = Vec::new();
				if api_key.is_none() {
					errors.push(ConfigValidationError::MissingField("apiKey"));
				}
				if assets_url.is_none() {
					errors.push(ConfigValidationError::MissingField("assetsUrl"));
				}
				Err(errors)
			}
		}
	}
}

/// Builder for [`PluginConfig`].
///
/// Building never fails; missing required options are reported when the
/// plugin runs, so that they reach the build's error list.
pub struct PluginConfigBuilder {
	api_key: Option<ApiKey>,
	assets_url: Option<AssetsUrl>,
	endpoint: Option<String>,
	deploy_endpoint: Option<String>,
	revision: Option<String>,
	silent: bool,
	ignore_errors: bool,
	retries: Option<u32>,
	deploy: Option<DeployConfig>,
	request_timeout: Option<Duration>,
}

impl PluginConfigBuilder {
	pub fn new() -> Self {
		Self {
			api_key: None,
			assets_url: None,
			endpoint: None,
			deploy_endpoint: None,
			revision: None,
			silent: false,
			ignore_errors: false,
			retries: None,
			deploy: None,
			request_timeout: None,
		}
	}

	pub fn api_key(mut self, key: impl Into<ApiKey>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	/// Base URL or URL function for the minified scripts.
	///
	/// Example: `https://cdn.example.com/assets`
	pub fn assets_url(mut self, url: impl Into<AssetsUrl>) -> Self {
		self.assets_url = Some(url.into());
		self
	}

	pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = Some(endpoint.into());
		self
	}

	/// Overrides the deploy endpoint. Only useful against a test server.
	pub fn deploy_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.deploy_endpoint = Some(endpoint.into());
		self
	}

	/// Example: a git commit SHA or branch name
	pub fn revision(mut self, revision: impl Into<String>) -> Self {
		self.revision = Some(revision.into());
		self
	}

	pub fn silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	pub fn ignore_errors(mut self, ignore_errors: bool) -> Self {
		self.ignore_errors = ignore_errors;
		self
	}

	pub fn retries(mut self, retries: u32) -> Self {
		self.retries = Some(retries);
		self
	}

	pub fn deploy(mut self, deploy: DeployConfig) -> Self {
		self.deploy = Some(deploy);
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}

	pub fn build(self) -> PluginConfig {
		let requested = self.retries.unwrap_or(DEFAULT_RETRIES);
		let retries = requested.min(MAX_RETRIES);
		if retries != requested {
			debug!(requested, retries, "clamped retries to maximum");
		}

		PluginConfig {
			api_key: self.api_key,
			assets_url: self.assets_url,
			endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			deploy_endpoint: self
				.deploy_endpoint
				.unwrap_or_else(|| DEPLOY_ENDPOINT.to_string()),
			revision: self.revision.unwrap_or_else(|| DEFAULT_REVISION.to_string()),
			silent: self.silent,
			ignore_errors: self.ignore_errors,
			retries,
			deploy: self.deploy,
			request_timeout: self.request_timeout,
		}
	}
}

impl Default for PluginConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn valid() -> PluginConfigBuilder {
		PluginConfig::builder()
			.api_key("abcd1234")
			.assets_url("https://cdn.example.com/assets")
	}

	#[test]
	fn test_defaults() {
		let config = valid().build();
		assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
		assert_eq!(config.deploy_endpoint(), DEPLOY_ENDPOINT);
		assert_eq!(config.revision(), "master");
		assert!(!config.silent());
		assert!(!config.ignore_errors());
		assert_eq!(config.retries(), 3);
		assert!(config.deploy().is_none());
		assert!(config.request_timeout().is_none());
	}

	#[test]
	fn test_retries_clamped_to_max() {
		assert_eq!(valid().retries(25).build().retries(), MAX_RETRIES);
		assert_eq!(valid().retries(10).build().retries(), 10);
	}

	#[test]
	fn test_zero_retries_honored() {
		assert_eq!(valid().retries(0).build().retries(), 0);
	}

	#[test]
	fn test_validate_accepts_required_fields() {
		let config = valid().build();
		let required = config.validate().unwrap();
		assert_eq!(required.api_key.expose(), "abcd1234");
	}

	#[test]
	fn test_validate_reports_each_missing_field() {
		let config = PluginConfig::builder().build();
		let errors = config.validate().unwrap_err();
		assert_eq!(
			errors,
			vec![
				ConfigValidationError::MissingField("apiKey"),
				ConfigValidationError::MissingField("assetsUrl"),
			]
		);
	}

	#[test]
	fn test_validate_treats_empty_values_as_missing() {
		let config = PluginConfig::builder()
			.api_key("")
			.assets_url("https://cdn.example.com")
			.build();
		assert_eq!(
			config.validate().unwrap_err(),
			vec![ConfigValidationError::MissingField("apiKey")]
		);

		let config = PluginConfig::builder().api_key("k").assets_url("").build();
		assert_eq!(
			config.validate().unwrap_err(),
			vec![ConfigValidationError::MissingField("assetsUrl")]
		);
	}

	#[test]
	fn test_literal_url_adds_separator() {
		let url = AssetsUrl::from("https://cdn.example.com/assets");
		assert_eq!(
			url.resolve_url("app.81c1.js"),
			"https://cdn.example.com/assets/app.81c1.js"
		);
	}

	#[test]
	fn test_literal_url_keeps_existing_separator() {
		let url = AssetsUrl::from("https://cdn.example.com/assets/");
		assert_eq!(
			url.resolve_url("app.81c1.js"),
			"https://cdn.example.com/assets/app.81c1.js"
		);
	}

	#[test]
	fn test_computed_url() {
		let url = AssetsUrl::computed(|file| format!("https://static.example.com/v2/{file}?cb=1"));
		assert_eq!(
			url.resolve_url("vendor.js"),
			"https://static.example.com/v2/vendor.js?cb=1"
		);
		assert_eq!(format!("{url:?}"), "Computed(<fn>)");
	}

	#[test]
	fn test_deploy_target_requires_all_fields() {
		let full = DeployConfig::new("production", "git@github.com:acme/app", "ci");
		let target = full.target().unwrap();
		assert_eq!(target.environment, "production");
		assert_eq!(target.local_username, "ci");

		let no_env = DeployConfig {
			environment: None,
			..full.clone()
		};
		assert!(no_env.target().is_none());

		let no_repo = DeployConfig {
			repository: None,
			..full.clone()
		};
		assert!(no_repo.target().is_none());

		let empty_user = DeployConfig {
			local_username: Some(String::new()),
			..full
		};
		assert!(empty_user.target().is_none());
	}

	#[test]
	fn test_config_debug_redacts_key() {
		let config = valid().build();
		let debug = format!("{config:?}");
		assert!(!debug.contains("abcd1234"));
		assert!(debug.contains("[REDACTED]"));
	}

	proptest! {
		#[test]
		fn literal_url_has_single_separator(base in "https://[a-z]{1,10}\\.com(/[a-z]{1,8}){0,3}/?", file in "[a-z0-9]{1,12}\\.js") {
			let url = AssetsUrl::from(base.clone()).resolve_url(&file);
			let trimmed = base.trim_end_matches('/');
			prop_assert_eq!(url, format!("{trimmed}/{file}"));
		}

		#[test]
		fn retries_never_exceed_max(retries in any::<u32>()) {
			let config = valid().retries(retries).build();
			prop_assert!(config.retries() <= MAX_RETRIES);
			prop_assert_eq!(config.retries(), retries.min(MAX_RETRIES));
		}
	}
}
