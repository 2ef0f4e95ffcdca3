// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use honeybadger_sourcemap::ApiKey;
use serde::Deserialize;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
	#[serde(default)]
	pub api_key: Option<ApiKey>,
	#[serde(default)]
	pub assets_url: Option<String>,
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub revision: Option<String>,
	#[serde(default)]
	pub silent: Option<bool>,
	#[serde(default)]
	pub ignore_errors: Option<bool>,
	#[serde(default)]
	pub retries: Option<u32>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub deploy: Option<DeployLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployLayer {
	#[serde(default)]
	pub environment: Option<String>,
	#[serde(default)]
	pub repository: Option<String>,
	#[serde(default)]
	pub local_username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

impl ConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ConfigLayer) {
		overwrite(&mut self.api_key, other.api_key);
		overwrite(&mut self.assets_url, other.assets_url);
		overwrite(&mut self.endpoint, other.endpoint);
		overwrite(&mut self.revision, other.revision);
		overwrite(&mut self.silent, other.silent);
		overwrite(&mut self.ignore_errors, other.ignore_errors);
		overwrite(&mut self.retries, other.retries);
		overwrite(&mut self.request_timeout_secs, other.request_timeout_secs);
		merge_option(&mut self.deploy, other.deploy, DeployLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
	}

	pub(crate) fn deploy_mut(&mut self) -> &mut DeployLayer {
		self.deploy.get_or_insert_with(DeployLayer::default)
	}

	pub(crate) fn logging_mut(&mut self) -> &mut LoggingLayer {
		self.logging.get_or_insert_with(LoggingLayer::default)
	}
}

fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
	if source.is_some() {
		*target = source;
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

impl DeployLayer {
	fn merge(&mut self, other: DeployLayer) {
		overwrite(&mut self.environment, other.environment);
		overwrite(&mut self.repository, other.repository);
		overwrite(&mut self.local_username, other.local_username);
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		overwrite(&mut self.level, other.level);
		overwrite(&mut self.format, other.format);
	}
}
