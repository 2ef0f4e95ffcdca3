// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-emit upload cycle.
//!
//! A host integration calls [`SourceMapPlugin::after_emit`] once after each
//! completed emit and awaits it before letting the build finish.

use std::sync::Arc;

use futures::future::join_all;
use honeybadger_common_http::RetryConfig;
use tracing::{debug, info, instrument, warn};

use crate::assets::{resolve, AssetPair, ChunkDescriptor};
use crate::config::{PluginConfig, RequiredOptions};
use crate::deploy::{DeployNotifier, DeployStatus};
use crate::error::{PluginError, UploadBatchError, UploadError};
use crate::loader::AssetLoader;
use crate::notice::{NoticeSink, TracingNotices};
use crate::upload::{UploadClient, UploadOutcome, Uploaded};

/// Notice emitted when the build produced no uploadable pairs.
pub const NO_ASSETS_NOTICE: &str = "No assets found. Nothing will be uploaded.";

/// What the host build exposes to the plugin after an emit.
pub trait Compilation {
	type Assets: AssetLoader;

	fn chunks(&self) -> &[ChunkDescriptor];

	fn assets(&self) -> &Self::Assets;

	/// Adds a diagnostic that fails the build.
	fn push_error(&mut self, error: PluginError);

	fn push_warning(&mut self, warning: PluginError);
}

/// A plain [`Compilation`] for hosts without their own result object.
#[derive(Debug)]
pub struct BuildOutput<L> {
	chunks: Vec<ChunkDescriptor>,
	assets: L,
	errors: Vec<PluginError>,
	warnings: Vec<PluginError>,
}

impl<L: AssetLoader> BuildOutput<L> {
	pub fn new(chunks: Vec<ChunkDescriptor>, assets: L) -> Self {
		Self {
			chunks,
			assets,
			errors: Vec::new(),
			warnings: Vec::new(),
		}
	}

	pub fn errors(&self) -> &[PluginError] {
		&self.errors
	}

	pub fn warnings(&self) -> &[PluginError] {
		&self.warnings
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}
}

impl<L: AssetLoader> Compilation for BuildOutput<L> {
	type Assets = L;

	fn chunks(&self) -> &[ChunkDescriptor] {
		&self.chunks
	}

	fn assets(&self) -> &L {
		&self.assets
	}

	fn push_error(&mut self, error: PluginError) {
		self.errors.push(error);
	}

	fn push_warning(&mut self, warning: PluginError) {
		self.warnings.push(warning);
	}
}

/// How an emit cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleSummary {
	/// Required options were missing; errors were reported and nothing ran.
	InvalidConfig,
	/// No script/source map pairs were found.
	NoAssets,
	Completed {
		uploaded: Vec<String>,
		failed: Vec<String>,
		deploy: DeployStatus,
	},
}

/// Uploads source maps after each emit and optionally reports the deploy.
#[derive(Clone)]
pub struct SourceMapPlugin {
	config: Arc<PluginConfig>,
	uploader: UploadClient,
	notifier: DeployNotifier,
	notices: Arc<dyn NoticeSink>,
}

impl SourceMapPlugin {
	/// Creates a plugin that reports notices as `info` events.
	pub fn new(config: PluginConfig) -> Result<Self, PluginError> {
		Self::with_notices(config, Arc::new(TracingNotices))
	}

	pub fn with_notices(
		config: PluginConfig,
		notices: Arc<dyn NoticeSink>,
	) -> Result<Self, PluginError> {
		let mut builder = honeybadger_common_http::builder();
		if let Some(timeout) = config.request_timeout() {
			builder = builder.timeout(timeout);
		}
		let http = builder.build()?;

		let config = Arc::new(config);
		Ok(Self {
			uploader: UploadClient::new(http.clone(), Arc::clone(&config), Arc::clone(&notices)),
			notifier: DeployNotifier::new(http, Arc::clone(&config), Arc::clone(&notices)),
			config,
			notices,
		})
	}

	/// Overrides the transport backoff for uploads and the deploy notification.
	pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
		self.uploader = self.uploader.with_retry_config(retry.clone());
		self.notifier = self.notifier.with_retry_config(retry);
		self
	}

	pub fn config(&self) -> &PluginConfig {
		&self.config
	}

	/// Runs one upload cycle against the emitted build.
	///
	/// Validation and upload failures go to the compilation's error or
	/// warning list. Only a deploy notification failure that is not ignored
	/// comes back as `Err`.
	#[instrument(skip_all, fields(revision = %self.config.revision()))]
	pub async fn after_emit<C: Compilation>(
		&self,
		compilation: &mut C,
	) -> Result<CycleSummary, PluginError> {
		let required = match self.config.validate() {
			Ok(required) => required,
			Err(errors) => {
				for error in errors {
					warn!(%error, "invalid configuration");
					compilation.push_error(error.into());
				}
				return Ok(CycleSummary::InvalidConfig);
			}
		};

		let pairs = resolve(compilation.chunks());
		if pairs.is_empty() {
			if !self.config.silent() {
				self.notices.notice(NO_ASSETS_NOTICE);
			}
			return Ok(CycleSummary::NoAssets);
		}

		debug!(pairs = pairs.len(), "uploading source maps");
		let outcomes = self
			.upload_all(&required, compilation.assets(), &pairs)
			.await;

		let mut uploaded = Vec::new();
		let mut failures = Vec::new();
		for outcome in outcomes {
			match outcome {
				Ok(Uploaded { source_map }) => uploaded.push(source_map),
				Err(err) => failures.push(err),
			}
		}
		let failed: Vec<String> = failures.iter().map(|e| e.source_map().to_string()).collect();
		info!(
			uploaded = uploaded.len(),
			failed = failures.len(),
			"source map upload finished"
		);

		if !failures.is_empty() {
			self.report_failures(compilation, UploadBatchError::new(failures));
		}

		let deploy = self.notifier.notify().await?;

		Ok(CycleSummary::Completed {
			uploaded,
			failed,
			deploy,
		})
	}

	async fn upload_all<L: AssetLoader>(
		&self,
		required: &RequiredOptions<'_>,
		assets: &L,
		pairs: &[AssetPair],
	) -> Vec<UploadOutcome> {
		join_all(
			pairs
				.iter()
				.map(|pair| self.upload_pair(required, assets, pair)),
		)
		.await
	}

	async fn upload_pair<L: AssetLoader>(
		&self,
		required: &RequiredOptions<'_>,
		assets: &L,
		pair: &AssetPair,
	) -> UploadOutcome {
		let (script, source_map) = futures::try_join!(
			assets.load(&pair.source_file),
			assets.load(&pair.source_map)
		)
		.map_err(|source| UploadError::Read {
			source_map: pair.source_map.clone(),
			source,
		})?;

		self.uploader
			.upload(required, pair, script, source_map)
			.await
	}

	fn report_failures<C: Compilation>(&self, compilation: &mut C, batch: UploadBatchError) {
		let error = PluginError::from(batch);
		match (self.config.ignore_errors(), self.config.silent()) {
			(false, _) => compilation.push_error(error),
			(true, false) => compilation.push_warning(error),
			(true, true) => debug!(%error, "dropping ignored upload failures"),
		}
	}
}

impl std::fmt::Debug for SourceMapPlugin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SourceMapPlugin")
			.field("config", &self.config)
			.field("uploader", &self.uploader)
			.field("notifier", &self.notifier)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::loader::MemoryAssets;
	use crate::notice::RecordingNotices;

	fn plugin(config: PluginConfig) -> (SourceMapPlugin, Arc<RecordingNotices>) {
		let notices = Arc::new(RecordingNotices::new());
		let plugin = SourceMapPlugin::with_notices(config, notices.clone()).unwrap();
		(plugin, notices)
	}

	#[tokio::test]
	async fn test_invalid_config_reports_every_missing_field() {
		let (plugin, notices) = plugin(PluginConfig::builder().build());
		let mut build = BuildOutput::new(
			vec![ChunkDescriptor::new(["app.js", "app.js.map"])],
			MemoryAssets::new(),
		);

		let summary = plugin.after_emit(&mut build).await.unwrap();

		assert_eq!(summary, CycleSummary::InvalidConfig);
		let messages: Vec<_> = build.errors().iter().map(ToString::to_string).collect();
		assert_eq!(
			messages,
			vec![
				"HoneybadgerSourceMapPlugin: required field, 'apiKey', is missing.",
				"HoneybadgerSourceMapPlugin: required field, 'assetsUrl', is missing.",
			]
		);
		assert!(build.warnings().is_empty());
		assert!(notices.messages().is_empty());
	}

	#[tokio::test]
	async fn test_no_assets_emits_single_notice() {
		let (plugin, notices) = plugin(
			PluginConfig::builder()
				.api_key("abcd1234")
				.assets_url("https://cdn.example.com")
				// Unroutable: any request would fail the cycle.
				.endpoint("http://127.0.0.1:9/v1/source_maps")
				.build(),
		);
		let mut build = BuildOutput::new(
			vec![ChunkDescriptor::new(["app.js"]), ChunkDescriptor::new(["styles.css"])],
			MemoryAssets::new(),
		);

		let summary = plugin.after_emit(&mut build).await.unwrap();

		assert_eq!(summary, CycleSummary::NoAssets);
		assert_eq!(notices.messages(), vec![NO_ASSETS_NOTICE]);
		assert!(!build.has_errors());
	}

	#[tokio::test]
	async fn test_no_assets_is_quiet_when_silent() {
		let (plugin, notices) = plugin(
			PluginConfig::builder()
				.api_key("abcd1234")
				.assets_url("https://cdn.example.com")
				.silent(true)
				.build(),
		);
		let mut build = BuildOutput::new(Vec::new(), MemoryAssets::new());

		assert_eq!(
			plugin.after_emit(&mut build).await.unwrap(),
			CycleSummary::NoAssets
		);
		assert!(notices.messages().is_empty());
	}

	#[test]
	fn test_request_timeout_is_accepted() {
		let config = PluginConfig::builder()
			.request_timeout(std::time::Duration::from_secs(30))
			.build();
		let (plugin, _) = plugin(config);
		assert_eq!(
			plugin.config().request_timeout(),
			Some(std::time::Duration::from_secs(30))
		);
	}
}
