// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source map uploads to Honeybadger.
//!
//! This crate provides:
//! - Discovery of script/source map pairs in bundler chunk metadata
//! - In-memory and filesystem asset loaders
//! - Multipart uploads with transport retry and response classification
//! - Optional deploy notification
//! - A per-emit cycle that reports failures to the host build
//!
//! ```no_run
//! use honeybadger_sourcemap::{BuildOutput, ChunkDescriptor, FsAssets, PluginConfig, SourceMapPlugin};
//!
//! # async fn run() -> Result<(), honeybadger_sourcemap::PluginError> {
//! let plugin = SourceMapPlugin::new(
//! 	PluginConfig::builder()
//! 		.api_key("abcd1234")
//! 		.assets_url("https://cdn.example.com/assets")
//! 		.build(),
//! )?;
//!
//! let mut build = BuildOutput::new(
//! 	vec![ChunkDescriptor::new(["app.81c1.js", "app.81c1.js.map"])],
//! 	FsAssets::new("dist"),
//! );
//! plugin.after_emit(&mut build).await?;
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod config;
pub mod deploy;
pub mod error;
pub mod loader;
pub mod notice;
pub mod plugin;
mod response;
pub mod secret;
pub mod upload;

pub use assets::{resolve, AssetPair, ChunkDescriptor};
pub use config::{
	AssetsUrl, DeployConfig, DeployTarget, PluginConfig, PluginConfigBuilder, RequiredOptions,
	DEFAULT_ENDPOINT, DEFAULT_RETRIES, DEFAULT_REVISION, DEPLOY_ENDPOINT, MAX_RETRIES,
};
pub use deploy::{DeployNotifier, DeployStatus};
pub use error::{
	ConfigValidationError, NotifyError, PluginError, ReadError, UploadBatchError, UploadError,
	PLUGIN_NAME, SERVICE_NAME,
};
pub use loader::{AssetLoader, FsAssets, LayeredLoader, MemoryAssets};
pub use notice::{ConsoleNotices, NoticeSink, RecordingNotices, TracingNotices};
pub use plugin::{BuildOutput, Compilation, CycleSummary, SourceMapPlugin, NO_ASSETS_NOTICE};
pub use secret::{ApiKey, REDACTED};
pub use upload::{UploadClient, UploadOutcome, Uploaded};

pub use honeybadger_common_http::RetryConfig;
