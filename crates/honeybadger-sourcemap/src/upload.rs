// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Upload of a single script/source map pair.

use std::sync::Arc;

use bytes::Bytes;
use honeybadger_common_http::{retry, RetryConfig, MAX_RETRY_DELAY};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::assets::AssetPair;
use crate::config::{PluginConfig, RequiredOptions};
use crate::error::UploadError;
use crate::notice::NoticeSink;
use crate::response::rejection;

const SCRIPT_CONTENT_TYPE: &str = "application/javascript";
const SOURCE_MAP_CONTENT_TYPE: &str = "application/octet-stream";

/// A source map the API accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploaded {
	pub source_map: String,
}

/// Result of uploading one pair.
pub type UploadOutcome = Result<Uploaded, UploadError>;

/// Sends source maps to the configured endpoint.
#[derive(Clone)]
pub struct UploadClient {
	http: Client,
	config: Arc<PluginConfig>,
	retry: RetryConfig,
	notices: Arc<dyn NoticeSink>,
}

impl UploadClient {
	pub fn new(http: Client, config: Arc<PluginConfig>, notices: Arc<dyn NoticeSink>) -> Self {
		let retry = RetryConfig::with_retries(config.retries());
		Self {
			http,
			config,
			retry,
			notices,
		}
	}

	/// Overrides the backoff policy. Attempt count still comes from `retries`
	/// and the delay stays capped at [`MAX_RETRY_DELAY`].
	pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
		self.retry = RetryConfig {
			max_attempts: self.retry.max_attempts,
			max_delay: retry.max_delay.min(MAX_RETRY_DELAY),
			..retry
		};
		self
	}

	/// Uploads one pair, retrying transport failures only.
	#[instrument(skip_all, fields(source_map = %pair.source_map))]
	pub async fn upload(
		&self,
		required: &RequiredOptions<'_>,
		pair: &AssetPair,
		script: Bytes,
		source_map: Bytes,
	) -> UploadOutcome {
		let minified_url = required.assets_url.resolve_url(&pair.source_file);
		debug!(%minified_url, endpoint = %self.config.endpoint(), "uploading source map");

		let http = &self.http;
		let endpoint = self.config.endpoint();
		let result = retry(&self.retry, || {
			let form = self.form(required, pair, &minified_url, &script, &source_map);
			let request = form.map(|form| http.post(endpoint).multipart(form));
			async move {
				match request {
					Ok(request) => request.send().await,
					Err(e) => Err(e),
				}
			}
		})
		.await;

		let response = result.map_err(|source| UploadError::Transport {
			source_map: pair.source_map.clone(),
			source,
		})?;

		if !response.status().is_success() {
			let rejected = rejection(response).await;
			return Err(UploadError::Rejected {
				source_map: pair.source_map.clone(),
				status: rejected.status,
				detail: rejected.detail,
				remote_error: rejected.remote_error,
			});
		}

		if !self.config.silent() {
			self.notices
				.notice(&format!("Uploaded {} to Honeybadger API", pair.source_map));
		}

		Ok(Uploaded {
			source_map: pair.source_map.clone(),
		})
	}

	fn form(
		&self,
		required: &RequiredOptions<'_>,
		pair: &AssetPair,
		minified_url: &str,
		script: &Bytes,
		source_map: &Bytes,
	) -> Result<Form, reqwest::Error> {
		let minified_file = Part::stream_with_length(script.clone(), script.len() as u64)
			.file_name(pair.source_file.clone())
			.mime_str(SCRIPT_CONTENT_TYPE)?;
		let map_file = Part::stream_with_length(source_map.clone(), source_map.len() as u64)
			.file_name(pair.source_map.clone())
			.mime_str(SOURCE_MAP_CONTENT_TYPE)?;

		Ok(Form::new()
			.text("api_key", required.api_key.expose().to_string())
			.text("minified_url", minified_url.to_string())
			.part("minified_file", minified_file)
			.part("source_map", map_file)
			.text("revision", self.config.revision().to_string()))
	}
}

impl std::fmt::Debug for UploadClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UploadClient")
			.field("endpoint", &self.config.endpoint())
			.field("retry", &self.retry)
			.finish()
	}
}
