// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deploy notification.

use std::sync::Arc;

use honeybadger_common_http::{retry, RetryConfig, MAX_RETRY_DELAY};
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{DeployTarget, PluginConfig};
use crate::error::NotifyError;
use crate::notice::NoticeSink;
use crate::response::rejection;
use crate::secret::ApiKey;

/// What happened to the deploy notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStatus {
	/// Deploy attributes were incomplete; nothing was sent.
	Skipped,
	Notified,
	/// The notification failed and `ignore_errors` swallowed it.
	FailedIgnored,
}

/// Announces a deploy of the configured revision.
#[derive(Clone)]
pub struct DeployNotifier {
	http: Client,
	config: Arc<PluginConfig>,
	retry: RetryConfig,
	notices: Arc<dyn NoticeSink>,
}

impl DeployNotifier {
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

	/// Sends the deploy notification if every deploy attribute is configured.
	///
	/// Failures are returned unless `ignore_errors` is set.
	pub async fn notify(&self) -> Result<DeployStatus, NotifyError> {
		let Some((api_key, target)) = self.request_parts() else {
			debug!("deploy attributes incomplete, skipping deploy notification");
			return Ok(DeployStatus::Skipped);
		};

		match self.send(api_key, target).await {
			Ok(()) => {
				if !self.config.silent() {
					self.notices.notice(&format!(
						"Notified Honeybadger API of deploy of {} to {}",
						self.config.revision(),
						target.environment
					));
				}
				Ok(DeployStatus::Notified)
			}
			Err(err) if self.config.ignore_errors() => {
				warn!(error = %err, "ignoring deploy notification failure");
				Ok(DeployStatus::FailedIgnored)
			}
			Err(err) => Err(err),
		}
	}

	fn request_parts(&self) -> Option<(&ApiKey, DeployTarget<'_>)> {
		let api_key = self.config.api_key().filter(|k| !k.is_empty())?;
		if self.config.revision().is_empty() {
			return None;
		}
		let target = self.config.deploy()?.target()?;
		Some((api_key, target))
	}

	async fn send(&self, api_key: &ApiKey, target: DeployTarget<'_>) -> Result<(), NotifyError> {
		debug!(
			environment = target.environment,
			repository = target.repository,
			revision = %self.config.revision(),
			"sending deploy notification"
		);

		let http = &self.http;
		let endpoint = self.config.deploy_endpoint();
		let response = retry(&self.retry, || {
			let form = Form::new()
				.text("api_key", api_key.expose().to_string())
				.text("revision", self.config.revision().to_string())
				.text("repository", target.repository.to_string())
				.text("local_username", target.local_username.to_string())
				.text("environment", target.environment.to_string());
			http.post(endpoint).multipart(form).send()
		})
		.await
		.map_err(|source| NotifyError::Transport { source })?;

		if !response.status().is_success() {
			let rejected = rejection(response).await;
			return Err(NotifyError::Rejected {
				status: rejected.status,
				detail: rejected.detail,
			});
		}

		Ok(())
	}
}

impl std::fmt::Debug for DeployNotifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DeployNotifier")
			.field("endpoint", &self.config.deploy_endpoint())
			.field("retry", &self.retry)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::DeployConfig;
	use crate::notice::RecordingNotices;
	use std::time::Duration;
	use wiremock::matchers::{body_string_contains, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn notifier(
		config: crate::config::PluginConfigBuilder,
		server: &MockServer,
	) -> (DeployNotifier, Arc<RecordingNotices>) {
		let config = Arc::new(
			config
				.deploy_endpoint(format!("{}/v1/deploys", server.uri()))
				.build(),
		);
		let notices = Arc::new(RecordingNotices::new());
		let notifier = DeployNotifier::new(
			honeybadger_common_http::new_client(),
			config,
			notices.clone(),
		)
		.with_retry_config(RetryConfig {
			base_delay: Duration::from_millis(1),
			jitter: false,
			..RetryConfig::default()
		});
		(notifier, notices)
	}

	fn base() -> crate::config::PluginConfigBuilder {
		PluginConfig::builder()
			.api_key("abcd1234")
			.assets_url("https://cdn.example.com/assets")
			.revision("v1.2.3")
	}

	fn full_deploy() -> DeployConfig {
		DeployConfig::new("production", "https://github.com/acme/app", "ci-bot")
	}

	#[tokio::test]
	async fn test_sends_all_fields() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/v1/deploys"))
			.and(body_string_contains(r#"name="api_key""#))
			.and(body_string_contains("abcd1234"))
			.and(body_string_contains(r#"name="revision""#))
			.and(body_string_contains("v1.2.3"))
			.and(body_string_contains(r#"name="repository""#))
			.and(body_string_contains("https://github.com/acme/app"))
			.and(body_string_contains(r#"name="local_username""#))
			.and(body_string_contains("ci-bot"))
			.and(body_string_contains(r#"name="environment""#))
			.and(body_string_contains("production"))
			.respond_with(ResponseTemplate::new(201))
			.expect(1)
			.mount(&server)
			.await;

		let (notifier, notices) = notifier(base().deploy(full_deploy()), &server);
		assert_eq!(notifier.notify().await.unwrap(), DeployStatus::Notified);
		assert_eq!(
			notices.messages(),
			vec!["Notified Honeybadger API of deploy of v1.2.3 to production"]
		);
	}

	#[tokio::test]
	async fn test_skips_without_deploy_config() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(201))
			.expect(0)
			.mount(&server)
			.await;

		let (notifier, notices) = notifier(base(), &server);
		assert_eq!(notifier.notify().await.unwrap(), DeployStatus::Skipped);
		assert!(notices.messages().is_empty());
	}

	#[tokio::test]
	async fn test_skips_when_any_attribute_missing() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(201))
			.expect(0)
			.mount(&server)
			.await;

		let partials = [
			DeployConfig {
				environment: None,
				..full_deploy()
			},
			DeployConfig {
				repository: None,
				..full_deploy()
			},
			DeployConfig {
				local_username: None,
				..full_deploy()
			},
		];

		for deploy in partials {
			let (notifier, _) = notifier(base().deploy(deploy), &server);
			assert_eq!(notifier.notify().await.unwrap(), DeployStatus::Skipped);
		}
	}

	#[tokio::test]
	async fn test_skips_without_api_key() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(201))
			.expect(0)
			.mount(&server)
			.await;

		let config = PluginConfig::builder()
			.assets_url("https://cdn.example.com")
			.deploy(full_deploy());
		let (notifier, _) = notifier(config, &server);
		assert_eq!(notifier.notify().await.unwrap(), DeployStatus::Skipped);
	}

	#[tokio::test]
	async fn test_rejection_propagates() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(403).set_body_string(r#"{"error":"Invalid API key"}"#))
			.expect(1)
			.mount(&server)
			.await;

		let (notifier, notices) = notifier(base().deploy(full_deploy()), &server);
		let err = notifier.notify().await.unwrap_err();

		assert_eq!(
			err.to_string(),
			"failed to notify Honeybadger API of deploy: Invalid API key"
		);
		assert!(matches!(err, NotifyError::Rejected { status: 403, .. }));
		assert!(notices.messages().is_empty());
	}

	#[tokio::test]
	async fn test_rejection_ignored_when_configured() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(500))
			.expect(1)
			.mount(&server)
			.await;

		let (notifier, _) = notifier(
			base().deploy(full_deploy()).ignore_errors(true),
			&server,
		);
		assert_eq!(notifier.notify().await.unwrap(), DeployStatus::FailedIgnored);
	}

	#[tokio::test]
	async fn test_silent_notification_has_no_notice() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;

		let (notifier, notices) = notifier(base().deploy(full_deploy()).silent(true), &server);
		assert_eq!(notifier.notify().await.unwrap(), DeployStatus::Notified);
		assert!(notices.messages().is_empty());
	}

	#[tokio::test]
	async fn test_retry_override_keeps_delay_ceiling() {
		let server = MockServer::start().await;
		let (notifier, _) = notifier(PluginConfig::builder().retries(2), &server);
		let notifier = notifier.with_retry_config(RetryConfig {
			max_delay: Duration::from_secs(30),
			..RetryConfig::default()
		});

		assert_eq!(notifier.retry.max_delay, MAX_RETRY_DELAY);
		assert_eq!(notifier.retry.max_attempts, 3);
	}
}
