// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry logic with capped exponential backoff for transport failures.
//!
//! Only failures that never produced an HTTP response are retried. A response
//! with an error status is a final answer from the server and is classified by
//! the caller instead.

use std::time::Duration;
use tracing::warn;

/// Ceiling for a single inter-attempt delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl RetryConfig {
	/// Policy allowing `retries` additional attempts after the first.
	pub fn with_retries(retries: u32) -> Self {
		Self {
			max_attempts: retries.saturating_add(1),
			..Self::default()
		}
	}

	/// Number of retries after the first attempt.
	pub fn retries(&self) -> u32 {
		self.max_attempts.saturating_sub(1)
	}
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 4,
			base_delay: Duration::from_millis(10),
			max_delay: MAX_RETRY_DELAY,
			backoff_factor: 6.0,
			jitter: true,
		}
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		// Status errors only exist if a caller used `error_for_status`.
		if self.status().is_some() {
			return false;
		}

		self.is_timeout() || self.is_connect() || self.is_request()
	}
}

fn calculate_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
	let exponential_delay = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped_delay = exponential_delay.min(cfg.max_delay.as_secs_f64());

	let final_delay = if cfg.jitter {
		let jitter_factor = 1.0 + fastrand::f64();
		(capped_delay * jitter_factor).min(cfg.max_delay.as_secs_f64())
	} else {
		capped_delay
	};

	Duration::from_secs_f64(final_delay)
}

pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut f: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: std::future::Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;

	loop {
		match f().await {
			Ok(result) => return Ok(result),
			Err(err) => {
				attempt += 1;

				if !err.is_retryable() {
					warn!(
							error = ?err,
							attempt = attempt,
							"non-retryable error encountered"
					);
					return Err(err);
				}

				if attempt >= cfg.max_attempts {
					warn!(
							error = ?err,
							attempt = attempt,
							max_attempts = cfg.max_attempts,
							"max retry attempts exhausted"
					);
					return Err(err);
				}

				let delay = calculate_delay(cfg, attempt - 1);
				warn!(
						error = ?err,
						attempt = attempt,
						max_attempts = cfg.max_attempts,
						delay_ms = delay.as_millis(),
						"retrying after transport error"
				);

				tokio::time::sleep(delay).await;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[derive(Debug)]
	struct MockError {
		retryable: bool,
	}

	impl RetryableError for MockError {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	fn fast_config(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(10),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	#[tokio::test]
	async fn test_non_retryable_error_fails_immediately() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let result: Result<(), MockError> = retry(&fast_config(5), || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(MockError { retryable: false })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(
			attempt_count.load(Ordering::SeqCst),
			1,
			"non-retryable error should only attempt once"
		);
	}

	#[tokio::test]
	async fn test_retryable_error_retries_up_to_max_attempts() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let result: Result<(), MockError> = retry(&fast_config(3), || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(MockError { retryable: true })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn test_zero_retries_attempts_once() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let cfg = RetryConfig {
			base_delay: Duration::from_millis(1),
			..RetryConfig::with_retries(0)
		};

		let result: Result<(), MockError> = retry(&cfg, || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				count.fetch_add(1, Ordering::SeqCst);
				Err(MockError { retryable: true })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_succeeds_after_retries() {
		let attempt_count = Arc::new(AtomicU32::new(0));
		let attempt_count_clone = Arc::clone(&attempt_count);

		let result: Result<&str, MockError> = retry(&fast_config(5), || {
			let count = Arc::clone(&attempt_count_clone);
			async move {
				let current = count.fetch_add(1, Ordering::SeqCst);
				if current < 2 {
					Err(MockError { retryable: true })
				} else {
					Ok("success")
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), "success");
		assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn test_with_retries_counts_first_attempt() {
		assert_eq!(RetryConfig::with_retries(0).max_attempts, 1);
		assert_eq!(RetryConfig::with_retries(3).max_attempts, 4);
		assert_eq!(RetryConfig::with_retries(10).retries(), 10);
		assert_eq!(RetryConfig::with_retries(u32::MAX).max_attempts, u32::MAX);
	}

	#[test]
	fn test_jitter_adds_randomness() {
		let cfg_with_jitter = RetryConfig {
			max_attempts: 3,
			base_delay: Duration::from_millis(10),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		};

		let cfg_without_jitter = RetryConfig {
			jitter: false,
			..cfg_with_jitter.clone()
		};

		let delays_without_jitter: Vec<Duration> = (0..10)
			.map(|_| calculate_delay(&cfg_without_jitter, 1))
			.collect();
		let delays_with_jitter: Vec<Duration> = (0..10)
			.map(|_| calculate_delay(&cfg_with_jitter, 1))
			.collect();

		assert!(delays_without_jitter.windows(2).all(|w| w[0] == w[1]));
		assert!(!delays_with_jitter.windows(2).all(|w| w[0] == w[1]));
	}

	#[test]
	fn test_delay_never_exceeds_ceiling() {
		let cfg = RetryConfig::default();

		for attempt in 0..10 {
			for _ in 0..20 {
				let delay = calculate_delay(&cfg, attempt);
				assert!(
					delay <= MAX_RETRY_DELAY,
					"delay {delay:?} at attempt {attempt} exceeds {MAX_RETRY_DELAY:?}"
				);
			}
		}
	}
}
