// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

/// Redirect hops followed before a request is treated as a transport failure.
pub const MAX_REDIRECTS: usize = 10;

/// Creates a new HTTP client with the standard User-Agent header.
///
/// Panics only if the TLS backend cannot be initialised. Library code that
/// needs to surface that failure should call [`builder`] and handle the
/// `build()` error itself.
pub fn new_client() -> Client {
	builder().build().expect("failed to build HTTP client")
}

/// Creates a new HTTP client builder with the standard User-Agent header.
///
/// Redirects are followed up to [`MAX_REDIRECTS`] hops.
///
/// # Example
/// ```ignore
/// let client = honeybadger_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.redirect(Policy::limited(MAX_REDIRECTS))
}

/// Returns the standard User-Agent string.
///
/// Format: `honeybadger-sourcemap/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"honeybadger-sourcemap/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		assert!(ua.starts_with("honeybadger-sourcemap/"));
		assert!(ua.contains(std::env::consts::OS));
		assert!(ua.ends_with(')'));
	}

	#[test]
	fn builder_produces_client() {
		let client = builder().build();
		assert!(client.is_ok());
	}
}
