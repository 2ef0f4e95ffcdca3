// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Classification of error responses from the Honeybadger API.

use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;

/// Why the API rejected a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejection {
	pub status: u16,
	/// Text shown to the user.
	pub detail: String,
	/// The body's `error` field, when the API sent one.
	pub remote_error: Option<String>,
}

/// Reads the failure detail out of a non-2xx response.
///
/// Uses the JSON body's `error` field when present, else `"{status} - {reason}"`.
pub(crate) async fn rejection(response: Response) -> Rejection {
	let status = response.status();
	let remote_error = match response.bytes().await {
		Ok(body) => remote_error(&body),
		Err(e) => {
			debug!(error = %e, status = status.as_u16(), "failed to read error response body");
			None
		}
	};

	Rejection {
		status: status.as_u16(),
		detail: remote_error
			.clone()
			.unwrap_or_else(|| status_line(status)),
		remote_error,
	}
}

fn remote_error(body: &[u8]) -> Option<String> {
	let value: Value = serde_json::from_slice(body).ok()?;
	match value.get("error")? {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Null | Value::Bool(false) | Value::String(_) => None,
		other => Some(other.to_string()),
	}
}

fn status_line(status: StatusCode) -> String {
	format!(
		"{} - {}",
		status.as_u16(),
		status.canonical_reason().unwrap_or("")
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_field_is_used() {
		assert_eq!(
			remote_error(br#"{"error":"The \"source_map\" parameter is required"}"#),
			Some("The \"source_map\" parameter is required".to_string())
		);
	}

	#[test]
	fn test_missing_error_field() {
		assert_eq!(remote_error(br#"{"status":"nope"}"#), None);
		assert_eq!(remote_error(br#"{"error":""}"#), None);
		assert_eq!(remote_error(br#"{"error":null}"#), None);
	}

	#[test]
	fn test_unparseable_body() {
		assert_eq!(remote_error(b""), None);
		assert_eq!(remote_error(b"<html>bad gateway</html>"), None);
		assert_eq!(remote_error(b"null"), None);
	}

	#[test]
	fn test_structured_error_field_is_stringified() {
		assert_eq!(
			remote_error(br#"{"error":{"code":7}}"#),
			Some(r#"{"code":7}"#.to_string())
		);
	}

	#[test]
	fn test_status_line() {
		assert_eq!(
			status_line(StatusCode::UNPROCESSABLE_ENTITY),
			"422 - Unprocessable Entity"
		);
		assert_eq!(
			status_line(StatusCode::INTERNAL_SERVER_ERROR),
			"500 - Internal Server Error"
		);
	}
}
