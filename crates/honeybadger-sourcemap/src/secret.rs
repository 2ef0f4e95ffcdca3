// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for the project API key.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// Honeybadger project API key.
///
/// `Debug`, `Display` and `Serialize` never show the key, and the backing
/// memory is zeroed on drop. Call [`ApiKey::expose`] at the single point where
/// the key goes on the wire.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey(String);

impl ApiKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<String> for ApiKey {
	fn from(key: String) -> Self {
		Self(key)
	}
}

impl From<&str> for ApiKey {
	fn from(key: &str) -> Self {
		Self(key.to_string())
	}
}

impl fmt::Debug for ApiKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ApiKey").field(&REDACTED).finish()
	}
}

impl fmt::Display for ApiKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl Serialize for ApiKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for ApiKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(ApiKey)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_debug_and_display_are_redacted() {
		let key = ApiKey::new("hbp_abc123");
		assert_eq!(format!("{key:?}"), "ApiKey(\"[REDACTED]\")");
		assert_eq!(format!("{key}"), "[REDACTED]");
		assert_eq!(key.expose(), "hbp_abc123");
	}

	#[test]
	fn test_serialize_is_redacted() {
		let key = ApiKey::new("hbp_abc123");
		assert_eq!(serde_json::to_string(&key).unwrap(), "\"[REDACTED]\"");
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let key: ApiKey = serde_json::from_str("\"hbp_abc123\"").unwrap();
		assert_eq!(key.expose(), "hbp_abc123");
	}

	#[test]
	fn test_empty_key() {
		assert!(ApiKey::new("").is_empty());
		assert!(!ApiKey::new("k").is_empty());
	}
}
