// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Destinations for user-facing progress notices.

use std::sync::{Arc, Mutex};

use tracing::info;

/// Receives human-readable notices such as `Uploaded app.js.map to Honeybadger API`.
///
/// Callers check the `silent` option before emitting; sinks print whatever
/// they are given.
pub trait NoticeSink: Send + Sync {
	fn notice(&self, message: &str);
}

impl<T: NoticeSink + ?Sized> NoticeSink for Arc<T> {
	fn notice(&self, message: &str) {
		(**self).notice(message)
	}
}

/// Emits notices as `info` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
	fn notice(&self, message: &str) {
		info!(target: "honeybadger_sourcemap::notice", "{message}");
	}
}

/// Prints notices to stdout, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotices;

impl NoticeSink for ConsoleNotices {
	fn notice(&self, message: &str) {
		println!("{message}");
	}
}

/// Keeps notices in memory.
#[derive(Debug, Default)]
pub struct RecordingNotices {
	messages: Mutex<Vec<String>>,
}

impl RecordingNotices {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn messages(&self) -> Vec<String> {
		self.messages
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.clone()
	}
}

impl NoticeSink for RecordingNotices {
	fn notice(&self, message: &str) {
		self.messages
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
			.push(message.to_string());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_recording_keeps_order() {
		let sink = RecordingNotices::new();
		sink.notice("first");
		sink.notice("second");
		assert_eq!(sink.messages(), vec!["first", "second"]);
	}

	#[test]
	fn test_arc_forwards() {
		let sink = Arc::new(RecordingNotices::new());
		let shared: Arc<dyn NoticeSink> = sink.clone();
		shared.notice("hello");
		assert_eq!(sink.messages(), vec!["hello"]);
	}
}
