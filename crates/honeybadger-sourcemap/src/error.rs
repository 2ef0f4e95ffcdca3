// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the source map uploader.

use std::path::PathBuf;

use thiserror::Error;

/// Name used to prefix every diagnostic handed back to the build.
pub const PLUGIN_NAME: &str = "HoneybadgerSourceMapPlugin";

/// Remote service name used in user-facing messages.
pub const SERVICE_NAME: &str = "Honeybadger API";

/// A required option is missing or empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
	#[error("required field, '{0}', is missing.")]
	MissingField(&'static str),
}

/// Asset bytes could not be obtained from the host.
#[derive(Debug, Error)]
pub enum ReadError {
	/// The in-memory asset table has no entry for this name.
	#[error("asset '{name}' was not emitted by the build")]
	Missing { name: String },

	/// The asset file could not be read from the output directory.
	#[error("failed to read asset '{name}' from {}: {source}", path.display())]
	Io {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

impl ReadError {
	/// True when the asset does not exist at all, as opposed to being unreadable.
	pub fn is_missing(&self) -> bool {
		match self {
			ReadError::Missing { .. } => true,
			ReadError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
		}
	}
}

/// Failure of a single source map upload.
#[derive(Debug, Error)]
pub enum UploadError {
	/// The script or map bytes could not be loaded.
	#[error("failed to upload {source_map} to Honeybadger API: {source}")]
	Read {
		source_map: String,
		#[source]
		source: ReadError,
	},

	/// The request never produced a response, even after retrying.
	#[error("failed to upload {source_map} to Honeybadger API: {source}")]
	Transport {
		source_map: String,
		#[source]
		source: reqwest::Error,
	},

	/// The API answered with a non-2xx status.
	#[error("failed to upload {source_map} to Honeybadger API: {detail}")]
	Rejected {
		source_map: String,
		status: u16,
		detail: String,
		/// The `error` field of the response body, when the API sent one.
		remote_error: Option<String>,
	},
}

impl UploadError {
	/// Name of the source map this failure belongs to.
	pub fn source_map(&self) -> &str {
		match self {
			UploadError::Read { source_map, .. }
			| UploadError::Transport { source_map, .. }
			| UploadError::Rejected { source_map, .. } => source_map,
		}
	}

	/// Remote error detail parsed from the response body, if any.
	pub fn remote_error(&self) -> Option<&str> {
		match self {
			UploadError::Rejected { remote_error, .. } => remote_error.as_deref(),
			_ => None,
		}
	}
}

/// One or more uploads in a cycle failed.
#[derive(Debug)]
pub struct UploadBatchError {
	failures: Vec<UploadError>,
}

impl UploadBatchError {
	pub(crate) fn new(failures: Vec<UploadError>) -> Self {
		Self { failures }
	}

	pub fn failures(&self) -> &[UploadError] {
		&self.failures
	}
}

impl std::fmt::Display for UploadBatchError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.failures.as_slice() {
			[single] => write!(f, "{single}"),
			failures => {
				write!(f, "{} source map uploads failed: ", failures.len())?;
				for (i, failure) in failures.iter().enumerate() {
					if i > 0 {
						f.write_str("; ")?;
					}
					write!(f, "{failure}")?;
				}
				Ok(())
			}
		}
	}
}

impl std::error::Error for UploadBatchError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.failures.first().map(|e| e as &(dyn std::error::Error + 'static))
	}
}

/// Failure of the deploy notification.
#[derive(Debug, Error)]
pub enum NotifyError {
	#[error("failed to notify Honeybadger API of deploy: {source}")]
	Transport {
		#[source]
		source: reqwest::Error,
	},

	#[error("failed to notify Honeybadger API of deploy: {detail}")]
	Rejected { status: u16, detail: String },
}

/// Diagnostics handed back to the build tool.
#[derive(Debug, Error)]
pub enum PluginError {
	#[error("HoneybadgerSourceMapPlugin: {0}")]
	Config(#[from] ConfigValidationError),

	#[error("HoneybadgerSourceMapPlugin: {0}")]
	Upload(#[from] UploadBatchError),

	#[error("HoneybadgerSourceMapPlugin: {0}")]
	Notify(#[from] NotifyError),

	#[error("HoneybadgerSourceMapPlugin: failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),
}
