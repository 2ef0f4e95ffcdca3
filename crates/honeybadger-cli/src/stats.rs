// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bundler stats files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use honeybadger_sourcemap::ChunkDescriptor;
use serde::Deserialize;

/// The parts of a bundler stats JSON the uploader reads. Other fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStats {
	#[serde(default)]
	pub output_path: Option<PathBuf>,
	#[serde(default)]
	pub chunks: Vec<ChunkDescriptor>,
}

impl BuildStats {
	pub fn parse(json: &str) -> Result<Self> {
		serde_json::from_str(json).context("stats file is not valid bundler stats JSON")
	}

	pub async fn read(path: &Path) -> Result<Self> {
		let json = tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("failed to read stats file {}", path.display()))?;
		Self::parse(&json).with_context(|| format!("in {}", path.display()))
	}

	/// Where emitted assets live: the explicit directory, else the stats'
	/// `outputPath`, else the directory holding the stats file.
	pub fn output_dir(&self, explicit: Option<&Path>, stats_path: &Path) -> PathBuf {
		if let Some(dir) = explicit {
			return dir.to_path_buf();
		}
		if let Some(dir) = &self.output_path {
			return dir.clone();
		}
		match stats_path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
			_ => PathBuf::from("."),
		}
	}
}
