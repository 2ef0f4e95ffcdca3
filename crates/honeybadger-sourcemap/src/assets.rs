// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Discovery of script/source map pairs in the build's chunk metadata.

use serde::{Deserialize, Serialize};

/// One chunk of bundler output.
///
/// Older bundlers list source maps in `files`; newer ones move them to
/// `auxiliaryFiles`. Both shapes deserialize into this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDescriptor {
	#[serde(default)]
	pub files: Vec<String>,
	#[serde(default)]
	pub auxiliary_files: Option<Vec<String>>,
}

impl ChunkDescriptor {
	pub fn new<I, S>(files: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			files: files.into_iter().map(Into::into).collect(),
			auxiliary_files: None,
		}
	}

	pub fn with_auxiliary_files<I, S>(mut self, files: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.auxiliary_files = Some(files.into_iter().map(Into::into).collect());
		self
	}

	fn script(&self) -> Option<&str> {
		self.files
			.iter()
			.map(String::as_str)
			.find(|f| is_script(f))
	}

	fn source_map(&self) -> Option<&str> {
		let candidates = match &self.auxiliary_files {
			Some(aux) if !aux.is_empty() => aux,
			_ => &self.files,
		};
		candidates
			.iter()
			.map(String::as_str)
			.find(|f| is_source_map(f))
	}
}

/// A script and the source map generated for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPair {
	pub source_file: String,
	pub source_map: String,
}

impl AssetPair {
	pub fn new(source_file: impl Into<String>, source_map: impl Into<String>) -> Self {
		Self {
			source_file: source_file.into(),
			source_map: source_map.into(),
		}
	}
}

fn is_script(name: &str) -> bool {
	name.ends_with(".js")
}

fn is_source_map(name: &str) -> bool {
	name.ends_with(".js.map")
}

/// Pairs up the first script and source map of every chunk.
///
/// Chunks lacking either are skipped without a diagnostic. Output follows
/// chunk order.
pub fn resolve(chunks: &[ChunkDescriptor]) -> Vec<AssetPair> {
	chunks
		.iter()
		.filter_map(|chunk| {
			let source_file = chunk.script()?;
			let source_map = chunk.source_map()?;
			Some(AssetPair::new(source_file, source_map))
		})
		.collect()
}
