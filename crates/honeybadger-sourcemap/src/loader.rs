// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access to emitted asset bytes.
//!
//! Loaders never cache: every call goes back to the host's data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::error::ReadError;

/// Resolves an asset name to its content.
#[async_trait]
pub trait AssetLoader: Send + Sync {
	async fn load(&self, name: &str) -> Result<Bytes, ReadError>;
}

#[async_trait]
impl<T: AssetLoader + ?Sized> AssetLoader for Arc<T> {
	async fn load(&self, name: &str) -> Result<Bytes, ReadError> {
		(**self).load(name).await
	}
}

type SourceFn = dyn Fn() -> Bytes + Send + Sync;

/// Assets held in memory by the host, each behind a lazy accessor.
#[derive(Default, Clone)]
pub struct MemoryAssets {
	sources: HashMap<String, Arc<SourceFn>>,
}

impl MemoryAssets {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers fixed content for `name`.
	pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Bytes>) {
		let content = content.into();
		self.sources
			.insert(name.into(), Arc::new(move || content.clone()));
	}

	/// Registers an accessor called on every load of `name`.
	pub fn insert_lazy<F>(&mut self, name: impl Into<String>, source: F)
	where
		F: Fn() -> Bytes + Send + Sync + 'static,
	{
		self.sources.insert(name.into(), Arc::new(source));
	}

	pub fn len(&self) -> usize {
		self.sources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}

impl std::fmt::Debug for MemoryAssets {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryAssets")
			.field("assets", &self.sources.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[async_trait]
impl AssetLoader for MemoryAssets {
	async fn load(&self, name: &str) -> Result<Bytes, ReadError> {
		let source = self.sources.get(name).ok_or_else(|| ReadError::Missing {
			name: name.to_string(),
		})?;
		Ok(source())
	}
}

/// Assets read from the build's output directory.
#[derive(Debug, Clone)]
pub struct FsAssets {
	output_dir: PathBuf,
}

impl FsAssets {
	pub fn new(output_dir: impl Into<PathBuf>) -> Self {
		Self {
			output_dir: output_dir.into(),
		}
	}

	pub fn output_dir(&self) -> &Path {
		&self.output_dir
	}

	/// On-disk location of `name`, ignoring any `?query` suffix.
	pub fn path_for(&self, name: &str) -> PathBuf {
		let file = name.split_once('?').map_or(name, |(file, _)| file);
		self.output_dir.join(file)
	}
}

#[async_trait]
impl AssetLoader for FsAssets {
	async fn load(&self, name: &str) -> Result<Bytes, ReadError> {
		let path = self.path_for(name);
		trace!(path = %path.display(), "reading asset");

		tokio::fs::read(&path)
			.await
			.map(Bytes::from)
			.map_err(|source| ReadError::Io {
				name: name.to_string(),
				path,
				source,
			})
	}
}

/// Tries `primary` first and falls back when it does not have the asset.
///
/// Hosts use this to prefer assets captured at emit time over their own
/// asset table.
#[derive(Debug, Clone)]
pub struct LayeredLoader<P, F> {
	primary: P,
	fallback: F,
}

impl<P, F> LayeredLoader<P, F> {
	pub fn new(primary: P, fallback: F) -> Self {
		Self { primary, fallback }
	}
}

#[async_trait]
impl<P, F> AssetLoader for LayeredLoader<P, F>
where
	P: AssetLoader,
	F: AssetLoader,
{
	async fn load(&self, name: &str) -> Result<Bytes, ReadError> {
		match self.primary.load(name).await {
			Err(err) if err.is_missing() => self.fallback.load(name).await,
			other => other,
		}
	}
}
