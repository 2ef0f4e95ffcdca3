// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the Honeybadger uploader.
//!
//! This crate provides:
//! - A pre-configured HTTP client with a consistent User-Agent header and a
//!   redirect-following policy
//! - Retry logic with capped exponential backoff for transport failures

mod client;
mod retry;

pub use client::{builder, new_client, user_agent, MAX_REDIRECTS};
pub use retry::{retry, RetryConfig, RetryableError, MAX_RETRY_DELAY};
