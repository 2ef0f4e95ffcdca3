// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Honeybadger source map uploader.
//!
//! Reads a bundler stats file, uploads every script/source map pair from the
//! build's output directory and optionally reports the deploy.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use honeybadger_cli_config::{
	load_config_with_cli, CliOverrides, HoneybadgerConfig, LogFormat, LogLevel, LoggingConfig,
};
use honeybadger_sourcemap::{ApiKey, BuildOutput, ConsoleNotices, FsAssets, SourceMapPlugin};

mod stats;

use stats::BuildStats;

/// Upload bundler source maps to Honeybadger
#[derive(Parser, Debug)]
#[command(name = "honeybadger-sourcemap", version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file (default: ./honeybadger.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Honeybadger project API key
	#[arg(long, global = true)]
	api_key: Option<String>,

	/// Base URL the minified scripts are served from
	#[arg(long, global = true)]
	assets_url: Option<String>,

	/// Source map upload endpoint
	#[arg(long, global = true)]
	endpoint: Option<String>,

	/// Revision the build was made from, e.g. a git SHA
	#[arg(long, global = true)]
	revision: Option<String>,

	/// Suppress success notices
	#[arg(long, global = true)]
	silent: bool,

	/// Report upload failures as warnings instead of errors
	#[arg(long, global = true)]
	ignore_errors: bool,

	/// Transport retries per request (max 10)
	#[arg(long, global = true)]
	retries: Option<u32>,

	/// Per-request timeout in seconds
	#[arg(long, global = true)]
	timeout_secs: Option<u64>,

	/// Deploy environment, e.g. production
	#[arg(long, global = true)]
	deploy_environment: Option<String>,

	/// Repository URL reported with the deploy
	#[arg(long, global = true)]
	deploy_repository: Option<String>,

	/// User reported as performing the deploy
	#[arg(long, global = true)]
	deploy_local_username: Option<String>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Upload the source maps listed in a bundler stats file
	Upload {
		/// Bundler stats JSON with a `chunks` array
		#[arg(long)]
		stats: PathBuf,

		/// Directory holding the emitted assets
		#[arg(long)]
		output_dir: Option<PathBuf>,
	},
	/// Print the merged configuration
	Config,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		CliOverrides {
			api_key: args.api_key.as_deref().map(ApiKey::new),
			assets_url: args.assets_url.clone(),
			endpoint: args.endpoint.clone(),
			revision: args.revision.clone(),
			silent: args.silent.then_some(true),
			ignore_errors: args.ignore_errors.then_some(true),
			retries: args.retries,
			request_timeout_secs: args.timeout_secs,
			deploy_environment: args.deploy_environment.clone(),
			deploy_repository: args.deploy_repository.clone(),
			deploy_local_username: args.deploy_local_username.clone(),
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then(|| "json".to_string()),
			config_file: args.config.clone(),
		}
	}
}

fn log_level_to_tracing(level: LogLevel) -> tracing::Level {
	match level {
		LogLevel::Trace => tracing::Level::TRACE,
		LogLevel::Debug => tracing::Level::DEBUG,
		LogLevel::Info => tracing::Level::INFO,
		LogLevel::Warn => tracing::Level::WARN,
		LogLevel::Error => tracing::Level::ERROR,
	}
}

/// Diagnostics go to stderr; stdout carries notices only.
fn init_tracing(logging: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!(
			"honeybadger={}",
			log_level_to_tracing(logging.level)
		))
	});

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

async fn run_upload(
	config: &HoneybadgerConfig,
	stats_path: PathBuf,
	output_dir: Option<PathBuf>,
) -> Result<()> {
	let stats = BuildStats::read(&stats_path).await?;
	let output_dir = stats.output_dir(output_dir.as_deref(), &stats_path);
	info!(
		stats = %stats_path.display(),
		output_dir = %output_dir.display(),
		chunks = stats.chunks.len(),
		"starting source map upload"
	);

	let plugin = SourceMapPlugin::with_notices(config.plugin_config(), Arc::new(ConsoleNotices))?;
	let mut build = BuildOutput::new(stats.chunks, FsAssets::new(output_dir));

	let summary = plugin.after_emit(&mut build).await?;
	debug!(?summary, "upload cycle finished");

	for warning in build.warnings() {
		eprintln!("warning: {warning}");
	}
	for error in build.errors() {
		eprintln!("error: {error}");
	}

	if build.has_errors() {
		anyhow::bail!(
			"source map upload reported {} error(s)",
			build.errors().len()
		);
	}
	Ok(())
}

fn print_config(config: &HoneybadgerConfig) -> Result<()> {
	let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
	print!("{rendered}");
	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	let cli_overrides = CliOverrides::from(&args);
	let config = load_config_with_cli(cli_overrides).context("failed to load configuration")?;

	init_tracing(&config.logging);

	match args.command {
		Command::Upload { stats, output_dir } => run_upload(&config, stats, output_dir).await,
		Command::Config => print_config(&config),
	}
}
