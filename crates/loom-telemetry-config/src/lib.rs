// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Loom telemetry facade.
//!
//! This crate provides:
//! - Layered configuration from defaults, TOML files and the environment
//! - Consistent environment variable naming (`LOOM_TELEMETRY_*`)
//! - Cross-field validation
//!
//! # Usage
//!
//! ```ignore
//! use loom_telemetry_config::load_config;
//!
//! let config = load_config()?;
//! println!("telemetry environment: {}", config.environment);
//! ```

pub mod error;
pub mod layer;
pub mod paths;
pub mod sources;

pub use error::ConfigError;
pub use layer::TelemetryConfigLayer;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use loom_telemetry_core::filter::DEFAULT_NOISE_PATTERNS;
use loom_telemetry_core::{FilterPolicy, Flavor};
use tracing::{debug, info, warn};

/// Upper bound for `max_breadcrumbs`.
pub const MAX_BREADCRUMBS_LIMIT: usize = 1000;

/// Fully resolved telemetry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
	/// Where the external client delivers events. `None` disables delivery.
	pub dsn: Option<String>,
	pub release: Option<String>,
	pub environment: Flavor,
	pub platform: String,
	pub send_default_pii: bool,
	pub debug: bool,
	pub attach_stacktrace: bool,
	pub attach_threads: bool,
	pub traces_sample_rate: f64,
	pub max_breadcrumbs: usize,
	/// Print diagnostics locally even in production.
	pub verbose: bool,
	/// Forward development and qa events as well.
	pub forward_non_production: bool,
	pub noise_patterns: Vec<String>,
	/// Default `tracing` filter directive.
	pub log_level: String,
}

impl Default for TelemetryConfig {
	fn default() -> Self {
		Self {
			dsn: None,
			release: None,
			environment: Flavor::Development,
			platform: std::env::consts::OS.to_string(),
			send_default_pii: false,
			debug: false,
			attach_stacktrace: true,
			attach_threads: false,
			traces_sample_rate: 0.0,
			max_breadcrumbs: 100,
			verbose: false,
			forward_non_production: false,
			noise_patterns: DEFAULT_NOISE_PATTERNS
				.iter()
				.map(|p| p.to_string())
				.collect(),
			log_level: "info".to_string(),
		}
	}
}

impl TelemetryConfig {
	/// The `before_send` policy this configuration asks for.
	pub fn filter_policy(&self) -> FilterPolicy {
		FilterPolicy::for_flavor(self.environment)
			.verbose(self.verbose)
			.forward_non_production(self.forward_non_production)
			.noise_patterns(self.noise_patterns.clone())
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_TELEMETRY_*`)
/// 2. User config file (`$XDG_CONFIG_HOME/loom/telemetry.toml`)
/// 3. System config file (`/etc/loom/telemetry.toml`)
/// 4. Built-in defaults
pub fn load_config() -> Result<TelemetryConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> =
		vec![Box::new(DefaultsSource), Box::new(TomlSource::system())];
	if let Some(user) = TomlSource::user() {
		sources.push(Box::new(user));
	}
	sources.push(Box::new(EnvSource));

	load_from_sources(sources)
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<TelemetryConfig, ConfigError> {
	let mut merged = TelemetryConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<TelemetryConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<TelemetryConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = TelemetryConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize a merged layer into resolved config.
pub fn finalize(layer: TelemetryConfigLayer) -> Result<TelemetryConfig, ConfigError> {
	let defaults = TelemetryConfig::default();

	let environment = match layer.environment {
		Some(raw) => raw
			.parse::<Flavor>()
			.map_err(|e| ConfigError::invalid_value("environment", e.to_string()))?,
		None => defaults.environment,
	};

	let config = TelemetryConfig {
		dsn: layer.dsn.or(defaults.dsn),
		release: layer.release.or(defaults.release),
		environment,
		platform: layer.platform.unwrap_or(defaults.platform),
		send_default_pii: layer.send_default_pii.unwrap_or(defaults.send_default_pii),
		debug: layer.debug.unwrap_or(defaults.debug),
		attach_stacktrace: layer.attach_stacktrace.unwrap_or(defaults.attach_stacktrace),
		attach_threads: layer.attach_threads.unwrap_or(defaults.attach_threads),
		traces_sample_rate: layer
			.traces_sample_rate
			.unwrap_or(defaults.traces_sample_rate),
		max_breadcrumbs: layer.max_breadcrumbs.unwrap_or(defaults.max_breadcrumbs),
		verbose: layer.verbose.unwrap_or(defaults.verbose),
		forward_non_production: layer
			.forward_non_production
			.unwrap_or(defaults.forward_non_production),
		noise_patterns: layer.noise_patterns.unwrap_or(defaults.noise_patterns),
		log_level: layer.log_level.unwrap_or(defaults.log_level),
	};

	validate_config(&config)?;

	info!(
		environment = %config.environment,
		platform = %config.platform,
		dsn_configured = config.dsn.is_some(),
		verbose = config.verbose,
		forward_non_production = config.forward_non_production,
		"Telemetry configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
///
/// DSN syntax and the sample-rate range are left to client startup, where a
/// failure disables reporting instead of stopping the application.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), ConfigError> {
	if config.noise_patterns.is_empty() {
		return Err(ConfigError::invalid_value(
			"noise_patterns",
			"must not be empty; list timeoutexception and httpexception at least",
		));
	}

	if config.noise_patterns.iter().any(|p| p.trim().is_empty()) {
		return Err(ConfigError::validation(
			"noise_patterns contains an empty pattern, which would drop every exception event",
		));
	}

	if config.max_breadcrumbs > MAX_BREADCRUMBS_LIMIT {
		return Err(ConfigError::invalid_value(
			"max_breadcrumbs",
			format!(
				"{} exceeds the limit of {MAX_BREADCRUMBS_LIMIT}",
				config.max_breadcrumbs
			),
		));
	}

	if config.forward_non_production && config.dsn.is_none() {
		return Err(ConfigError::validation(
			"forward_non_production is set but no dsn is configured. \
			 Set LOOM_TELEMETRY_DSN or remove LOOM_TELEMETRY_FORWARD_NON_PRODUCTION.",
		));
	}

	if config.debug && config.environment.is_production() {
		warn!("telemetry debug logging is enabled in production");
	}

	Ok(())
}
