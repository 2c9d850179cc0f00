// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::TelemetryConfigLayer;
use crate::paths::{user_config_file, SYSTEM_CONFIG_FILE};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<TelemetryConfigLayer, ConfigError>;
}

/// Built-in defaults source. Defaults themselves are applied by `finalize`.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<TelemetryConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(TelemetryConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_FILE)
	}

	/// The per-user file, if a home directory can be found.
	pub fn user() -> Option<Self> {
		user_config_file().ok().map(Self::new)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<TelemetryConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(TelemetryConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: TelemetryConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LOOM_TELEMETRY_<FIELD>`, e.g. `LOOM_TELEMETRY_ENVIRONMENT`.
/// `LOOM_TELEMETRY_NOISE_PATTERNS` is a comma-separated list.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<TelemetryConfigLayer, ConfigError> {
		debug!("loading environment variables");
		layer_from_lookup(|name| std::env::var(name).ok())
	}
}

/// Build a layer from a variable lookup, so tests need not touch the process
/// environment.
pub(crate) fn layer_from_lookup<F>(lookup: F) -> Result<TelemetryConfigLayer, ConfigError>
where
	F: Fn(&str) -> Option<String>,
{
	let var = |name: &str| lookup(name).filter(|s| !s.is_empty());
	let flag = |name: &str| var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1");

	let noise_patterns = var("LOOM_TELEMETRY_NOISE_PATTERNS").map(|s| {
		s.split(',')
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	});

	Ok(TelemetryConfigLayer {
		dsn: var("LOOM_TELEMETRY_DSN"),
		release: var("LOOM_TELEMETRY_RELEASE"),
		environment: var("LOOM_TELEMETRY_ENVIRONMENT"),
		platform: var("LOOM_TELEMETRY_PLATFORM"),
		send_default_pii: flag("LOOM_TELEMETRY_SEND_DEFAULT_PII"),
		debug: flag("LOOM_TELEMETRY_DEBUG"),
		attach_stacktrace: flag("LOOM_TELEMETRY_ATTACH_STACKTRACE"),
		attach_threads: flag("LOOM_TELEMETRY_ATTACH_THREADS"),
		traces_sample_rate: parse_var(&var, "LOOM_TELEMETRY_TRACES_SAMPLE_RATE", "f64")?,
		max_breadcrumbs: parse_var(&var, "LOOM_TELEMETRY_MAX_BREADCRUMBS", "usize")?,
		verbose: flag("LOOM_TELEMETRY_VERBOSE"),
		forward_non_production: flag("LOOM_TELEMETRY_FORWARD_NON_PRODUCTION"),
		noise_patterns,
		log_level: var("LOOM_TELEMETRY_LOG_LEVEL"),
	})
}

fn parse_var<T, F>(var: &F, name: &str, kind: &str) -> Result<Option<T>, ConfigError>
where
	T: FromStr,
	F: Fn(&str) -> Option<String>,
{
	match var(name) {
		Some(v) => v
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::invalid_value(name, format!("invalid {kind} value '{v}'"))),
		None => Ok(None),
	}
}
