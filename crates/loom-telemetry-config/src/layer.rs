// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.

use serde::Deserialize;

/// One source's view of the telemetry configuration.
///
/// Every field is optional; `merge` lets a higher-precedence layer override
/// only the fields it actually sets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfigLayer {
	pub dsn: Option<String>,
	pub release: Option<String>,
	pub environment: Option<String>,
	pub platform: Option<String>,
	pub send_default_pii: Option<bool>,
	pub debug: Option<bool>,
	pub attach_stacktrace: Option<bool>,
	pub attach_threads: Option<bool>,
	pub traces_sample_rate: Option<f64>,
	pub max_breadcrumbs: Option<usize>,
	pub verbose: Option<bool>,
	pub forward_non_production: Option<bool>,
	pub noise_patterns: Option<Vec<String>>,
	pub log_level: Option<String>,
}

impl TelemetryConfigLayer {
	/// Overlay `other` on top of `self`.
	pub fn merge(&mut self, other: TelemetryConfigLayer) {
		fn take<T>(slot: &mut Option<T>, value: Option<T>) {
			if value.is_some() {
				*slot = value;
			}
		}

		take(&mut self.dsn, other.dsn);
		take(&mut self.release, other.release);
		take(&mut self.environment, other.environment);
		take(&mut self.platform, other.platform);
		take(&mut self.send_default_pii, other.send_default_pii);
		take(&mut self.debug, other.debug);
		take(&mut self.attach_stacktrace, other.attach_stacktrace);
		take(&mut self.attach_threads, other.attach_threads);
		take(&mut self.traces_sample_rate, other.traces_sample_rate);
		take(&mut self.max_breadcrumbs, other.max_breadcrumbs);
		take(&mut self.verbose, other.verbose);
		take(&mut self.forward_non_production, other.forward_non_production);
		take(&mut self.noise_patterns, other.noise_patterns);
		take(&mut self.log_level, other.log_level);
	}
}
