// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup: wire config, pipeline hooks, client, logger and router together.

use std::sync::Arc;

use chrono::{DateTime, Local};
use loom_telemetry_config::TelemetryConfig;
use loom_telemetry_core::filter::{before_breadcrumb, before_send};
use loom_telemetry_core::{Event, FilterPolicy, Flavor};
use tracing::{error, warn};

use crate::client::{BeforeSend, ClientOptions, Hub};
use crate::console::Console;
use crate::error::{Result, TelemetrySdkError};
use crate::logger::Logger;
use crate::router::ErrorRouter;
use crate::transport::{NoopTransport, SharedTransport};

/// Everything the application needs after startup.
#[derive(Clone)]
pub struct Telemetry {
	hub: Hub,
	logger: Logger,
	router: ErrorRouter,
	console: Console,
	failure: Option<Arc<TelemetrySdkError>>,
}

impl Telemetry {
	pub fn hub(&self) -> &Hub {
		&self.hub
	}

	pub fn logger(&self) -> &Logger {
		&self.logger
	}

	pub fn router(&self) -> &ErrorRouter {
		&self.router
	}

	pub fn console(&self) -> &Console {
		&self.console
	}

	/// Why the client fell back to local-only mode, if it did.
	pub fn init_failure(&self) -> Option<&TelemetrySdkError> {
		self.failure.as_deref()
	}

	/// Whether events can reach the transport.
	pub fn reporting_enabled(&self) -> bool {
		self.failure.is_none()
	}

	pub fn shutdown(&self) {
		self.hub.shutdown();
	}
}

/// Start the telemetry client.
///
/// An invalid DSN or sample rate does not fail startup: a banner is written
/// to `console`, events still run through the local pipeline, and nothing
/// reaches `transport`.
pub fn init(config: &TelemetryConfig, console: Console, transport: SharedTransport) -> Result<Telemetry> {
	let policy = config.filter_policy();
	let options = client_options(config, pipeline_hook(policy, console.clone()));

	let (hub, failure) = match Hub::builder()
		.options(options.clone())
		.transport(transport)
		.build()
	{
		Ok(hub) => (hub, None),
		Err(e) => {
			let failure = TelemetrySdkError::InitializationFailure(e.to_string());
			error!(error = %e, "Telemetry client failed to start, reporting disabled");

			let banner =
				render_init_failure(config.environment, &config.platform, &e.to_string(), Local::now());
			if let Err(write_err) = console.write_block(&banner) {
				warn!(error = %write_err, "Failed to print initialization banner");
			}

			let hub = Hub::builder()
				.options(ClientOptions {
					dsn: None,
					traces_sample_rate: 0.0,
					..options
				})
				.transport(Arc::new(NoopTransport))
				.build()?;
			(hub, Some(Arc::new(failure)))
		}
	};

	let logger = Logger::new(Arc::new(hub.clone()));
	let router = ErrorRouter::new(logger.clone());

	Ok(Telemetry {
		hub,
		logger,
		router,
		console,
		failure,
	})
}

fn client_options(config: &TelemetryConfig, before_send: BeforeSend) -> ClientOptions {
	ClientOptions {
		dsn: config.dsn.clone(),
		release: config.release.clone(),
		environment: config.environment,
		platform: config.platform.clone(),
		send_default_pii: config.send_default_pii,
		debug: config.debug,
		attach_stacktrace: config.attach_stacktrace,
		attach_threads: config.attach_threads,
		traces_sample_rate: config.traces_sample_rate,
		max_breadcrumbs: config.max_breadcrumbs,
		before_send: Some(before_send),
		before_breadcrumb: Some(Arc::new(before_breadcrumb)),
	}
}

/// The `before_send` hook: filter, print the diagnostic, pass on what to forward.
fn pipeline_hook(policy: FilterPolicy, console: Console) -> BeforeSend {
	Arc::new(move |event: Event| {
		let outcome = before_send(event, &policy)?;
		if let Some(block) = &outcome.diagnostic {
			if let Err(e) = console.write_block(block) {
				warn!(error = %e, "Failed to print telemetry diagnostic");
			}
		}
		outcome.forward
	})
}

/// Banner printed when the client cannot start.
pub fn render_init_failure(
	environment: Flavor,
	platform: &str,
	reason: &str,
	at: DateTime<Local>,
) -> String {
	format!(
		"⚠️ [TELEMETRY] Initialization failed, reporting disabled\n  \
		 Environment: {environment}\n  \
		 Time: {}\n  \
		 Platform: {platform}\n  \
		 Reason: {reason}\n\n",
		at.format("%Y-%m-%d %H:%M:%S%.3f")
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::TelemetryClient;
	use crate::transport::MemoryTransport;
	use chrono::TimeZone;
	use loom_telemetry_core::Level;

	fn config(environment: Flavor) -> TelemetryConfig {
		TelemetryConfig {
			environment,
			platform: "Android".into(),
			attach_stacktrace: false,
			..Default::default()
		}
	}

	#[test]
	fn test_banner_contents() {
		let at = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
		let banner = render_init_failure(Flavor::Qa, "ios", "bad dsn", at);

		assert!(banner.starts_with("⚠️ [TELEMETRY] Initialization failed"));
		assert!(banner.contains("Environment: qa"));
		assert!(banner.contains("Time: 2025-03-04 05:06:07.000"));
		assert!(banner.contains("Platform: ios"));
		assert!(banner.contains("Reason: bad dsn"));
		assert!(banner.ends_with("\n\n"));
	}

	#[tokio::test]
	async fn test_development_prints_and_does_not_forward() {
		let console = Console::buffer();
		let transport = MemoryTransport::new();
		let telemetry = init(
			&config(Flavor::Development),
			console.clone(),
			Arc::new(transport.clone()),
		)
		.unwrap();

		let id = telemetry
			.logger()
			.log("hello", None, None, Level::Info)
			.await
			.unwrap();

		assert!(id.is_none());
		assert!(transport.is_empty());
		assert!(console.contents().contains("ℹ️ [INFO] hello"));
	}

	#[tokio::test]
	async fn test_invalid_dsn_degrades_to_local_only() {
		let console = Console::buffer();
		let transport = MemoryTransport::new();
		let config = TelemetryConfig {
			dsn: Some("not-a-dsn".into()),
			verbose: true,
			..config(Flavor::Production)
		};

		let telemetry = init(&config, console.clone(), Arc::new(transport.clone())).unwrap();

		assert!(!telemetry.reporting_enabled());
		assert!(matches!(
			telemetry.init_failure(),
			Some(TelemetrySdkError::InitializationFailure(_))
		));
		assert!(console.contents().contains("Environment: production"));
		assert!(console.contents().contains("Platform: Android"));

		telemetry
			.logger()
			.log("still running", None, None, Level::Error)
			.await
			.unwrap();

		assert!(transport.is_empty());
		assert!(console.contents().contains("❌ [ERROR] still running"));
		assert!(telemetry.hub().options().dsn.is_none());
	}

	#[tokio::test]
	async fn test_bad_sample_rate_degrades() {
		let console = Console::buffer();
		let config = TelemetryConfig {
			traces_sample_rate: 2.0,
			..config(Flavor::Qa)
		};

		let telemetry = init(&config, console.clone(), Arc::new(MemoryTransport::new())).unwrap();

		assert!(!telemetry.reporting_enabled());
		assert!(console.contents().contains("traces_sample_rate"));
	}

	#[tokio::test]
	async fn test_ui_click_debug_breadcrumbs_dropped() {
		let telemetry = init(
			&config(Flavor::Development),
			Console::Disabled,
			Arc::new(MemoryTransport::new()),
		)
		.unwrap();

		telemetry
			.logger()
			.add_breadcrumb("tap", Some("ui.click"), None, Level::Debug)
			.await;
		telemetry
			.logger()
			.add_breadcrumb("tap", Some("ui.click"), None, Level::Info)
			.await;

		assert_eq!(telemetry.hub().breadcrumbs().len(), 1);
	}
}
