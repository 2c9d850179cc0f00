// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Demo binary exercising every entry point of the telemetry facade.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use loom_telemetry::{
	init, with_scoped_context, Console, MemoryTransport, SharedTransport, TracingTransport,
};
use loom_telemetry_core::{Flavor, FrameworkError, Level, PlatformError, Tags};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Loom telemetry demo - drive the logging facade from the command line.
#[derive(Parser, Debug)]
#[command(
	name = "loom-telemetry-demo",
	about = "Exercise the Loom telemetry facade",
	version
)]
struct Args {
	/// Telemetry config file (defaults to the system and user files)
	#[arg(long, env = "LOOM_TELEMETRY_CONFIG")]
	config: Option<PathBuf>,

	/// Override the configured environment (development, qa, production)
	#[arg(long)]
	environment: Option<Flavor>,

	/// Collect forwarded events in memory and print them as JSON on exit
	#[arg(long)]
	show_forwarded: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Log a message
	Log {
		message: String,
		#[arg(long, default_value = "info")]
		level: Level,
		/// Tag as key=value, repeatable
		#[arg(long = "tag", value_parser = parse_key_val)]
		tags: Vec<(String, String)>,
	},
	/// Record a breadcrumb, then log a message that carries it
	Breadcrumb {
		message: String,
		#[arg(long)]
		category: Option<String>,
		#[arg(long, default_value = "info")]
		level: Level,
	},
	/// Report a UI framework error through the framework callback
	FrameworkError {
		#[arg(default_value = "A RenderFlex overflowed by 42 pixels on the right.")]
		message: String,
	},
	/// Report a native platform error
	PlatformError {
		#[arg(long, default_value = "TEST_ERROR")]
		code: String,
		#[arg(default_value = "Simulated native error")]
		message: String,
	},
	/// Fail a background task with an error
	GenericError {
		#[arg(default_value = "Simulated generic failure")]
		message: String,
	},
	/// Panic inside a background task
	Panic {
		#[arg(default_value = "Simulated panic")]
		message: String,
	},
	/// Log a message with temporary scope tags
	Scoped {
		message: String,
		/// Tag as key=value, repeatable
		#[arg(long = "tag", value_parser = parse_key_val)]
		tags: Vec<(String, String)>,
	},
	/// Identify a user, log a message, then clear the user
	User {
		id: String,
		#[arg(long)]
		name: Option<String>,
	},
	/// Show version and build information
	Version,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct DemoFailure(String);

fn parse_key_val(s: &str) -> Result<(String, String), String> {
	let (key, value) = s
		.split_once('=')
		.ok_or_else(|| format!("expected key=value, got '{s}'"))?;
	if key.is_empty() {
		return Err(format!("empty key in '{s}'"));
	}
	Ok((key.to_string(), value.to_string()))
}

async fn explode(message: String) -> Result<(), DemoFailure> {
	panic!("{message}")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Command::Version = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let mut config = match &args.config {
		Some(path) => loom_telemetry_config::load_config_with_file(path)?,
		None => loom_telemetry_config::load_config()?,
	};
	if let Some(environment) = args.environment {
		config.environment = environment;
	}

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.log_level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let memory = MemoryTransport::new();
	let transport: SharedTransport = if args.show_forwarded {
		Arc::new(memory.clone())
	} else {
		Arc::new(TracingTransport)
	};

	let telemetry = init(&config, Console::Stdout, transport)?;
	telemetry.router().install();
	let logger = telemetry.logger();

	tracing::info!(
		environment = %config.environment,
		reporting = telemetry.reporting_enabled(),
		"starting loom-telemetry-demo"
	);

	match args.command {
		Command::Log {
			message,
			level,
			tags,
		} => {
			let tags = (!tags.is_empty()).then(|| tags.into_iter().collect::<Tags>());
			logger.log(message, tags, None, level).await?;
		}
		Command::Breadcrumb {
			message,
			category,
			level,
		} => {
			logger
				.add_breadcrumb(message, category.as_deref(), None, level)
				.await;
			logger
				.log("Breadcrumb recorded", None, None, Level::Warning)
				.await?;
		}
		Command::FrameworkError { message } => {
			let callback = telemetry.router().framework_error_callback();
			let err = FrameworkError {
				library: Some("demo".to_string()),
				..FrameworkError::new(message)
			};
			callback(&err, None);
		}
		Command::PlatformError { code, message } => {
			let err = PlatformError::new(code, message);
			logger.log_platform_error(&err, None, None, None).await?;
		}
		Command::GenericError { message } => {
			telemetry
				.router()
				.spawn_guarded(async move { Err::<(), _>(DemoFailure(message)) })
				.await?;
		}
		Command::Panic { message } => {
			telemetry.router().spawn_guarded(explode(message)).await?;
		}
		Command::Scoped { message, tags } => {
			let scope = logger.scope().clone();
			let tags = tags.into_iter().collect::<Tags>();
			with_scoped_context(&scope, Some(tags), None, || async {
				logger.log(message, None, None, Level::Warning).await
			})
			.await?;
		}
		Command::User { id, name } => {
			logger.set_user(id, name, None).await;
			logger
				.log("Logged with user context", None, None, Level::Warning)
				.await?;
			logger.clear_user().await;
		}
		Command::Version => {}
	}

	if args.show_forwarded {
		for event in memory.events() {
			println!("{}", serde_json::to_string_pretty(&event)?);
		}
	}

	telemetry.shutdown();
	Ok(())
}
