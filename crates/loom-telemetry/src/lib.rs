// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Logging facade and global error handling for Loom applications.
//!
//! Application code logs through a [`Logger`]; uncaught errors reach the same
//! path through an [`ErrorRouter`]. Both feed a [`Hub`], which applies the
//! shared scope, runs the `before_send` pipeline from
//! [`loom_telemetry_core::filter`], prints diagnostics to a [`Console`] and
//! hands forwarded events to a [`Transport`].
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use loom_telemetry::{init, Console, TracingTransport};
//! use loom_telemetry_config::load_config;
//! use loom_telemetry_core::Level;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     let telemetry = init(&config, Console::Stdout, Arc::new(TracingTransport))?;
//!
//!     // Panics and guarded tasks are reported from here on.
//!     telemetry.router().install();
//!
//!     telemetry.logger().set_user("user_123", Some("Ada".into()), None).await;
//!     telemetry
//!         .logger()
//!         .log("Application started", None, None, Level::Info)
//!         .await?;
//!
//!     // Temporary tags around one unit of work.
//!     let scope = telemetry.logger().scope().clone();
//!     loom_telemetry::with_scoped_context(&scope, Some(tags), None, || async {
//!         checkout().await
//!     })
//!     .await?;
//!
//!     telemetry.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Environments
//!
//! - **development / qa**: every level is admitted and printed locally,
//!   nothing is forwarded unless `forward_non_production` is set
//! - **production**: warning and above are enriched and forwarded, nothing is
//!   printed unless `verbose` is set

mod backtrace;
pub mod client;
pub mod console;
pub mod error;
pub mod init;
pub mod logger;
pub mod router;
pub mod scoped;
pub mod transport;

pub use client::{BeforeBreadcrumb, BeforeSend, ClientOptions, Dsn, Hub, HubBuilder, TelemetryClient};
pub use console::Console;
pub use error::{Result, TelemetrySdkError};
pub use init::{init, Telemetry};
pub use logger::Logger;
pub use router::{ErrorRouter, FrameworkErrorCallback};
pub use scoped::with_scoped_context;
pub use transport::{MemoryTransport, NoopTransport, SharedTransport, TracingTransport, Transport};

pub use backtrace::capture_backtrace;
