// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom telemetry facade.
//!
//! This crate holds everything that does not need a runtime: the event and
//! breadcrumb records, the shared [`Scope`], error classification, and the
//! pure `before_send` / `before_breadcrumb` pipeline. The client SDK
//! (`loom-telemetry`) wires these into a hub and a logging facade.
//!
//! # Overview
//!
//! - [`Level`] and [`Flavor`] drive the admission policy
//! - [`filter::before_send`] admits, de-noises, renders and enriches events
//! - [`filter::before_breadcrumb`] drops low-value UI click breadcrumbs
//! - [`SharedScope`] is the only way to read or mutate tags, extras and user
//! - [`classify`] maps caught errors onto framework / platform / generic

pub mod breadcrumb;
pub mod classify;
pub mod context;
pub mod diagnostic;
pub mod error;
pub mod event;
pub mod filter;
pub mod flavor;
pub mod level;
pub mod scope;

pub use breadcrumb::Breadcrumb;
pub use classify::{classify, ErrorClass, FrameworkError, PlatformError};
pub use context::UserContext;
pub use diagnostic::render_diagnostic;
pub use error::TelemetryError;
pub use event::{Event, ExceptionInfo, Frame, Mechanism, Stacktrace};
pub use filter::{
	add_tags, before_breadcrumb, before_send, is_noise, should_capture, FilterOutcome,
	FilterPolicy,
};
pub use flavor::Flavor;
pub use level::Level;
pub use scope::{Extras, Scope, SharedScope, Tags};

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.simple())
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}
