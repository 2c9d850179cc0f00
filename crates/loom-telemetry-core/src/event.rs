// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event records produced by the logging facade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breadcrumb::Breadcrumb;
use crate::context::UserContext;
use crate::level::Level;
use crate::scope::{Extras, Tags};
use crate::EventId;

/// Mechanism type used for errors raised across the native platform boundary.
pub const NATIVE_MECHANISM: &str = "native";

/// A single stack frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	pub function: Option<String>,
	pub module: Option<String>,
	pub filename: Option<String>,
	pub abs_path: Option<String>,
	pub lineno: Option<u32>,
	pub colno: Option<u32>,
	#[serde(default)]
	pub in_app: bool,
}

/// Frames ordered from the innermost call outwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}
}

/// How an exception reached the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
	/// "native", "framework", "panic", "task", "generic"
	#[serde(rename = "type")]
	pub ty: String,
	pub handled: bool,
}

impl Mechanism {
	pub fn new(ty: impl Into<String>, handled: bool) -> Self {
		Self {
			ty: ty.into(),
			handled,
		}
	}

	pub fn is_native(&self) -> bool {
		self.ty == NATIVE_MECHANISM
	}
}

/// One entry of an event's exception chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
	#[serde(rename = "type")]
	pub ty: String,
	pub value: String,
	pub module: Option<String>,
	pub mechanism: Option<Mechanism>,
	pub stacktrace: Option<Stacktrace>,
}

impl ExceptionInfo {
	pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			ty: ty.into(),
			value: value.into(),
			..Default::default()
		}
	}

	pub fn with_mechanism(mut self, mechanism: Mechanism) -> Self {
		self.mechanism = Some(mechanism);
		self
	}

	pub fn with_stacktrace(mut self, stacktrace: Stacktrace) -> Self {
		self.stacktrace = (!stacktrace.is_empty()).then_some(stacktrace);
		self
	}

	pub fn first_frame(&self) -> Option<&Frame> {
		self.stacktrace.as_ref().and_then(|st| st.frames.first())
	}
}

/// A record to be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	pub event_id: EventId,
	pub timestamp: DateTime<Utc>,
	pub level: Level,
	pub message: Option<String>,
	#[serde(default)]
	pub tags: Tags,
	#[serde(default)]
	pub extra: Extras,
	pub user: Option<UserContext>,
	pub platform: Option<String>,
	pub environment: Option<String>,
	pub release: Option<String>,
	#[serde(default)]
	pub breadcrumbs: Vec<Breadcrumb>,
	#[serde(default)]
	pub exceptions: Vec<ExceptionInfo>,
}

impl Default for Event {
	fn default() -> Self {
		Self {
			event_id: EventId::new(),
			timestamp: Utc::now(),
			level: Level::Info,
			message: None,
			tags: Tags::new(),
			extra: Extras::new(),
			user: None,
			platform: None,
			environment: None,
			release: None,
			breadcrumbs: Vec::new(),
			exceptions: Vec::new(),
		}
	}
}

impl Event {
	/// A plain message event.
	pub fn message(level: Level, message: impl Into<String>) -> Self {
		Self {
			level,
			message: Some(message.into()),
			..Default::default()
		}
	}

	/// An `error` level event carrying one exception.
	pub fn exception(exception: ExceptionInfo) -> Self {
		Self {
			level: Level::Error,
			exceptions: vec![exception],
			..Default::default()
		}
	}

	pub fn first_exception(&self) -> Option<&ExceptionInfo> {
		self.exceptions.first()
	}

	/// Message to show a human: the explicit message, else the first exception.
	pub fn display_message(&self) -> String {
		match (&self.message, self.first_exception()) {
			(Some(message), _) => message.clone(),
			(None, Some(exc)) => format!("{}: {}", exc.ty, exc.value),
			(None, None) => "<no message>".to_string(),
		}
	}

	/// New event with `tags` layered over this event's tags.
	///
	/// `self` is left untouched.
	pub fn copy_with_tags(&self, tags: Tags) -> Self {
		let mut merged = self.tags.clone();
		merged.extend(tags);
		Self {
			tags: merged,
			..self.clone()
		}
	}
}
