// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity levels shared by events and breadcrumbs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TelemetryError;

/// Severity of an event or breadcrumb, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
	Debug,
	Info,
	Warning,
	Error,
	Fatal,
}

impl Level {
	pub const ALL: [Level; 5] = [
		Level::Debug,
		Level::Info,
		Level::Warning,
		Level::Error,
		Level::Fatal,
	];

	/// Emoji used in developer-facing diagnostics.
	pub fn emoji(&self) -> &'static str {
		match self {
			Self::Debug => "🐛",
			Self::Info => "ℹ️",
			Self::Warning => "⚠️",
			Self::Error => "❌",
			Self::Fatal => "💀",
		}
	}

	/// Upper-case label used in developer-facing diagnostics.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Debug => "DEBUG",
			Self::Info => "INFO",
			Self::Warning => "WARNING",
			Self::Error => "ERROR",
			Self::Fatal => "FATAL",
		}
	}

	/// `ℹ️ [INFO]` style prefix.
	pub fn prefix(&self) -> String {
		format!("{} [{}]", self.emoji(), self.label())
	}
}

impl Default for Level {
	fn default() -> Self {
		Self::Info
	}
}

impl fmt::Display for Level {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
			Self::Fatal => write!(f, "fatal"),
		}
	}
}

impl FromStr for Level {
	type Err = TelemetryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" | "warn" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			"fatal" => Ok(Self::Fatal),
			_ => Err(TelemetryError::InvalidLevel(s.to_string())),
		}
	}
}
