// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deployment flavor (environment) of the running process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TelemetryError;

/// Deployment context, set once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
	#[default]
	Development,
	Qa,
	Production,
}

impl Flavor {
	pub fn is_production(&self) -> bool {
		matches!(self, Self::Production)
	}
}

impl fmt::Display for Flavor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Development => write!(f, "development"),
			Self::Qa => write!(f, "qa"),
			Self::Production => write!(f, "production"),
		}
	}
}

impl FromStr for Flavor {
	type Err = TelemetryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"development" | "dev" => Ok(Self::Development),
			"qa" => Ok(Self::Qa),
			"production" | "prod" => Ok(Self::Production),
			_ => Err(TelemetryError::InvalidFlavor(s.to_string())),
		}
	}
}
