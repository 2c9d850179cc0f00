// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Breadcrumbs: small records of what happened before an event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Category the logging facade uses when the caller gives none.
pub const DEFAULT_CATEGORY: &str = "app";

/// A breadcrumb representing a user or system action leading up to an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub timestamp: DateTime<Utc>,
	/// "ui.click", "navigation", "http", "app"
	pub category: String,
	pub message: Option<String>,
	pub level: Level,
	pub data: serde_json::Map<String, serde_json::Value>,
}

impl Breadcrumb {
	pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			category: category.into(),
			message: Some(message.into()),
			..Default::default()
		}
	}

	pub fn with_level(mut self, level: Level) -> Self {
		self.level = level;
		self
	}
}

impl Default for Breadcrumb {
	fn default() -> Self {
		Self {
			timestamp: Utc::now(),
			category: DEFAULT_CATEGORY.to_string(),
			message: None,
			level: Level::Info,
			data: serde_json::Map::new(),
		}
	}
}
