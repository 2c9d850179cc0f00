// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User context attached to events.

use serde::{Deserialize, Serialize};

/// Identity of the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
	pub id: String,
	pub display_name: Option<String>,
	pub email: Option<String>,
	/// IP address (sensitive - stripped unless default PII is enabled)
	pub ip_address: Option<String>,
	pub data: serde_json::Map<String, serde_json::Value>,
}

impl UserContext {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Copy of this user with PII fields removed.
	pub fn without_pii(&self) -> Self {
		Self {
			email: None,
			ip_address: None,
			..self.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn without_pii_keeps_identity() {
		let user = UserContext {
			id: "u1".into(),
			display_name: Some("Ada".into()),
			email: Some("ada@example.com".into()),
			ip_address: Some("10.0.0.1".into()),
			data: serde_json::Map::new(),
		};

		let stripped = user.without_pii();
		assert_eq!(stripped.id, "u1");
		assert_eq!(stripped.display_name.as_deref(), Some("Ada"));
		assert!(stripped.email.is_none());
		assert!(stripped.ip_address.is_none());
		assert_eq!(user.email.as_deref(), Some("ada@example.com"));
	}
}
