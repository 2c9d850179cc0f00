// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Classification of caught errors into framework, platform and generic.

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;

use crate::event::{ExceptionInfo, Mechanism, NATIVE_MECHANISM};
use crate::scope::Tags;

pub const TAG_ERROR_TYPE: &str = "error_type";
pub const TAG_ERROR_CODE: &str = "error_code";

/// A failure raised by the UI framework (layout, build, render).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FrameworkError {
	pub message: String,
	/// Framework component that reported the error, e.g. "widgets library".
	pub library: Option<String>,
}

impl FrameworkError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			library: None,
		}
	}
}

/// A failure raised across the native platform boundary.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct PlatformError {
	pub code: String,
	pub message: String,
	pub details: Option<Value>,
}

impl PlatformError {
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code: code.into(),
			message: message.into(),
			details: None,
		}
	}
}

/// Where a caught error came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
	Framework,
	Platform { code: String },
	Generic,
}

impl ErrorClass {
	/// Value of the `error_type` tag.
	pub fn error_type(&self) -> &'static str {
		match self {
			Self::Framework => "framework",
			Self::Platform { .. } => NATIVE_MECHANISM,
			Self::Generic => "generic",
		}
	}

	/// Tags derived from the classification.
	pub fn tags(&self) -> Tags {
		let mut tags = Tags::new();
		tags.insert(TAG_ERROR_TYPE.to_string(), self.error_type().to_string());
		if let Self::Platform { code } = self {
			tags.insert(TAG_ERROR_CODE.to_string(), code.clone());
		}
		tags
	}

	pub fn mechanism(&self, handled: bool) -> Mechanism {
		Mechanism::new(self.error_type(), handled)
	}

	/// Caller tags merged with the classification tags; classification wins.
	pub fn merge_tags(&self, caller: Option<Tags>) -> Tags {
		let mut merged = caller.unwrap_or_default();
		merged.extend(self.tags());
		merged
	}
}

/// Classify `error` by looking for a known error type along its source chain.
pub fn classify(error: &(dyn StdError + 'static)) -> ErrorClass {
	let mut current = Some(error);
	while let Some(err) = current {
		if err.downcast_ref::<FrameworkError>().is_some() {
			return ErrorClass::Framework;
		}
		if let Some(platform) = err.downcast_ref::<PlatformError>() {
			return ErrorClass::Platform {
				code: platform.code.clone(),
			};
		}
		current = err.source();
	}
	ErrorClass::Generic
}

/// Build the exception entry for `error`.
///
/// `type_hint` names generic errors; known types use their own name.
pub fn describe_error(
	error: &(dyn StdError + 'static),
	class: &ErrorClass,
	type_hint: Option<&str>,
) -> ExceptionInfo {
	let ty = match class {
		ErrorClass::Framework => "FrameworkError",
		ErrorClass::Platform { .. } => "PlatformError",
		ErrorClass::Generic => type_hint.unwrap_or("Error"),
	};

	let mut value = error.to_string();
	let mut source = error.source();
	while let Some(cause) = source {
		value.push_str(": ");
		value.push_str(&cause.to_string());
		source = cause.source();
	}

	ExceptionInfo::new(ty, value)
}

/// Last path segment of a type name, without generics.
pub fn short_type_name<T: ?Sized>() -> &'static str {
	let full = std::any::type_name::<T>();
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Error)]
	#[error("loading profile failed")]
	struct Wrapper(#[source] PlatformError);

	#[derive(Debug, Error)]
	#[error("socket closed")]
	struct SocketClosed;

	#[test]
	fn classifies_framework() {
		let err = FrameworkError::new("RenderFlex overflowed");
		assert_eq!(classify(&err), ErrorClass::Framework);
		assert_eq!(ErrorClass::Framework.tags()[TAG_ERROR_TYPE], "framework");
	}

	#[test]
	fn classifies_platform_with_code() {
		let err = PlatformError::new("TEST_ERROR", "native call failed");
		let class = classify(&err);
		assert_eq!(
			class,
			ErrorClass::Platform {
				code: "TEST_ERROR".into()
			}
		);
		let tags = class.tags();
		assert_eq!(tags[TAG_ERROR_TYPE], "native");
		assert_eq!(tags[TAG_ERROR_CODE], "TEST_ERROR");
	}

	#[test]
	fn classifies_through_source_chain() {
		let err = Wrapper(PlatformError::new("E42", "denied"));
		assert!(matches!(classify(&err), ErrorClass::Platform { code } if code == "E42"));
	}

	#[test]
	fn anything_else_is_generic() {
		assert_eq!(classify(&SocketClosed), ErrorClass::Generic);
		assert_eq!(ErrorClass::Generic.tags()[TAG_ERROR_TYPE], "generic");
	}

	#[test]
	fn classification_wins_on_collision() {
		let mut caller = Tags::new();
		caller.insert("error_type".into(), "custom".into());
		caller.insert("screen".into(), "home".into());

		let merged = ErrorClass::Generic.merge_tags(Some(caller));
		assert_eq!(merged["error_type"], "generic");
		assert_eq!(merged["screen"], "home");
	}

	#[test]
	fn describe_includes_sources() {
		let err = Wrapper(PlatformError::new("E1", "nope"));
		let class = classify(&err);
		let exc = describe_error(&err, &class, None);
		assert_eq!(exc.ty, "PlatformError");
		assert_eq!(exc.value, "loading profile failed: E1: nope");
	}

	#[test]
	fn describe_generic_uses_hint() {
		let exc = describe_error(&SocketClosed, &ErrorClass::Generic, Some("SocketClosed"));
		assert_eq!(exc.ty, "SocketClosed");
		let exc = describe_error(&SocketClosed, &ErrorClass::Generic, None);
		assert_eq!(exc.ty, "Error");
	}

	#[test]
	fn short_type_name_strips_path() {
		assert_eq!(short_type_name::<SocketClosed>(), "SocketClosed");
		assert_eq!(short_type_name::<Vec<String>>(), "Vec");
	}
}
