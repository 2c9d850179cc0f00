// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the telemetry SDK.

use thiserror::Error;

/// Result type alias for telemetry SDK operations.
pub type Result<T> = std::result::Result<T, TelemetrySdkError>;

/// Errors that can occur in the telemetry SDK.
#[derive(Debug, Error)]
pub enum TelemetrySdkError {
	/// The client has been shut down.
	#[error("telemetry client has been shut down")]
	ClientShutdown,

	/// The DSN could not be parsed.
	#[error("invalid DSN '{dsn}': {reason}")]
	InvalidDsn {
		/// The rejected DSN.
		dsn: String,
		/// Why it was rejected.
		reason: String,
	},

	/// A client option was out of range.
	#[error("invalid option {option}: {message}")]
	InvalidOption {
		/// Option name.
		option: &'static str,
		/// What was wrong with it.
		message: String,
	},

	/// The telemetry client could not be started.
	#[error("telemetry initialization failed: {0}")]
	InitializationFailure(String),
}
