// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the telemetry core.

use thiserror::Error;

/// Errors raised while parsing or validating telemetry records.
#[derive(Debug, Error)]
pub enum TelemetryError {
	#[error("invalid level: {0}")]
	InvalidLevel(String),

	#[error("invalid flavor: {0}")]
	InvalidFlavor(String),
}
