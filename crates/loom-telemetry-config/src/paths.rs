// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Config file locations.

use std::path::PathBuf;

use crate::ConfigError;

/// System-wide config file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/loom/telemetry.toml";

/// User config file: `$XDG_CONFIG_HOME/loom/telemetry.toml`, falling back to
/// `~/.config/loom/telemetry.toml`.
pub fn user_config_file() -> Result<PathBuf, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	let path = config_home.join("loom/telemetry.toml");
	tracing::debug!(path = %path.display(), "resolved user telemetry config path");
	Ok(path)
}
