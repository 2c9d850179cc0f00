// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Human-readable rendering of events for the developer console.

use chrono::Local;
use serde_json::Value;

use crate::event::{Event, Frame};

/// Render `event` as a console block.
///
/// The first line is `HH:MM:SS.mmm <emoji> [LEVEL] <message>`; user,
/// exception and tag lines follow when present. The block always ends with a
/// blank separator line.
pub fn render_diagnostic(event: &Event) -> String {
	let mut out = format!(
		"{} {} {}\n",
		event
			.timestamp
			.with_timezone(&Local)
			.format("%H:%M:%S%.3f"),
		event.level.prefix(),
		event.display_message()
	);

	if let Some(user) = &event.user {
		out.push_str(&format!("  👤 User: {}", user.id));
		if let Some(name) = &user.display_name {
			out.push_str(&format!(" ({name})"));
		}
		if !user.data.is_empty() {
			let data = user
				.data
				.iter()
				.map(|(k, v)| format!("{k}={}", plain_value(v)))
				.collect::<Vec<_>>()
				.join(", ");
			out.push_str(&format!(" [{data}]"));
		}
		out.push('\n');
	}

	if let Some(exc) = event.first_exception() {
		out.push_str(&format!("  🔥 {}: {}\n", exc.ty, exc.value));
		if let Some(frame) = exc.first_frame() {
			out.push_str(&format!("     at {}\n", frame_location(frame)));
		}
	}

	if !event.tags.is_empty() {
		let tags = event
			.tags
			.iter()
			.map(|(k, v)| format!("{k}={v}"))
			.collect::<Vec<_>>()
			.join(", ");
		out.push_str(&format!("  🏷️ Tags: {tags}\n"));
	}

	out.push('\n');
	out
}

fn frame_location(frame: &Frame) -> String {
	let function = frame.function.as_deref().unwrap_or("<unknown>");
	let symbol = match &frame.module {
		Some(module) if !function.starts_with(module.as_str()) => format!("{module}.{function}"),
		_ => function.to_string(),
	};
	let file = frame
		.filename
		.as_deref()
		.or(frame.abs_path.as_deref())
		.unwrap_or("<unknown>");
	match frame.lineno {
		Some(line) => format!("{symbol} ({file}:{line})"),
		None => format!("{symbol} ({file})"),
	}
}

fn plain_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
