// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack capture for routed errors and panics.

use std::path::Path;

use loom_telemetry_core::{Frame, Stacktrace};
use rustc_demangle::demangle;

/// Capture the current stack, innermost frame first.
///
/// Frames belonging to the capture machinery itself (this crate and the
/// `backtrace` crate) are trimmed from the top so the first frame is the
/// caller's.
pub fn capture_backtrace() -> Stacktrace {
	let backtrace = backtrace::Backtrace::new();
	let mut frames = Vec::new();

	for frame in backtrace.frames() {
		for symbol in frame.symbols() {
			let Some(name) = symbol.name() else {
				continue;
			};
			let demangled = match name.as_str() {
				Some(raw) => format!("{:#}", demangle(raw)),
				None => name.to_string(),
			};
			frames.push(build_frame(
				&demangled,
				symbol.filename(),
				symbol.lineno(),
				symbol.colno(),
			));
		}
	}

	Stacktrace {
		frames: trim_capture_frames(frames),
	}
}

/// Build a frame from a demangled symbol path like `my_app::cart::submit`.
fn build_frame(
	demangled: &str,
	path: Option<&Path>,
	lineno: Option<u32>,
	colno: Option<u32>,
) -> Frame {
	let (module, function) = match demangled.rfind("::") {
		Some(idx) => (
			Some(demangled[..idx].to_string()),
			demangled[idx + 2..].to_string(),
		),
		None => (None, demangled.to_string()),
	};

	Frame {
		function: Some(function),
		module,
		filename: path
			.and_then(|p| p.file_name())
			.map(|f| f.to_string_lossy().into_owned()),
		abs_path: path.map(|p| p.display().to_string()),
		lineno,
		colno,
		in_app: is_in_app_frame(demangled),
	}
}

/// Drop leading frames that belong to stack capture or to this SDK.
fn trim_capture_frames(frames: Vec<Frame>) -> Vec<Frame> {
	const CAPTURE_PREFIXES: &[&str] = &["backtrace::", "loom_telemetry::", "<loom_telemetry::"];

	let first_caller = frames.iter().position(|frame| {
		let path = qualified_name(frame);
		!CAPTURE_PREFIXES.iter().any(|p| path.starts_with(p))
	});

	match first_caller {
		Some(idx) => frames.into_iter().skip(idx).collect(),
		None => frames,
	}
}

fn qualified_name(frame: &Frame) -> String {
	match (&frame.module, &frame.function) {
		(Some(module), Some(function)) => format!("{module}::{function}"),
		(None, Some(function)) => function.clone(),
		_ => String::new(),
	}
}

/// Determine if a frame is from application code rather than std or the runtime.
fn is_in_app_frame(function: &str) -> bool {
	const SYSTEM_PREFIXES: &[&str] = &[
		"std::",
		"core::",
		"alloc::",
		"<std::",
		"<core::",
		"<alloc::",
		"tokio::",
		"<tokio::",
		"futures::",
		"<futures::",
		"async_trait::",
		"tracing::",
		"<tracing::",
		"backtrace::",
		"<backtrace::",
		"panic_unwind::",
		"rust_begin_unwind",
		"rust_panic",
		"__rust_",
		"_rust_",
		"__libc_start",
		"_start",
	];

	const SYSTEM_CONTAINS: &[&str] = &[
		"::panic::",
		"::panicking::",
		"::thread::",
		"::rt::",
		"::runtime::",
		"::sys_common::",
	];

	!SYSTEM_PREFIXES.iter().any(|p| function.starts_with(p))
		&& !SYSTEM_CONTAINS.iter().any(|c| function.contains(c))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_in_app_frame_excludes_std() {
		assert!(!is_in_app_frame("std::panic::panic_any"));
		assert!(!is_in_app_frame("core::panicking::panic"));
		assert!(!is_in_app_frame("alloc::vec::Vec::push"));
		assert!(!is_in_app_frame("tokio::runtime::Runtime::block_on"));
	}

	#[test]
	fn test_is_in_app_frame_includes_user_code() {
		assert!(is_in_app_frame("my_app::main"));
		assert!(is_in_app_frame("demo::checkout::submit"));
	}

	#[test]
	fn test_build_frame_splits_module_and_function() {
		let frame = build_frame(
			"my_app::cart::submit",
			Some(Path::new("/src/my_app/src/cart.rs")),
			Some(42),
			Some(7),
		);
		assert_eq!(frame.function.as_deref(), Some("submit"));
		assert_eq!(frame.module.as_deref(), Some("my_app::cart"));
		assert_eq!(frame.filename.as_deref(), Some("cart.rs"));
		assert_eq!(frame.abs_path.as_deref(), Some("/src/my_app/src/cart.rs"));
		assert_eq!(frame.lineno, Some(42));
		assert!(frame.in_app);
	}

	#[test]
	fn test_build_frame_without_module() {
		let frame = build_frame("main", None, None, None);
		assert_eq!(frame.function.as_deref(), Some("main"));
		assert!(frame.module.is_none());
		assert!(frame.filename.is_none());
	}

	#[test]
	fn test_trim_capture_frames() {
		let frames = vec![
			build_frame("backtrace::capture::Backtrace::new", None, None, None),
			build_frame("loom_telemetry::backtrace::capture_backtrace", None, None, None),
			build_frame("my_app::handler", None, None, None),
			build_frame("loom_telemetry::logger::Logger::log", None, None, None),
		];
		let trimmed = trim_capture_frames(frames);
		assert_eq!(trimmed.len(), 2);
		assert_eq!(trimmed[0].function.as_deref(), Some("handler"));
	}

	#[test]
	fn test_capture_backtrace() {
		// Frame availability depends on build mode and debug info.
		let _stacktrace = capture_backtrace();
	}
}
