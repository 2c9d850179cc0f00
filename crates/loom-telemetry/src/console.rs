// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local developer console for diagnostic blocks and banners.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Where diagnostic blocks are written.
///
/// `Buffer` keeps everything in memory, which is what tests read back.
#[derive(Debug, Clone, Default)]
pub enum Console {
	#[default]
	Stdout,
	Buffer(Arc<Mutex<String>>),
	Disabled,
}

impl Console {
	/// A console that records into memory.
	pub fn buffer() -> Self {
		Self::Buffer(Arc::new(Mutex::new(String::new())))
	}

	/// Write `text` as-is. Blocks carry their own trailing newlines.
	pub fn write_block(&self, text: &str) -> io::Result<()> {
		match self {
			Self::Stdout => {
				let mut out = io::stdout().lock();
				out.write_all(text.as_bytes())?;
				out.flush()
			}
			Self::Buffer(buffer) => {
				buffer
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.push_str(text);
				Ok(())
			}
			Self::Disabled => Ok(()),
		}
	}

	/// Everything written so far. Empty for non-buffer consoles.
	pub fn contents(&self) -> String {
		match self {
			Self::Buffer(buffer) => buffer.lock().unwrap_or_else(PoisonError::into_inner).clone(),
			_ => String::new(),
		}
	}
}
