// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Hand-off point between the hub and whatever delivers events.
//!
//! Delivery itself (batching, network, retries) belongs to the external
//! client behind this trait.

use std::sync::{Arc, Mutex, PoisonError};

use loom_telemetry_core::{Event, Level};
use tracing::{debug, error, info, trace, warn};

/// Receives events that survived the `before_send` pipeline.
///
/// `send` is called from panic hooks as well as async code, so it must not
/// block or await. Implementations should queue and return.
pub trait Transport: Send + Sync + 'static {
	fn name(&self) -> &'static str;

	fn send(&self, event: Event);
}

/// Type alias for a shared transport.
pub type SharedTransport = Arc<dyn Transport>;

/// Discards every event. Used when reporting is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
	fn name(&self) -> &'static str {
		"noop"
	}

	fn send(&self, event: Event) {
		trace!(event_id = %event.event_id, "reporting disabled, event discarded");
	}
}

/// Emits each forwarded event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

impl Transport for TracingTransport {
	fn name(&self) -> &'static str {
		"tracing"
	}

	fn send(&self, event: Event) {
		let message = event.display_message();
		let tags = serde_json::to_string(&event.tags).unwrap_or_default();
		let exception_type = event
			.first_exception()
			.map(|exc| exc.ty.as_str())
			.unwrap_or("");

		match event.level {
			Level::Debug => debug!(
				target: "loom_telemetry::event",
				event_id = %event.event_id,
				tags = %tags,
				exception_type,
				"{message}"
			),
			Level::Info => info!(
				target: "loom_telemetry::event",
				event_id = %event.event_id,
				tags = %tags,
				exception_type,
				"{message}"
			),
			Level::Warning => warn!(
				target: "loom_telemetry::event",
				event_id = %event.event_id,
				tags = %tags,
				exception_type,
				"{message}"
			),
			Level::Error | Level::Fatal => error!(
				target: "loom_telemetry::event",
				event_id = %event.event_id,
				level = %event.level,
				tags = %tags,
				exception_type,
				"{message}"
			),
		}
	}
}

/// Keeps forwarded events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
	events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Events received so far, oldest first.
	pub fn events(&self) -> Vec<Event> {
		self.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn len(&self) -> usize {
		self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
	}
}

impl Transport for MemoryTransport {
	fn name(&self) -> &'static str {
		"memory"
	}

	fn send(&self, event: Event) {
		self.events
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(event);
	}
}
