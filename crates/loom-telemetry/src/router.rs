// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global error routing: panic hook, framework callback and guarded tasks.

use std::any::Any;
use std::error::Error as StdError;
use std::future::Future;
use std::panic::PanicHookInfo;
use std::sync::{Arc, OnceLock};

use loom_telemetry_core::classify::short_type_name;
use loom_telemetry_core::{Event, EventId, FrameworkError, Mechanism, Stacktrace, Tags};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backtrace::capture_backtrace;
use crate::client::TelemetryClient;
use crate::logger::{prepare_exception, Logger};

/// Mechanism type for events raised by the panic hook.
pub const PANIC_MECHANISM: &str = "panic";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Callback the host registers in its UI-framework error slot.
pub type FrameworkErrorCallback = Arc<dyn Fn(&FrameworkError, Option<Stacktrace>) + Send + Sync>;

/// Routes uncaught errors from every global entry point into the logger.
#[derive(Clone)]
pub struct ErrorRouter {
	logger: Logger,
}

impl ErrorRouter {
	pub fn new(logger: Logger) -> Self {
		Self { logger }
	}

	pub fn logger(&self) -> &Logger {
		&self.logger
	}

	/// Whether a router already owns the panic hook in this process.
	pub fn is_installed() -> bool {
		INSTALLED.get().is_some()
	}

	/// Install the panic hook. Only the first call in a process installs;
	/// later calls return `false` and change nothing.
	///
	/// The previous hook still runs after the panic is reported.
	pub fn install(&self) -> bool {
		if INSTALLED.set(()).is_err() {
			debug!("Error router already installed");
			return false;
		}

		let client = Arc::clone(self.logger.client());
		let previous_hook = std::panic::take_hook();

		std::panic::set_hook(Box::new(move |info| {
			report_panic(client.as_ref(), info);
			previous_hook(info);
		}));

		info!("Error router installed");
		true
	}

	/// Callback for the UI framework's error slot.
	///
	/// Framework errors are logged locally as well as reported.
	pub fn framework_error_callback(&self) -> FrameworkErrorCallback {
		let router = self.clone();
		Arc::new(move |err: &FrameworkError, stack: Option<Stacktrace>| {
			error!(
				library = err.library.as_deref().unwrap_or("unknown"),
				"Framework error: {}",
				err.message
			);
			router.route(err, stack, None);
		})
	}

	/// Report an uncaught error synchronously.
	pub fn route(
		&self,
		err: &(dyn StdError + 'static),
		stack: Option<Stacktrace>,
		tags: Option<Tags>,
	) -> Option<EventId> {
		self.report(err, None, stack, tags)
	}

	fn report(
		&self,
		err: &(dyn StdError + 'static),
		type_hint: Option<&str>,
		stack: Option<Stacktrace>,
		tags: Option<Tags>,
	) -> Option<EventId> {
		let client = self.logger.client();
		let (exception, tags) = prepare_exception(err, type_hint, tags, false);

		let stack = match stack {
			Some(stack) if !stack.is_empty() => stack,
			_ if client.options().attach_stacktrace => capture_backtrace(),
			_ => Stacktrace::default(),
		};

		let mut event = Event::exception(exception.with_stacktrace(stack));
		event.tags = tags;
		submit(client.as_ref(), event)
	}

	/// Spawn `future` on the tokio runtime, reporting its failure.
	///
	/// An `Err` result is reported as an unhandled generic error. A panic is
	/// reported by the panic hook when one is installed, and here otherwise.
	/// The handle yields the task's value, or `None` if it failed. Aborting
	/// the handle aborts `future` as well.
	pub fn spawn_guarded<F, T, E>(&self, future: F) -> JoinHandle<Option<T>>
	where
		F: Future<Output = std::result::Result<T, E>> + Send + 'static,
		T: Send + 'static,
		E: StdError + Send + Sync + 'static,
	{
		let router = self.clone();
		let mut task = AbortOnDrop(tokio::spawn(future));

		tokio::spawn(async move {
			match (&mut task.0).await {
				Ok(Ok(value)) => Some(value),
				Ok(Err(err)) => {
					router.report(&err, Some(short_type_name::<E>()), None, None);
					None
				}
				Err(join_err) if join_err.is_panic() => {
					if !Self::is_installed() {
						let message = panic_message(join_err.into_panic().as_ref());
						let event = panic_event(&message, None, capture_backtrace());
						submit(router.logger.client().as_ref(), event);
					}
					None
				}
				Err(_) => {
					debug!("Guarded task cancelled");
					None
				}
			}
		})
	}
}

/// Aborts the wrapped task when dropped, so aborting a guarded handle stops
/// the task it watches.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
	fn drop(&mut self) {
		self.0.abort();
	}
}

fn submit(client: &dyn TelemetryClient, event: Event) -> Option<EventId> {
	match client.capture_event_sync(event) {
		Ok(id) => id,
		Err(e) => {
			warn!(error = %e, "Failed to report uncaught error");
			None
		}
	}
}

fn report_panic(client: &dyn TelemetryClient, info: &PanicHookInfo<'_>) {
	let message = panic_message(info.payload());
	let location = info
		.location()
		.map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

	let stack = if client.options().attach_stacktrace {
		capture_backtrace()
	} else {
		Stacktrace::default()
	};

	let event = panic_event(&message, location.as_deref(), stack);
	if let Err(e) = client.capture_panic_event(event) {
		warn!(error = %e, "Failed to report panic");
	}
}

/// A panic payload, seen as an error so it takes the common exception path.
#[derive(Debug, Error)]
#[error("{0}")]
struct Panicked(String);

/// Build the event reported for a panic: an unhandled generic `error`.
fn panic_event(message: &str, location: Option<&str>, stack: Stacktrace) -> Event {
	let (exception, tags) =
		prepare_exception(&Panicked(message.to_string()), Some("panic"), None, false);
	let exception = exception
		.with_mechanism(Mechanism::new(PANIC_MECHANISM, false))
		.with_stacktrace(stack);

	let mut event = Event::exception(exception);
	event.tags = tags;
	if let Some(location) = location {
		event
			.extra
			.insert("location".to_string(), location.to_string().into());
	}
	event
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"Box<dyn Any>".to_string()
	}
}
