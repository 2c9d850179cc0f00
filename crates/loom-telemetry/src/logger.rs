// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application-facing logging facade.
//!
//! Every call is mirrored as a `tracing` event under the
//! `loom_telemetry::logger` target and then handed to the telemetry client.

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;

use loom_telemetry_core::breadcrumb::DEFAULT_CATEGORY;
use loom_telemetry_core::classify::{describe_error, short_type_name};
use loom_telemetry_core::{
	classify, Breadcrumb, Event, EventId, ExceptionInfo, Extras, FrameworkError, Level,
	PlatformError, SharedScope, Stacktrace, Tags, UserContext,
};
use tracing::{debug, error, info, warn};

use crate::client::TelemetryClient;
use crate::error::Result;

/// Logging facade over a [`TelemetryClient`].
#[derive(Clone)]
pub struct Logger {
	client: Arc<dyn TelemetryClient>,
}

impl Logger {
	pub fn new(client: Arc<dyn TelemetryClient>) -> Self {
		Self { client }
	}

	pub fn client(&self) -> &Arc<dyn TelemetryClient> {
		&self.client
	}

	pub fn scope(&self) -> &SharedScope {
		self.client.scope()
	}

	/// Log a message at `level` with optional tags and extras.
	pub async fn log(
		&self,
		message: impl Into<String>,
		tags: Option<Tags>,
		extra: Option<Extras>,
		level: Level,
	) -> Result<Option<EventId>> {
		let message = message.into();
		mirror_message(level, &message);

		let mut event = Event::message(level, message);
		event.tags = tags.unwrap_or_default();
		event.extra = extra.unwrap_or_default();
		self.client.capture_event(event).await
	}

	/// Report an error raised by the UI framework.
	pub async fn log_framework_error(
		&self,
		err: &FrameworkError,
		stack: Option<Stacktrace>,
		tags: Option<Tags>,
		extra: Option<Extras>,
	) -> Result<Option<EventId>> {
		let mut extra = extra.unwrap_or_default();
		if let Some(library) = &err.library {
			extra.insert("library".to_string(), library.clone().into());
		}
		self.log_exception(err, stack, tags, Some(extra)).await
	}

	/// Report an error raised by the native platform.
	pub async fn log_platform_error(
		&self,
		err: &PlatformError,
		stack: Option<Stacktrace>,
		tags: Option<Tags>,
		extra: Option<Extras>,
	) -> Result<Option<EventId>> {
		let mut extra = extra.unwrap_or_default();
		if let Some(details) = &err.details {
			extra.insert("details".to_string(), details.clone());
		}
		self.log_exception(err, stack, tags, Some(extra)).await
	}

	/// Report any error as an `error` event.
	///
	/// The error is classified by walking its source chain; classification
	/// tags override caller tags with the same key. Classification happens
	/// before the returned future is polled, so `err` need not be `Sync`.
	pub fn log_exception<E>(
		&self,
		err: &E,
		stack: Option<Stacktrace>,
		tags: Option<Tags>,
		extra: Option<Extras>,
	) -> impl Future<Output = Result<Option<EventId>>> + Send + '_
	where
		E: StdError + 'static,
	{
		let (exception, tags) = prepare_exception(err, Some(short_type_name::<E>()), tags, true);
		self.client.capture_exception(
			exception,
			stack.unwrap_or_default(),
			tags,
			extra.unwrap_or_default(),
		)
	}

	/// Record a breadcrumb. `category` defaults to `app`.
	pub async fn add_breadcrumb(
		&self,
		message: impl Into<String>,
		category: Option<&str>,
		data: Option<Extras>,
		level: Level,
	) {
		let category = category.unwrap_or(DEFAULT_CATEGORY);
		let mut breadcrumb = Breadcrumb::new(category, message).with_level(level);
		breadcrumb.data = data.unwrap_or_default();

		debug!(
			target: "loom_telemetry::logger",
			category = %breadcrumb.category,
			level = %level,
			"breadcrumb: {}",
			breadcrumb.message.as_deref().unwrap_or("")
		);

		self.client.add_breadcrumb(breadcrumb).await;
	}

	/// Identify the current user on all later events.
	pub async fn set_user(
		&self,
		id: impl Into<String>,
		display_name: Option<String>,
		data: Option<Extras>,
	) {
		let user = UserContext {
			display_name,
			data: data.unwrap_or_default(),
			..UserContext::new(id)
		};

		info!(target: "loom_telemetry::logger", user_id = %user.id, "User set");
		self.client
			.configure_scope(Box::new(move |scope| scope.set_user(Some(user))));
	}

	pub async fn clear_user(&self) {
		info!(target: "loom_telemetry::logger", "User cleared");
		self.client
			.configure_scope(Box::new(|scope| scope.set_user(None)));
	}
}

/// Classify `err` and build its exception entry and merged tags.
pub(crate) fn prepare_exception(
	err: &(dyn StdError + 'static),
	type_hint: Option<&str>,
	tags: Option<Tags>,
	handled: bool,
) -> (ExceptionInfo, Tags) {
	let class = classify(err);
	let tags = class.merge_tags(tags);
	let exception =
		describe_error(err, &class, type_hint).with_mechanism(class.mechanism(handled));

	error!(
		target: "loom_telemetry::logger",
		error_type = class.error_type(),
		exception_type = %exception.ty,
		handled,
		"{}",
		exception.value
	);

	(exception, tags)
}

fn mirror_message(level: Level, message: &str) {
	match level {
		Level::Debug => debug!(target: "loom_telemetry::logger", "{message}"),
		Level::Info => info!(target: "loom_telemetry::logger", "{message}"),
		Level::Warning => warn!(target: "loom_telemetry::logger", "{message}"),
		Level::Error | Level::Fatal => {
			error!(target: "loom_telemetry::logger", level = %level, "{message}")
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::{ClientOptions, Hub};
	use crate::transport::MemoryTransport;
	use loom_telemetry_core::classify::{TAG_ERROR_CODE, TAG_ERROR_TYPE};
	use serde_json::json;
	use thiserror::Error;

	#[derive(Debug, Error)]
	#[error("checkout failed")]
	struct CheckoutFailed {
		#[source]
		source: PlatformError,
	}

	#[derive(Debug, Error)]
	#[error("cart is empty")]
	struct EmptyCart;

	fn logger() -> (Logger, MemoryTransport) {
		let transport = MemoryTransport::new();
		let hub = Hub::builder()
			.options(ClientOptions {
				attach_stacktrace: false,
				..Default::default()
			})
			.transport(Arc::new(transport.clone()))
			.build()
			.unwrap();
		(Logger::new(Arc::new(hub)), transport)
	}

	fn tags(pairs: &[(&str, &str)]) -> Tags {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[tokio::test]
	async fn log_builds_message_event() {
		let (logger, transport) = logger();
		let mut extra = Extras::new();
		extra.insert("items".into(), json!(3));

		logger
			.log(
				"cart opened",
				Some(tags(&[("screen", "cart")])),
				Some(extra),
				Level::Info,
			)
			.await
			.unwrap();

		let event = &transport.events()[0];
		assert_eq!(event.level, Level::Info);
		assert_eq!(event.message.as_deref(), Some("cart opened"));
		assert_eq!(event.tags["screen"], "cart");
		assert_eq!(event.extra["items"], json!(3));
	}

	#[tokio::test]
	async fn framework_error_is_tagged() {
		let (logger, transport) = logger();
		let err = FrameworkError {
			library: Some("widgets library".into()),
			..FrameworkError::new("RenderFlex overflowed")
		};

		logger
			.log_framework_error(&err, None, None, None)
			.await
			.unwrap();

		let event = &transport.events()[0];
		assert_eq!(event.level, Level::Error);
		assert_eq!(event.tags[TAG_ERROR_TYPE], "framework");
		assert_eq!(event.extra["library"], json!("widgets library"));
		assert_eq!(event.exceptions[0].ty, "FrameworkError");
	}

	#[tokio::test]
	async fn platform_error_carries_native_mechanism() {
		let (logger, transport) = logger();
		let err = PlatformError {
			details: Some(json!({"retry": false})),
			..PlatformError::new("TEST_ERROR", "Simulated native error")
		};

		logger
			.log_platform_error(&err, None, Some(tags(&[("flow", "demo")])), None)
			.await
			.unwrap();

		let event = &transport.events()[0];
		assert_eq!(event.tags[TAG_ERROR_TYPE], "native");
		assert_eq!(event.tags[TAG_ERROR_CODE], "TEST_ERROR");
		assert_eq!(event.tags["flow"], "demo");
		assert_eq!(event.extra["details"], json!({"retry": false}));
		let mechanism = event.exceptions[0].mechanism.as_ref().unwrap();
		assert!(mechanism.is_native());
	}

	#[tokio::test]
	async fn classification_tags_win_over_caller_tags() {
		let (logger, transport) = logger();

		logger
			.log_exception(
				&EmptyCart,
				None,
				Some(tags(&[(TAG_ERROR_TYPE, "mine"), ("screen", "cart")])),
				None,
			)
			.await
			.unwrap();

		let event = &transport.events()[0];
		assert_eq!(event.tags[TAG_ERROR_TYPE], "generic");
		assert_eq!(event.tags["screen"], "cart");
		assert_eq!(event.exceptions[0].ty, "EmptyCart");
	}

	#[tokio::test]
	async fn wrapped_platform_error_is_found() {
		let (logger, transport) = logger();
		let err = CheckoutFailed {
			source: PlatformError::new("PAYMENT_DECLINED", "card declined"),
		};

		logger.log_exception(&err, None, None, None).await.unwrap();

		let event = &transport.events()[0];
		assert_eq!(event.tags[TAG_ERROR_CODE], "PAYMENT_DECLINED");
		assert_eq!(
			event.exceptions[0].value,
			"checkout failed: PAYMENT_DECLINED: card declined"
		);
	}

	#[tokio::test]
	async fn breadcrumbs_default_category() {
		let (logger, transport) = logger();

		logger
			.add_breadcrumb("opened cart", None, None, Level::Info)
			.await;
		logger
			.add_breadcrumb("tapped pay", Some("ui.tap"), None, Level::Debug)
			.await;
		logger
			.log("checkout", None, None, Level::Error)
			.await
			.unwrap();

		let breadcrumbs = &transport.events()[0].breadcrumbs;
		assert_eq!(breadcrumbs.len(), 2);
		assert_eq!(breadcrumbs[0].category, DEFAULT_CATEGORY);
		assert_eq!(breadcrumbs[1].category, "ui.tap");
		assert_eq!(breadcrumbs[1].level, Level::Debug);
	}

	#[tokio::test]
	async fn set_and_clear_user() {
		let (logger, transport) = logger();
		let mut data = Extras::new();
		data.insert("plan".into(), json!("pro"));

		logger
			.set_user("u-42", Some("Ada".into()), Some(data))
			.await;
		logger
			.log("with user", None, None, Level::Error)
			.await
			.unwrap();
		logger.clear_user().await;
		logger
			.log("without user", None, None, Level::Error)
			.await
			.unwrap();

		let events = transport.events();
		let user = events[0].user.as_ref().unwrap();
		assert_eq!(user.id, "u-42");
		assert_eq!(user.display_name.as_deref(), Some("Ada"));
		assert_eq!(user.data["plan"], json!("pro"));
		assert!(events[1].user.is_none());
	}
}
