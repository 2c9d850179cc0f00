// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `before_send` / `before_breadcrumb` pipeline.
//!
//! Every event passes through, in order:
//!
//! 1. admission ([`should_capture`]) by flavor and level
//! 2. noise suppression ([`is_noise`]) on the first exception's message
//! 3. local rendering and/or forwarding, per [`FilterPolicy`]
//! 4. enrichment ([`add_tags`]) of the forwarded copy
//!
//! A drop at any step is final and silent.

use crate::breadcrumb::Breadcrumb;
use crate::classify::TAG_ERROR_TYPE;
use crate::diagnostic::render_diagnostic;
use crate::event::Event;
use crate::flavor::Flavor;
use crate::level::Level;
use crate::scope::Tags;

/// Exception messages matching these (case-insensitive) are never reported.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &["timeoutexception", "httpexception"];

pub const UI_CLICK_CATEGORY: &str = "ui.click";
pub const TAG_PLATFORM: &str = "platform";
pub const TAG_ERROR_LOCATION: &str = "error_location";

/// `error_type` assigned by enrichment to anything not from the native side.
pub const RUNTIME_ERROR_TYPE: &str = "runtime";
const UNKNOWN_PLATFORM: &str = "unknown";

/// What the pipeline does with an admitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
	pub flavor: Flavor,
	/// Render the event to the local console.
	pub print_locally: bool,
	/// Hand the enriched event to the transport.
	pub forward: bool,
	pub noise_patterns: Vec<String>,
}

impl FilterPolicy {
	/// Console only outside production, forward only in production.
	pub fn for_flavor(flavor: Flavor) -> Self {
		Self {
			flavor,
			print_locally: !flavor.is_production(),
			forward: flavor.is_production(),
			noise_patterns: DEFAULT_NOISE_PATTERNS
				.iter()
				.map(|p| p.to_string())
				.collect(),
		}
	}

	/// Also print in production.
	pub fn verbose(mut self, verbose: bool) -> Self {
		if verbose {
			self.print_locally = true;
		}
		self
	}

	/// Also forward from development and qa.
	pub fn forward_non_production(mut self, forward: bool) -> Self {
		if forward {
			self.forward = true;
		}
		self
	}

	pub fn noise_patterns(mut self, patterns: Vec<String>) -> Self {
		self.noise_patterns = patterns;
		self
	}
}

impl Default for FilterPolicy {
	fn default() -> Self {
		Self::for_flavor(Flavor::default())
	}
}

/// Result of an admitted event.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
	/// Console block to print, if printing is on.
	pub diagnostic: Option<String>,
	/// Enriched event to forward, if forwarding is on.
	pub forward: Option<Event>,
}

/// Admission decision. Depends only on the event level and the flavor.
pub fn should_capture(event: &Event, flavor: Flavor) -> bool {
	match flavor {
		Flavor::Development | Flavor::Qa => true,
		Flavor::Production => event.level >= Level::Warning,
	}
}

/// Whether the first exception's message matches a noise pattern.
pub fn is_noise<S: AsRef<str>>(event: &Event, patterns: &[S]) -> bool {
	let Some(exc) = event.first_exception() else {
		return false;
	};
	let message = exc.value.to_lowercase();
	patterns
		.iter()
		.map(|p| p.as_ref().to_lowercase())
		.any(|p| !p.is_empty() && message.contains(&p))
}

/// New event with `error_type`, `platform` and, for non-native errors,
/// `error_location` layered over the existing tags.
pub fn add_tags(event: &Event) -> Event {
	let is_native = event
		.exceptions
		.iter()
		.any(|exc| exc.mechanism.as_ref().is_some_and(|m| m.is_native()));

	let mut tags = Tags::new();
	tags.insert(
		TAG_ERROR_TYPE.to_string(),
		if is_native {
			crate::event::NATIVE_MECHANISM
		} else {
			RUNTIME_ERROR_TYPE
		}
		.to_string(),
	);
	tags.insert(
		TAG_PLATFORM.to_string(),
		event
			.platform
			.as_deref()
			.map(str::to_lowercase)
			.unwrap_or_else(|| UNKNOWN_PLATFORM.to_string()),
	);

	if !is_native {
		if let Some(frame) = event.first_exception().and_then(|exc| exc.first_frame()) {
			tags.insert(
				TAG_ERROR_LOCATION.to_string(),
				format!(
					"{}:{}",
					frame.module.as_deref().unwrap_or(UNKNOWN_PLATFORM),
					frame.function.as_deref().unwrap_or(UNKNOWN_PLATFORM)
				),
			);
		}
	}

	event.copy_with_tags(tags)
}

/// Run the full pipeline. `None` means the event is dropped.
pub fn before_send(event: Event, policy: &FilterPolicy) -> Option<FilterOutcome> {
	if !should_capture(&event, policy.flavor) {
		return None;
	}
	if is_noise(&event, &policy.noise_patterns) {
		return None;
	}

	let diagnostic = policy.print_locally.then(|| render_diagnostic(&event));
	let forward = policy.forward.then(|| add_tags(&event));

	Some(FilterOutcome {
		diagnostic,
		forward,
	})
}

/// Drop debug-level UI click breadcrumbs; pass everything else through.
pub fn before_breadcrumb(breadcrumb: Breadcrumb) -> Option<Breadcrumb> {
	if breadcrumb.category == UI_CLICK_CATEGORY && breadcrumb.level == Level::Debug {
		return None;
	}
	Some(breadcrumb)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::event::{ExceptionInfo, Frame, Mechanism, Stacktrace};
	use proptest::prelude::*;

	fn exception_event(message: &str) -> Event {
		Event::exception(ExceptionInfo::new("Exception", message))
	}

	fn arb_level() -> impl Strategy<Value = Level> {
		(0usize..5).prop_map(|i| Level::ALL[i])
	}

	fn arb_flavor() -> impl Strategy<Value = Flavor> {
		prop_oneof![
			Just(Flavor::Development),
			Just(Flavor::Qa),
			Just(Flavor::Production),
		]
	}

	#[test]
	fn production_threshold() {
		for level in Level::ALL {
			let event = Event::message(level, "m");
			let admitted = should_capture(&event, Flavor::Production);
			assert_eq!(admitted, level >= Level::Warning, "level {level}");
		}
	}

	#[test]
	fn non_production_admits_everything() {
		for level in Level::ALL {
			let event = Event::message(level, "m");
			assert!(should_capture(&event, Flavor::Development));
			assert!(should_capture(&event, Flavor::Qa));
		}
	}

	#[test]
	fn noise_is_case_insensitive() {
		let event = exception_event("Connection TimeoutException occurred");
		assert!(is_noise(&event, DEFAULT_NOISE_PATTERNS));
		let event = exception_event("HTTPEXCEPTION: 502");
		assert!(is_noise(&event, DEFAULT_NOISE_PATTERNS));
		let event = exception_event("StateError");
		assert!(!is_noise(&event, DEFAULT_NOISE_PATTERNS));
	}

	#[test]
	fn noise_only_checks_first_exception() {
		let mut event = exception_event("fine");
		event
			.exceptions
			.push(ExceptionInfo::new("Exception", "TimeoutException"));
		assert!(!is_noise(&event, DEFAULT_NOISE_PATTERNS));
		assert!(!is_noise(
			&Event::message(Level::Error, "TimeoutException"),
			DEFAULT_NOISE_PATTERNS
		));
	}

	#[test]
	fn noise_dropped_in_every_flavor() {
		for flavor in [Flavor::Development, Flavor::Qa, Flavor::Production] {
			let event = exception_event("Connection TimeoutException occurred");
			assert!(before_send(event, &FilterPolicy::for_flavor(flavor)).is_none());
		}
	}

	#[test]
	fn development_prints_without_forwarding() {
		let event = Event::message(Level::Info, "This is a general log message");
		let outcome = before_send(event, &FilterPolicy::for_flavor(Flavor::Development)).unwrap();

		let diagnostic = outcome.diagnostic.unwrap();
		assert!(diagnostic.contains("ℹ️ [INFO] This is a general log message"));
		assert!(outcome.forward.is_none());
	}

	#[test]
	fn production_forwards_without_printing() {
		let mut event = Event::message(Level::Error, "boom");
		event.platform = Some("Linux".into());
		let outcome = before_send(event, &FilterPolicy::for_flavor(Flavor::Production)).unwrap();

		assert!(outcome.diagnostic.is_none());
		let forwarded = outcome.forward.unwrap();
		assert_eq!(forwarded.tags[TAG_PLATFORM], "linux");
		assert_eq!(forwarded.tags[TAG_ERROR_TYPE], RUNTIME_ERROR_TYPE);
	}

	#[test]
	fn production_drops_info_before_anything_else() {
		let event = Event::message(Level::Info, "hello");
		assert!(before_send(event, &FilterPolicy::for_flavor(Flavor::Production)).is_none());
	}

	#[test]
	fn toggles_are_independent() {
		let policy = FilterPolicy::for_flavor(Flavor::Production).verbose(true);
		let outcome = before_send(Event::message(Level::Error, "x"), &policy).unwrap();
		assert!(outcome.diagnostic.is_some());
		assert!(outcome.forward.is_some());

		let policy = FilterPolicy::for_flavor(Flavor::Qa).forward_non_production(true);
		let outcome = before_send(Event::message(Level::Debug, "x"), &policy).unwrap();
		assert!(outcome.diagnostic.is_some());
		assert!(outcome.forward.is_some());
	}

	#[test]
	fn custom_noise_patterns_replace_defaults() {
		let policy =
			FilterPolicy::for_flavor(Flavor::Qa).noise_patterns(vec!["SocketException".into()]);
		assert!(before_send(exception_event("SocketException: reset"), &policy).is_none());
		assert!(before_send(exception_event("TimeoutException"), &policy).is_some());
	}

	#[test]
	fn native_enrichment_skips_location() {
		let exc = ExceptionInfo::new("PlatformError", "TEST_ERROR: failed")
			.with_mechanism(Mechanism::new("native", true))
			.with_stacktrace(Stacktrace {
				frames: vec![Frame {
					function: Some("invoke".into()),
					module: Some("bridge".into()),
					..Default::default()
				}],
			});
		let mut event = Event::exception(exc);
		event.platform = Some("Android".into());

		let enriched = add_tags(&event);
		assert_eq!(enriched.tags[TAG_ERROR_TYPE], "native");
		assert_eq!(enriched.tags[TAG_PLATFORM], "android");
		assert!(!enriched.tags.contains_key(TAG_ERROR_LOCATION));
	}

	#[test]
	fn runtime_enrichment_sets_location() {
		let exc = ExceptionInfo::new("StateError", "bad").with_stacktrace(Stacktrace {
			frames: vec![Frame {
				function: Some("submit".into()),
				module: Some("checkout".into()),
				..Default::default()
			}],
		});
		let enriched = add_tags(&Event::exception(exc));
		assert_eq!(enriched.tags[TAG_ERROR_LOCATION], "checkout:submit");
		assert_eq!(enriched.tags[TAG_PLATFORM], "unknown");
	}

	#[test]
	fn enrichment_does_not_touch_input() {
		let mut event = Event::message(Level::Error, "x");
		event.tags.insert("error_type".into(), "framework".into());
		let before = event.tags.clone();

		let enriched = add_tags(&event);

		assert_eq!(event.tags, before);
		assert_ne!(enriched.tags, before);
	}

	#[test]
	fn breadcrumb_filter() {
		let click = |level| Breadcrumb::new(UI_CLICK_CATEGORY, "tap").with_level(level);
		assert!(before_breadcrumb(click(Level::Debug)).is_none());
		assert!(before_breadcrumb(click(Level::Info)).is_some());
		assert!(before_breadcrumb(Breadcrumb::new("navigation", "x").with_level(Level::Debug)).is_some());
	}

	proptest! {
		#[test]
		fn admission_is_pure(level in arb_level(), flavor in arb_flavor()) {
			let event = Event::message(level, "m");
			prop_assert_eq!(should_capture(&event, flavor), should_capture(&event, flavor));
		}

		#[test]
		fn non_click_breadcrumbs_always_kept(category in "[a-z.]{1,12}", level in arb_level()) {
			prop_assume!(category != UI_CLICK_CATEGORY);
			let crumb = Breadcrumb::new(category, "m").with_level(level);
			prop_assert_eq!(before_breadcrumb(crumb.clone()), Some(crumb));
		}
	}
}
