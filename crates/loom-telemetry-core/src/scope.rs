// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared observability scope and the temporary-override guard.
//!
//! The scope is process-wide state, but it is never reached implicitly: callers
//! hold a [`SharedScope`] and go through [`SharedScope::with_lock`]. The lock
//! is a plain mutex that is never held across an `.await`, which is what lets
//! [`ScopeGuard`] restore overrides from `Drop`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use serde::{Deserialize, Serialize};

use crate::context::UserContext;
use crate::event::Event;

/// Tag mapping. Ordered so diagnostics and tests are deterministic.
pub type Tags = BTreeMap<String, String>;

/// Extra mapping.
pub type Extras = serde_json::Map<String, serde_json::Value>;

/// Contextual state attached to every event captured while it is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
	pub tags: Tags,
	pub extra: Extras,
	pub user: Option<UserContext>,
}

impl Scope {
	pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.tags.insert(key.into(), value.into());
	}

	pub fn remove_tag(&mut self, key: &str) -> Option<String> {
		self.tags.remove(key)
	}

	pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) {
		self.extra.insert(key.into(), value);
	}

	pub fn remove_extra(&mut self, key: &str) -> Option<serde_json::Value> {
		self.extra.remove(key)
	}

	pub fn set_user(&mut self, user: Option<UserContext>) {
		self.user = user;
	}

	/// Fill `event` from the scope. Values already on the event win.
	pub fn apply_to_event(&self, event: &mut Event) {
		for (key, value) in &self.tags {
			event
				.tags
				.entry(key.clone())
				.or_insert_with(|| value.clone());
		}
		for (key, value) in &self.extra {
			event
				.extra
				.entry(key.clone())
				.or_insert_with(|| value.clone());
		}
		if event.user.is_none() {
			event.user = self.user.clone();
		}
	}
}

/// Handle to the process-wide scope.
#[derive(Debug, Clone, Default)]
pub struct SharedScope {
	inner: Arc<Mutex<Scope>>,
}

impl SharedScope {
	pub fn new() -> Self {
		Self::default()
	}

	/// Run `f` with exclusive access to the scope.
	///
	/// A poisoned lock is recovered: the scope holds plain maps, so a panic
	/// mid-mutation cannot leave it structurally broken.
	pub fn with_lock<R>(&self, f: impl FnOnce(&mut Scope) -> R) -> R {
		let mut scope = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
		f(&mut scope)
	}

	/// Like [`with_lock`](Self::with_lock), but gives up instead of waiting.
	///
	/// Returns `None` when the lock is held, including by the calling thread.
	/// Panic hooks use this: they run before unwinding releases the lock.
	pub fn try_with_lock<R>(&self, f: impl FnOnce(&mut Scope) -> R) -> Option<R> {
		let mut scope = match self.inner.try_lock() {
			Ok(scope) => scope,
			Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
			Err(TryLockError::WouldBlock) => return None,
		};
		Some(f(&mut scope))
	}

	/// Copy of the current scope.
	pub fn snapshot(&self) -> Scope {
		self.with_lock(|scope| scope.clone())
	}

	/// Copy of the current scope, or `None` if the lock is held.
	pub fn try_snapshot(&self) -> Option<Scope> {
		self.try_with_lock(|scope| scope.clone())
	}

	/// Apply `tags` and `extras` and return a guard that puts the previous
	/// values back when dropped.
	pub fn push_overrides(&self, tags: Option<Tags>, extras: Option<Extras>) -> ScopeGuard {
		let (prior_tags, prior_extra) = self.with_lock(|scope| {
			let prior_tags: Vec<_> = tags
				.into_iter()
				.flatten()
				.map(|(key, value)| {
					let prior = scope.tags.insert(key.clone(), value);
					(key, prior)
				})
				.collect();
			let prior_extra: Vec<_> = extras
				.into_iter()
				.flatten()
				.map(|(key, value)| {
					let prior = scope.extra.insert(key.clone(), value);
					(key, prior)
				})
				.collect();
			(prior_tags, prior_extra)
		});

		ScopeGuard {
			scope: self.clone(),
			prior_tags,
			prior_extra,
		}
	}
}

/// Restores overridden scope keys when dropped.
///
/// Each key goes back to its prior value, or is removed if it had none.
#[must_use = "overrides are restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ScopeGuard {
	scope: SharedScope,
	prior_tags: Vec<(String, Option<String>)>,
	prior_extra: Vec<(String, Option<serde_json::Value>)>,
}

impl Drop for ScopeGuard {
	fn drop(&mut self) {
		let prior_tags = std::mem::take(&mut self.prior_tags);
		let prior_extra = std::mem::take(&mut self.prior_extra);
		self.scope.with_lock(|scope| {
			for (key, prior) in prior_tags {
				match prior {
					Some(value) => scope.set_tag(key, value),
					None => {
						scope.remove_tag(&key);
					}
				}
			}
			for (key, prior) in prior_extra {
				match prior {
					Some(value) => scope.set_extra(key, value),
					None => {
						scope.remove_extra(&key);
					}
				}
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	fn tags(pairs: &[(&str, &str)]) -> Tags {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn guard_restores_prior_and_removes_new() {
		let scope = SharedScope::new();
		scope.with_lock(|s| s.set_tag("screen", "home"));

		{
			let _guard = scope.push_overrides(
				Some(tags(&[("screen", "checkout"), ("flow", "purchase")])),
				None,
			);
			let snap = scope.snapshot();
			assert_eq!(snap.tags["screen"], "checkout");
			assert_eq!(snap.tags["flow"], "purchase");
		}

		let snap = scope.snapshot();
		assert_eq!(snap.tags["screen"], "home");
		assert!(!snap.tags.contains_key("flow"));
	}

	#[test]
	fn empty_string_is_distinct_from_absent() {
		let scope = SharedScope::new();
		scope.with_lock(|s| s.set_tag("k", ""));

		drop(scope.push_overrides(Some(tags(&[("k", "v")])), None));

		assert_eq!(scope.snapshot().tags.get("k").map(String::as_str), Some(""));
	}

	#[test]
	fn null_extra_is_distinct_from_absent() {
		let scope = SharedScope::new();
		scope.with_lock(|s| s.set_extra("nullable", serde_json::Value::Null));

		let mut extras = Extras::new();
		extras.insert("nullable".into(), json!(1));
		extras.insert("fresh".into(), json!({"a": 1}));
		drop(scope.push_overrides(None, Some(extras)));

		let snap = scope.snapshot();
		assert_eq!(snap.extra.get("nullable"), Some(&serde_json::Value::Null));
		assert!(!snap.extra.contains_key("fresh"));
	}

	#[test]
	fn untouched_keys_survive() {
		let scope = SharedScope::new();
		scope.with_lock(|s| {
			s.set_tag("a", "1");
			s.set_tag("b", "2");
		});

		{
			let _guard = scope.push_overrides(Some(tags(&[("a", "x")])), None);
			scope.with_lock(|s| s.set_tag("b", "changed-inside"));
		}

		let snap = scope.snapshot();
		assert_eq!(snap.tags["a"], "1");
		assert_eq!(snap.tags["b"], "changed-inside");
	}

	#[test]
	fn guard_restores_after_panic() {
		let scope = SharedScope::new();
		let inner = scope.clone();
		let result = std::panic::catch_unwind(move || {
			let _guard = inner.push_overrides(Some(tags(&[("k", "v")])), None);
			panic!("boom");
		});
		assert!(result.is_err());
		assert!(scope.snapshot().tags.is_empty());
	}

	#[test]
	fn apply_to_event_keeps_event_values() {
		let scope = SharedScope::new();
		scope.with_lock(|s| {
			s.set_tag("screen", "home");
			s.set_tag("build", "42");
			s.set_user(Some(UserContext::new("u1")));
		});

		let mut event = Event::default();
		event.tags.insert("screen".into(), "settings".into());
		scope.with_lock(|s| s.apply_to_event(&mut event));

		assert_eq!(event.tags["screen"], "settings");
		assert_eq!(event.tags["build"], "42");
		assert_eq!(event.user.map(|u| u.id), Some("u1".to_string()));
	}

	#[test]
	fn try_with_lock_gives_up_while_held() {
		let scope = SharedScope::new();
		scope.with_lock(|s| {
			s.set_tag("k", "v");
			assert!(scope.try_snapshot().is_none());
		});
		assert_eq!(scope.try_snapshot().unwrap().tags["k"], "v");
	}

	#[test]
	fn try_with_lock_recovers_poisoned_lock() {
		let scope = SharedScope::new();
		let inner = scope.clone();
		let result = std::panic::catch_unwind(move || {
			inner.with_lock(|s| {
				s.set_tag("k", "v");
				panic!("mutator panicked");
			})
		});
		assert!(result.is_err());

		let tags = scope.try_with_lock(|s| s.tags.clone()).unwrap();
		assert_eq!(tags["k"], "v");
	}

	fn arb_tags() -> impl Strategy<Value = Tags> {
		prop::collection::btree_map("[a-d]", "[a-z]{0,3}", 0..4)
	}

	proptest! {
		#[test]
		fn overrides_always_restore(initial in arb_tags(), overrides in arb_tags()) {
			let scope = SharedScope::new();
			scope.with_lock(|s| s.tags = initial.clone());

			drop(scope.push_overrides(Some(overrides), None));

			prop_assert_eq!(scope.snapshot().tags, initial);
		}
	}
}
