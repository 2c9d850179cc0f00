// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Temporary tag and extra overrides around a unit of async work.

use std::future::Future;

use loom_telemetry_core::{Extras, SharedScope, Tags};

/// Run `body` with `tags` and `extras` set on `scope`, restoring afterwards.
///
/// Every overridden key gets its previous value back when `body` finishes,
/// whether it returns `Ok`, returns `Err`, panics, or is cancelled. Keys
/// that did not exist before are removed again. Nothing outside the
/// override set is touched. With both maps `None` the scope is left alone.
///
/// Overlapping calls that override the same key race: whichever restores
/// last wins. Callers that need isolation must not nest overrides of the
/// same key across concurrent tasks.
pub async fn with_scoped_context<F, Fut, T, E>(
	scope: &SharedScope,
	tags: Option<Tags>,
	extras: Option<Extras>,
	body: F,
) -> Result<T, E>
where
	F: FnOnce() -> Fut,
	Fut: Future<Output = Result<T, E>>,
{
	if tags.is_none() && extras.is_none() {
		return body().await;
	}

	let _guard = scope.push_overrides(tags, extras);
	body().await
}
