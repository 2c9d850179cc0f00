// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Telemetry client: scope, breadcrumbs, hooks and hand-off to a transport.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use async_trait::async_trait;
use loom_telemetry_core::{
	Breadcrumb, Event, EventId, ExceptionInfo, Extras, Flavor, Level, Scope, SharedScope,
	Stacktrace, Tags,
};
use tracing::{debug, info};

use crate::backtrace::capture_backtrace;
use crate::error::{Result, TelemetrySdkError};
use crate::transport::{SharedTransport, TracingTransport};

/// Maximum number of breadcrumbs to keep.
pub const MAX_BREADCRUMBS: usize = 100;

/// Hook run on every event before it is handed to the transport.
pub type BeforeSend = Arc<dyn Fn(Event) -> Option<Event> + Send + Sync>;

/// Hook run on every breadcrumb before it is recorded.
pub type BeforeBreadcrumb = Arc<dyn Fn(Breadcrumb) -> Option<Breadcrumb> + Send + Sync>;

/// Startup options for the client.
#[derive(Clone)]
pub struct ClientOptions {
	pub dsn: Option<String>,
	pub release: Option<String>,
	pub environment: Flavor,
	/// Platform reported on events, e.g. "android", "ios", "linux".
	pub platform: String,
	/// Keep user email and IP address on outgoing events.
	pub send_default_pii: bool,
	/// Log every client decision at `info` instead of `debug`.
	pub debug: bool,
	/// Capture a stack for exceptions that arrive without one.
	pub attach_stacktrace: bool,
	/// Record the capturing thread's name in the event extras.
	pub attach_threads: bool,
	pub traces_sample_rate: f64,
	pub max_breadcrumbs: usize,
	pub before_send: Option<BeforeSend>,
	pub before_breadcrumb: Option<BeforeBreadcrumb>,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			dsn: None,
			release: None,
			environment: Flavor::default(),
			platform: std::env::consts::OS.to_string(),
			send_default_pii: false,
			debug: false,
			attach_stacktrace: true,
			attach_threads: false,
			traces_sample_rate: 0.0,
			max_breadcrumbs: MAX_BREADCRUMBS,
			before_send: None,
			before_breadcrumb: None,
		}
	}
}

impl fmt::Debug for ClientOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClientOptions")
			.field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
			.field("release", &self.release)
			.field("environment", &self.environment)
			.field("platform", &self.platform)
			.field("send_default_pii", &self.send_default_pii)
			.field("debug", &self.debug)
			.field("attach_stacktrace", &self.attach_stacktrace)
			.field("attach_threads", &self.attach_threads)
			.field("traces_sample_rate", &self.traces_sample_rate)
			.field("max_breadcrumbs", &self.max_breadcrumbs)
			.field("before_send", &self.before_send.is_some())
			.field("before_breadcrumb", &self.before_breadcrumb.is_some())
			.finish()
	}
}

/// Parts of a DSN: `<scheme>://<public_key>@<host>/<project_id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
	pub scheme: String,
	pub public_key: String,
	pub host: String,
	pub project_id: String,
}

impl std::str::FromStr for Dsn {
	type Err = TelemetrySdkError;

	fn from_str(s: &str) -> Result<Self> {
		let invalid = |reason: &str| TelemetrySdkError::InvalidDsn {
			dsn: s.to_string(),
			reason: reason.to_string(),
		};

		let (scheme, rest) = s.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
		if scheme != "http" && scheme != "https" {
			return Err(invalid("scheme must be http or https"));
		}
		let (public_key, rest) = rest
			.split_once('@')
			.ok_or_else(|| invalid("missing public key"))?;
		if public_key.is_empty() {
			return Err(invalid("missing public key"));
		}
		let (host, project_id) = rest
			.rsplit_once('/')
			.ok_or_else(|| invalid("missing project id"))?;
		if host.is_empty() {
			return Err(invalid("missing host"));
		}
		if project_id.is_empty() || !project_id.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(invalid("project id must be alphanumeric"));
		}

		Ok(Self {
			scheme: scheme.to_string(),
			public_key: public_key.to_string(),
			host: host.to_string(),
			project_id: project_id.to_string(),
		})
	}
}

/// The external telemetry client as seen by the logging facade.
#[async_trait]
pub trait TelemetryClient: Send + Sync + 'static {
	/// Scope attached to every captured event.
	fn scope(&self) -> &SharedScope;

	/// Options the client was started with.
	fn options(&self) -> &ClientOptions;

	/// Mutate the scope under its lock.
	fn configure_scope(&self, mutate: Box<dyn FnOnce(&mut Scope) + Send + '_>) {
		self.scope().with_lock(mutate)
	}

	/// Capture an event. `Ok(None)` means a hook dropped it.
	async fn capture_event(&self, event: Event) -> Result<Option<EventId>>;

	/// Capture one exception as an `error` event.
	async fn capture_exception(
		&self,
		exception: ExceptionInfo,
		stacktrace: Stacktrace,
		tags: Tags,
		extra: Extras,
	) -> Result<Option<EventId>>;

	/// Record a breadcrumb for future events.
	async fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

	/// Capture without awaiting.
	fn capture_event_sync(&self, event: Event) -> Result<Option<EventId>>;

	/// Capture from inside a panic hook.
	///
	/// The panicking thread may still hold the scope or breadcrumb lock, so
	/// those are only tried; whatever is held is left off the event.
	fn capture_panic_event(&self, event: Event) -> Result<Option<EventId>>;
}

/// How [`Hub`] reaches the scope and breadcrumb locks while preparing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
	Wait,
	Try,
}

/// Builder for constructing a [`Hub`].
pub struct HubBuilder {
	options: ClientOptions,
	scope: Option<SharedScope>,
	transport: Option<SharedTransport>,
}

impl HubBuilder {
	pub fn new() -> Self {
		Self {
			options: ClientOptions::default(),
			scope: None,
			transport: None,
		}
	}

	pub fn options(mut self, options: ClientOptions) -> Self {
		self.options = options;
		self
	}

	/// Use an existing scope instead of a fresh one.
	pub fn scope(mut self, scope: SharedScope) -> Self {
		self.scope = Some(scope);
		self
	}

	pub fn transport(mut self, transport: SharedTransport) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Validates the options and builds the hub.
	pub fn build(self) -> Result<Hub> {
		if let Some(dsn) = &self.options.dsn {
			dsn.parse::<Dsn>()?;
		}
		let rate = self.options.traces_sample_rate;
		if !(0.0..=1.0).contains(&rate) {
			return Err(TelemetrySdkError::InvalidOption {
				option: "traces_sample_rate",
				message: format!("{rate} is outside 0.0..=1.0"),
			});
		}

		let transport = self
			.transport
			.unwrap_or_else(|| Arc::new(TracingTransport));

		info!(
			environment = %self.options.environment,
			platform = %self.options.platform,
			transport = transport.name(),
			"Telemetry client initialized"
		);

		Ok(Hub {
			inner: Arc::new(HubInner {
				options: self.options,
				scope: self.scope.unwrap_or_default(),
				breadcrumbs: Mutex::new(VecDeque::new()),
				transport,
				closed: AtomicBool::new(false),
			}),
		})
	}
}

impl Default for HubBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct HubInner {
	options: ClientOptions,
	scope: SharedScope,
	breadcrumbs: Mutex<VecDeque<Breadcrumb>>,
	transport: SharedTransport,
	closed: AtomicBool,
}

/// In-process telemetry client.
///
/// Fills events from the scope and breadcrumb trail, runs the hooks, and
/// hands survivors to the transport.
///
/// # Example
///
/// ```ignore
/// let hub = Hub::builder()
///     .options(ClientOptions {
///         environment: Flavor::Production,
///         before_send: Some(Arc::new(|event| Some(event))),
///         ..Default::default()
///     })
///     .transport(Arc::new(TracingTransport))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct Hub {
	inner: Arc<HubInner>,
}

impl Hub {
	pub fn builder() -> HubBuilder {
		HubBuilder::new()
	}

	/// Snapshot of the breadcrumb trail, oldest first.
	pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
		self.inner
			.breadcrumbs
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.iter()
			.cloned()
			.collect()
	}

	/// Stops accepting events. Calling it twice is fine.
	pub fn shutdown(&self) {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		info!("Telemetry client shutdown");
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}

	fn check_closed(&self) -> Result<()> {
		if self.is_closed() {
			return Err(TelemetrySdkError::ClientShutdown);
		}
		Ok(())
	}

	fn prepare(&self, mut event: Event, mode: LockMode) -> Event {
		let options = &self.inner.options;

		if event.environment.is_none() {
			event.environment = Some(options.environment.to_string());
		}
		if event.release.is_none() {
			event.release = options.release.clone();
		}
		if event.platform.is_none() {
			event.platform = Some(options.platform.clone());
		}

		let apply = |scope: &mut Scope| scope.apply_to_event(&mut event);
		match mode {
			LockMode::Wait => self.inner.scope.with_lock(apply),
			LockMode::Try => {
				if self.inner.scope.try_with_lock(apply).is_none() {
					debug!("Scope lock held, capturing without scope");
				}
			}
		}

		if !options.send_default_pii {
			event.user = event.user.map(|user| user.without_pii());
		}
		if options.attach_threads {
			let thread = std::thread::current();
			event.extra.insert(
				"thread".to_string(),
				serde_json::Value::String(thread.name().unwrap_or("unnamed").to_string()),
			);
		}

		event.breadcrumbs = match mode {
			LockMode::Wait => self.breadcrumbs(),
			LockMode::Try => match self.inner.breadcrumbs.try_lock() {
				Ok(trail) => trail.iter().cloned().collect(),
				Err(TryLockError::Poisoned(poisoned)) => {
					poisoned.into_inner().iter().cloned().collect()
				}
				Err(TryLockError::WouldBlock) => Vec::new(),
			},
		};
		event
	}

	fn dispatch(&self, event: Event, mode: LockMode) -> Result<Option<EventId>> {
		self.check_closed()?;

		let event = self.prepare(event, mode);
		let event_id = event.event_id;
		let level = event.level;

		let event = match &self.inner.options.before_send {
			Some(hook) => hook(event),
			None => Some(event),
		};

		let Some(event) = event else {
			self.trace_decision(event_id, level, "dropped by before_send");
			return Ok(None);
		};

		self.inner.transport.send(event);
		self.trace_decision(event_id, level, "handed to transport");
		Ok(Some(event_id))
	}

	fn trace_decision(&self, event_id: EventId, level: Level, decision: &str) {
		if self.inner.options.debug {
			info!(event_id = %event_id, level = %level, decision, "Telemetry event processed");
		} else {
			debug!(event_id = %event_id, level = %level, decision, "Telemetry event processed");
		}
	}
}

#[async_trait]
impl TelemetryClient for Hub {
	fn scope(&self) -> &SharedScope {
		&self.inner.scope
	}

	fn options(&self) -> &ClientOptions {
		&self.inner.options
	}

	async fn capture_event(&self, event: Event) -> Result<Option<EventId>> {
		self.dispatch(event, LockMode::Wait)
	}

	async fn capture_exception(
		&self,
		exception: ExceptionInfo,
		stacktrace: Stacktrace,
		tags: Tags,
		extra: Extras,
	) -> Result<Option<EventId>> {
		let stacktrace = if stacktrace.is_empty() && self.inner.options.attach_stacktrace {
			capture_backtrace()
		} else {
			stacktrace
		};

		let mut event = Event::exception(exception.with_stacktrace(stacktrace));
		event.tags = tags;
		event.extra = extra;
		self.dispatch(event, LockMode::Wait)
	}

	async fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
		let breadcrumb = match &self.inner.options.before_breadcrumb {
			Some(hook) => hook(breadcrumb),
			None => Some(breadcrumb),
		};
		let Some(breadcrumb) = breadcrumb else {
			return;
		};

		let mut breadcrumbs = self
			.inner
			.breadcrumbs
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		breadcrumbs.push_back(breadcrumb);
		while breadcrumbs.len() > self.inner.options.max_breadcrumbs {
			breadcrumbs.pop_front();
		}
	}

	fn capture_event_sync(&self, event: Event) -> Result<Option<EventId>> {
		self.dispatch(event, LockMode::Wait)
	}

	fn capture_panic_event(&self, event: Event) -> Result<Option<EventId>> {
		self.dispatch(event, LockMode::Try)
	}
}
