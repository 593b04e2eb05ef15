//! The hash watcher: tracks the current fragment and dispatches on change.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{ReentrantMutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::location::{FragmentSource, normalize};
use super::matcher::Matcher;
use super::registry::{Callback, DispatchReport, Handler, HandlerRegistry};

/// Poll period used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest poll period; tokio's `interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Watches a [`FragmentSource`] and dispatches registered handlers whenever
/// the normalized fragment changes.
///
/// This is an explicit context object: create one per router, register
/// handlers with [`on`](Self::on), then drive it with [`poll`](Self::poll)
/// or [`start`](Self::start). Clones share the same state.
///
/// ```
/// use hashnav::router::{HashWatcher, MemoryLocation, action_that, is_equal_to};
///
/// let location = MemoryLocation::new("");
/// let watcher = HashWatcher::create(location.clone());
///
/// watcher.on(action_that(is_equal_to("about"))).then(|| println!("about"));
///
/// location.set("#about");
/// let report = watcher.poll().expect("fragment changed");
/// assert_eq!(report.invoked_count(), 1);
/// assert_eq!(watcher.current(), "about");
/// ```
#[derive(Clone)]
pub struct HashWatcher {
    inner: Arc<Inner>,
}

struct Inner {
    source: Box<dyn FragmentSource>,
    /// Last observed, normalized fragment.
    hash: RwLock<String>,
    registry: RwLock<HandlerRegistry>,
    /// Serializes ticks across threads; reentrant so a callback may poll.
    tick: ReentrantMutex<()>,
}

impl HashWatcher {
    /// Create a watcher, seeding the current value from `source`.
    ///
    /// No dispatch happens here; only later changes trigger handlers. A
    /// source that cannot be read seeds the empty fragment.
    pub fn create(source: impl FragmentSource + 'static) -> Self {
        let seed = match source.read() {
            Ok(raw) => normalize(&raw),
            Err(e) => {
                tracing::warn!("[router] cannot seed from {} source: {e}", source.name());
                String::new()
            }
        };

        crate::debug_event!("router", "seeded", "'{seed}' from {}", source.name());

        Self {
            inner: Arc::new(Inner {
                source: Box::new(source),
                hash: RwLock::new(seed),
                registry: RwLock::new(HandlerRegistry::new()),
                tick: ReentrantMutex::new(()),
            }),
        }
    }

    /// Begin registering a handler: `watcher.on(matcher).then(callback)`.
    pub fn on(&self, matcher: Matcher) -> Registration<'_> {
        Registration {
            watcher: self,
            matcher,
        }
    }

    /// Register a matcher and an infallible callback in one call.
    pub fn register<F>(&self, matcher: Matcher, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on(matcher).then(callback);
    }

    fn push(&self, matcher: Matcher, callback: Callback) {
        let mut registry = self.inner.registry.write();
        registry.push(Handler::new(matcher, callback));
        crate::debug_event!("router", "registered", "handler #{}", registry.len() - 1);
    }

    /// The last observed fragment value.
    pub fn current(&self) -> String {
        self.inner.hash.read().clone()
    }

    pub fn handler_count(&self) -> usize {
        self.inner.registry.read().len()
    }

    /// Run one tick: read the source and dispatch if the value changed.
    ///
    /// Returns the dispatch report, or `None` when the value is unchanged
    /// or the source could not be read. Handlers see a snapshot of the
    /// registry taken at the start of the dispatch; handlers registered
    /// from inside a callback first run on the next change.
    pub fn poll(&self) -> Option<DispatchReport> {
        let _tick = self.inner.tick.lock();

        let raw = match self.inner.source.read() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("[router] skipping tick: {e}");
                return None;
            }
        };
        let value = normalize(&raw);

        let snapshot = {
            let mut hash = self.inner.hash.write();
            if *hash == value {
                tracing::trace!("[router] fragment unchanged");
                return None;
            }
            *hash = value.clone();
            self.inner.registry.read().clone()
        };

        crate::log_event!("router", "changed", "'{value}'");

        let report = snapshot.dispatch(&value);
        if report.has_failures() {
            tracing::warn!(
                "[router] {} of {} handlers failed for '{value}'",
                report.failures().count(),
                report.outcomes.len()
            );
        }

        Some(report)
    }

    /// Spawn the polling loop on the current tokio runtime.
    ///
    /// The loop polls every `period` and whenever the returned handle is
    /// nudged. It runs until [`WatchHandle::stop`] is called; dropping the
    /// handle does not stop it. Periods below 1 ms are raised to 1 ms.
    pub fn start(&self, period: Duration) -> WatchHandle {
        let period = period.max(MIN_POLL_INTERVAL);
        let cancel = CancellationToken::new();
        let nudge = Arc::new(Notify::new());

        let watcher = self.clone();
        let loop_cancel = cancel.clone();
        let loop_nudge = Arc::clone(&nudge);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            crate::log_event!("router", "started", "polling every {period:?}");

            loop {
                tokio::select! {
                    biased;

                    _ = loop_cancel.cancelled() => break,
                    _ = loop_nudge.notified() => {}
                    _ = ticker.tick() => {}
                }

                watcher.poll();
            }

            crate::log_event!("router", "stopped");
        });

        WatchHandle { cancel, nudge, task }
    }
}

/// Second half of the `on(matcher).then(callback)` builder.
#[must_use = "a handler is only registered once `then` is called"]
pub struct Registration<'a> {
    watcher: &'a HashWatcher,
    matcher: Matcher,
}

impl Registration<'_> {
    /// Register an infallible callback.
    pub fn then<F>(self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.watcher.push(
            self.matcher,
            Arc::new(move || -> anyhow::Result<()> {
                callback();
                Ok(())
            }),
        );
    }

    /// Register a fallible callback; errors are reported per handler.
    pub fn then_try<F>(self, callback: F)
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.watcher.push(self.matcher, Arc::new(callback));
    }
}

/// Control handle for a running polling loop.
pub struct WatchHandle {
    cancel: CancellationToken,
    nudge: Arc<Notify>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Request an immediate poll, e.g. from a native change notification.
    pub fn nudge(&self) {
        self.nudge.notify_one();
    }

    /// Stop the loop. No new tick starts after this returns, but a tick
    /// already dispatching runs to completion; use [`join`](Self::join) to
    /// wait for it.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A cloneable nudge trigger for use from other threads.
    pub fn nudger(&self) -> Arc<Notify> {
        Arc::clone(&self.nudge)
    }

    /// Wait for the loop to finish after [`stop`](Self::stop).
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!("[router] polling loop ended abnormally: {e}");
        }
    }
}
