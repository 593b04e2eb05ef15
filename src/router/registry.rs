//! Ordered handler registry and per-handler isolated dispatch.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::error::RouterError;
use super::matcher::Matcher;

/// Zero-argument side-effecting action run when a matcher accepts a value.
pub type Callback = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// A matcher paired with the callback it guards.
pub struct Handler {
    matcher: Matcher,
    callback: Callback,
}

impl Handler {
    pub fn new(matcher: Matcher, callback: Callback) -> Self {
        Self { matcher, callback }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// What happened to one handler during a dispatch.
#[derive(Debug)]
pub enum HandlerStatus {
    /// The matcher rejected the value.
    Skipped,
    /// The matcher accepted the value and the callback completed.
    Invoked,
    /// The matcher or callback failed; later handlers still ran.
    Failed(RouterError),
}

#[derive(Debug)]
pub struct HandlerOutcome {
    /// Registration index of the handler.
    pub index: usize,
    pub status: HandlerStatus,
}

/// Outcome of one dispatch, one entry per handler in registration order.
#[derive(Debug)]
pub struct DispatchReport {
    pub value: String,
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchReport {
    /// Number of callbacks that ran to completion.
    pub fn invoked_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, HandlerStatus::Invoked))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &HandlerOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, HandlerStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

/// Append-only, insertion-ordered list of handlers.
///
/// Cloning is cheap (handlers are shared), which lets the watcher take a
/// snapshot and release its lock before running any callback.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(Arc::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Evaluate every matcher against `value` and invoke the matching
    /// callbacks, strictly in registration order.
    ///
    /// Each handler is isolated: a panic in a matcher or callback, or an
    /// error returned by a callback, is recorded in the report and the
    /// remaining handlers still run.
    pub fn dispatch(&self, value: &str) -> DispatchReport {
        let outcomes = self
            .handlers
            .iter()
            .enumerate()
            .map(|(index, handler)| HandlerOutcome {
                index,
                status: run_handler(index, handler, value),
            })
            .collect();

        DispatchReport {
            value: value.to_string(),
            outcomes,
        }
    }
}

fn run_handler(index: usize, handler: &Handler, value: &str) -> HandlerStatus {
    let matched = match catch_unwind(AssertUnwindSafe(|| handler.matcher.matches(value))) {
        Ok(matched) => matched,
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::error!("[router] matcher #{index} panicked on '{value}': {reason}");
            return HandlerStatus::Failed(RouterError::HandlerPanicked { index, reason });
        }
    };

    if !matched {
        return HandlerStatus::Skipped;
    }

    crate::debug_event!("router", "invoke", "#{index} for '{value}'");

    match catch_unwind(AssertUnwindSafe(|| (handler.callback)())) {
        Ok(Ok(())) => HandlerStatus::Invoked,
        Ok(Err(e)) => {
            tracing::error!("[router] handler #{index} failed on '{value}': {e:#}");
            HandlerStatus::Failed(RouterError::HandlerFailed {
                index,
                reason: format!("{e:#}"),
            })
        }
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            tracing::error!("[router] handler #{index} panicked on '{value}': {reason}");
            HandlerStatus::Failed(RouterError::HandlerPanicked { index, reason })
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{action_that, is_equal_to};
    use parking_lot::Mutex;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Callback {
        let log = Arc::clone(log);
        Arc::new(move || -> anyhow::Result<()> {
            log.lock().push(name);
            Ok(())
        })
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.push(Handler::new(action_that(is_equal_to("v")), recording(&log, "h1")));
        registry.push(Handler::new(action_that(is_equal_to("other")), recording(&log, "skip")));
        registry.push(Handler::new(action_that(is_equal_to("v")), recording(&log, "h2")));

        let report = registry.dispatch("v");

        assert_eq!(*log.lock(), vec!["h1", "h2"]);
        assert_eq!(report.value, "v");
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.invoked_count(), 2);
        assert!(matches!(report.outcomes[1].status, HandlerStatus::Skipped));
    }

    #[test]
    fn test_failing_callback_does_not_abort_dispatch() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.push(Handler::new(
            action_that(is_equal_to("v")),
            Arc::new(|| -> anyhow::Result<()> { Err(anyhow::anyhow!("load failed")) }),
        ));
        registry.push(Handler::new(action_that(is_equal_to("v")), recording(&log, "after")));

        let report = registry.dispatch("v");

        assert_eq!(*log.lock(), vec!["after"]);
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 0);
        match &failures[0].status {
            HandlerStatus::Failed(RouterError::HandlerFailed { reason, .. }) => {
                assert!(reason.contains("load failed"));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.push(Handler::new(
            action_that(is_equal_to("v")),
            Arc::new(|| -> anyhow::Result<()> { panic!("boom") }),
        ));
        registry.push(Handler::new(action_that(is_equal_to("v")), recording(&log, "after")));

        let report = registry.dispatch("v");

        assert_eq!(*log.lock(), vec!["after"]);
        assert!(report.has_failures());
        match &report.outcomes[0].status {
            HandlerStatus::Failed(RouterError::HandlerPanicked { index, reason }) => {
                assert_eq!(*index, 0);
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_panicking_matcher_is_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        registry.push(Handler::new(
            action_that(|_: &str| panic!("bad matcher")),
            recording(&log, "never"),
        ));
        registry.push(Handler::new(action_that(is_equal_to("v")), recording(&log, "after")));

        let report = registry.dispatch("v");

        assert_eq!(*log.lock(), vec!["after"]);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.invoked_count(), 1);
    }

    #[test]
    fn test_empty_registry_dispatch() {
        let registry = HandlerRegistry::new();
        let report = registry.dispatch("anything");

        assert!(registry.is_empty());
        assert!(report.outcomes.is_empty());
        assert!(!report.has_failures());
    }
}
