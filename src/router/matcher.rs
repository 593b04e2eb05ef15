//! Matchers and the predicate factories used to build them.
//!
//! Call sites compose a predicate factory with the generic wrapper:
//!
//! ```
//! use hashnav::router::{action_that, is_equal_to};
//!
//! let about = action_that(is_equal_to("about"));
//! assert!(about.matches("about"));
//! assert!(!about.matches("About"));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Predicate over a fragment value.
pub type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Tests whether a fragment value should trigger a handler.
///
/// Immutable once constructed; cloning shares the underlying predicate.
#[derive(Clone)]
pub struct Matcher {
    predicate: Predicate,
}

impl Matcher {
    pub fn matches(&self, value: &str) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher").finish_non_exhaustive()
    }
}

/// Wrap an arbitrary predicate into a [`Matcher`].
pub fn action_that<P>(predicate: P) -> Matcher
where
    P: Fn(&str) -> bool + Send + Sync + 'static,
{
    Matcher {
        predicate: Arc::new(predicate),
    }
}

/// Exact, case-sensitive string equality.
pub fn is_equal_to(expected: &str) -> impl Fn(&str) -> bool + Send + Sync + use<> {
    let expected = expected.to_owned();
    move |value: &str| value == expected
}

/// Matches values beginning with `prefix`.
pub fn starts_with(prefix: &str) -> impl Fn(&str) -> bool + Send + Sync + use<> {
    let prefix = prefix.to_owned();
    move |value: &str| value.starts_with(prefix.as_str())
}

/// Set membership over exact values.
pub fn is_one_of<I, S>(values: I) -> impl Fn(&str) -> bool + Send + Sync + use<I, S>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    membership(values.into_iter().map(Into::into).collect())
}

fn membership(values: HashSet<String>) -> impl Fn(&str) -> bool + Send + Sync + use<> {
    move |value: &str| values.contains(value)
}
