//! Hash-fragment router: change detection plus ordered handler dispatch.
//!
//! # Architecture
//!
//! ```text
//! FragmentSource (memory / file)
//!         |
//!     HashWatcher  -- poll tick: read, normalize, compare
//!         |               (on change only)
//!   HandlerRegistry -- every matcher evaluated, in registration order
//!         |
//!  +------+------+
//!  |      |      |
//!  H1     H2     H3   (each isolated; failures reported, not propagated)
//! ```

mod error;
mod location;
mod matcher;
mod registry;
mod watcher;

pub use error::RouterError;
pub use location::{FileLocation, FragmentSource, MemoryLocation, fragment_of, normalize};
pub use matcher::{Matcher, Predicate, action_that, is_equal_to, is_one_of, starts_with};
pub use registry::{
    Callback, DispatchReport, Handler, HandlerOutcome, HandlerRegistry, HandlerStatus,
};
pub use watcher::{DEFAULT_POLL_INTERVAL, HashWatcher, Registration, WatchHandle};
