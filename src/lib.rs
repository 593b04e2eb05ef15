//! Hash-fragment navigation router.
//!
//! A [`HashWatcher`] polls a location source for its fragment and, on every
//! change, dispatches the registered handlers in registration order. The
//! [`navigation`] module wires configured links to content panels on top of
//! that core.

pub mod cli;
pub mod config;
pub mod logging;
pub mod navigation;
pub mod router;

pub use config::Settings;
pub use navigation::{ContentLoader, DisplayRegion, Navigation, Panel};
pub use router::{
    DispatchReport, FileLocation, HashWatcher, MemoryLocation, RouterError, action_that,
    is_equal_to,
};
