//! Navigation wiring on top of the router.
//!
//! For every configured link the target id is taken from its href and an
//! exact-match handler is registered. When it fires, the link becomes the
//! active one and the matching content panel is loaded into the
//! [`DisplayRegion`] in the background; the handler does not wait for it.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::LinkConfig;
use crate::router::{HashWatcher, RouterError, action_that, fragment_of, is_equal_to, normalize};

/// Target id of a link href: `"index.html#about"` and `"#about"` both
/// give `"about"`.
pub fn target_of(href: &str) -> String {
    normalize(fragment_of(href))
}

/// A loaded content panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub id: String,
    pub body: String,
}

/// Where loaded panels are shown. Subscribers see the latest panel.
#[derive(Clone)]
pub struct DisplayRegion {
    tx: Arc<watch::Sender<Option<Panel>>>,
}

impl DisplayRegion {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn show(&self, panel: Panel) {
        crate::debug_event!("nav", "shown", "{}", panel.id);
        self.tx.send_replace(Some(panel));
    }

    pub fn current(&self) -> Option<Panel> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Panel>> {
        self.tx.subscribe()
    }
}

impl Default for DisplayRegion {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads `<dir>/<id>.<extension>` into a display region.
pub struct ContentLoader {
    dir: PathBuf,
    extension: String,
    region: DisplayRegion,
    runtime: Handle,
}

impl ContentLoader {
    /// Create a loader bound to the current tokio runtime.
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        region: DisplayRegion,
    ) -> Result<Self, RouterError> {
        let runtime = Handle::try_current().map_err(|e| RouterError::InitFailed {
            reason: format!("content loader needs a tokio runtime: {e}"),
        })?;

        Ok(Self {
            dir: dir.into(),
            extension: extension.into(),
            region,
            runtime,
        })
    }

    pub fn region(&self) -> &DisplayRegion {
        &self.region
    }

    /// Panel file for a target id. Ids must be a single path component.
    pub fn panel_path(&self, id: &str) -> Result<PathBuf, RouterError> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(RouterError::InvalidTarget {
                target: id.to_string(),
            });
        }

        Ok(self.dir.join(format!("{id}.{}", self.extension)))
    }

    /// Start loading a panel in the background.
    ///
    /// A failed read is logged and leaves the region unchanged.
    pub fn load(&self, id: &str) -> Result<JoinHandle<()>, RouterError> {
        let path = self.panel_path(id)?;
        let id = id.to_string();
        let region = self.region.clone();

        Ok(self.runtime.spawn(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    crate::log_event!("nav", "loaded", "{id} ({} bytes)", body.len());
                    region.show(Panel { id, body });
                }
                Err(e) => {
                    tracing::warn!("[nav] cannot load {}: {e}", path.display());
                }
            }
        }))
    }
}

/// A navigation link and the target id it routes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub label: String,
    pub target: String,
}

impl From<&LinkConfig> for NavLink {
    fn from(link: &LinkConfig) -> Self {
        Self {
            href: link.href.clone(),
            label: link.label.clone(),
            target: target_of(&link.href),
        }
    }
}

/// The set of navigation links, the active one, and the panel loader.
pub struct Navigation {
    links: Vec<NavLink>,
    active: RwLock<Option<String>>,
    loader: ContentLoader,
}

impl Navigation {
    pub fn new(links: &[LinkConfig], loader: ContentLoader) -> Arc<Self> {
        Arc::new(Self {
            links: links.iter().map(NavLink::from).collect(),
            active: RwLock::new(None),
            loader,
        })
    }

    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    /// Target id of the active link, if any.
    pub fn active(&self) -> Option<String> {
        self.active.read().clone()
    }

    pub fn is_active(&self, target: &str) -> bool {
        self.active.read().as_deref() == Some(target)
    }

    /// Activate the link for `target` and start loading its panel.
    ///
    /// Every other link becomes inactive.
    pub fn select(&self, target: &str) -> Result<JoinHandle<()>, RouterError> {
        if !self.links.iter().any(|link| link.target == target) {
            return Err(RouterError::UnknownTarget {
                target: target.to_string(),
            });
        }

        *self.active.write() = Some(target.to_string());
        crate::debug_event!("nav", "active", "{target}");

        self.loader.load(target)
    }

    /// Register one exact-match handler per link. Returns how many were
    /// registered.
    ///
    /// Links without a fragment are skipped, as are links whose target
    /// repeats an earlier link, so one change never loads the same panel
    /// twice.
    pub fn wire(self: &Arc<Self>, watcher: &HashWatcher) -> usize {
        let mut wired: Vec<&str> = Vec::new();

        for link in &self.links {
            if link.target.is_empty() {
                tracing::warn!("[nav] link '{}' has no fragment, not wired", link.href);
                continue;
            }
            if wired.contains(&link.target.as_str()) {
                tracing::warn!("[nav] duplicate link target '{}' ignored", link.target);
                continue;
            }
            wired.push(&link.target);

            let navigation = Arc::clone(self);
            let target = link.target.clone();
            watcher
                .on(action_that(is_equal_to(&link.target)))
                .then_try(move || {
                    navigation.select(&target)?;
                    Ok(())
                });
        }

        crate::log_event!("nav", "wired", "{} links", wired.len());
        wired.len()
    }
}
