//! Watch command - run the router against the location file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use console::style;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;

use crate::config::Settings;
use crate::navigation::{ContentLoader, DisplayRegion, Navigation, Panel};
use crate::router::{FileLocation, HashWatcher, RouterError};

/// Arguments for the watch command.
pub struct WatchArgs {
    pub interval: Option<u64>,
    pub no_events: bool,
    pub json: bool,
}

/// Run the watch command until Ctrl-C.
pub async fn run(args: WatchArgs, config: Settings) -> anyhow::Result<()> {
    let location_path = config.location_path();
    let watcher = HashWatcher::create(FileLocation::new(&location_path));

    let region = DisplayRegion::new();
    let loader = ContentLoader::new(
        config.content_path(),
        config.content.extension.clone(),
        region.clone(),
    )?;
    let navigation = Navigation::new(&config.navigation.links, loader);

    if navigation.wire(&watcher) == 0 {
        tracing::warn!("[watch] no navigation links configured; nothing will load");
    }

    // Show whatever the location points at right now. This is setup, not a
    // dispatch: the router itself only reacts to changes.
    let initial = watcher.current();
    if !initial.is_empty() {
        if let Err(e) = navigation.select(&initial) {
            tracing::warn!("[watch] initial location: {e}");
        }
    }

    let period = args
        .interval
        .map(|ms| Duration::from_millis(ms.max(1)))
        .unwrap_or_else(|| config.router.poll_interval());
    let handle = watcher.start(period);

    let _file_watcher = if config.router.native_events && !args.no_events {
        Some(watch_location(&location_path, handle.nudger())?)
    } else {
        None
    };

    eprintln!(
        "Watching {} (every {}ms). Navigate with `hashnav go <fragment>`, Ctrl-C to stop.",
        location_path.display(),
        period.as_millis()
    );

    let mut panels = region.subscribe();
    loop {
        tokio::select! {
            changed = panels.changed() => {
                if changed.is_err() {
                    break;
                }
                let panel = panels.borrow_and_update().clone();
                if let Some(panel) = panel {
                    print_panel(&panel, &navigation, args.json)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    handle.stop();
    handle.join().await;
    Ok(())
}

/// Nudge the router whenever the location file changes on disk.
///
/// The parent directory is watched so that editors replacing the file
/// (write to temp, rename) are still noticed.
fn watch_location(path: &Path, nudge: Arc<Notify>) -> Result<RecommendedWatcher, RouterError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| RouterError::InitFailed {
        reason: format!("cannot create {}: {e}", dir.display()),
    })?;

    let file_name = path.file_name().map(|name| name.to_os_string());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let touches_location = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
            if touches_location {
                nudge.notify_one();
            }
        }
        Err(e) => tracing::error!("[watch] file watch error: {e}"),
    })?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    crate::debug_event!("watch", "watching", "{}", dir.display());

    Ok(watcher)
}

fn print_panel(panel: &Panel, navigation: &Navigation, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(panel)?);
        return Ok(());
    }

    let bar: Vec<String> = navigation
        .links()
        .iter()
        .map(|link| {
            let label = if link.label.is_empty() {
                &link.target
            } else {
                &link.label
            };
            if navigation.is_active(&link.target) {
                style(format!("[{label}]")).green().bold().to_string()
            } else {
                style(label).dim().to_string()
            }
        })
        .collect();

    println!("{}", bar.join("  "));
    println!("{}", style(format!("#{}", panel.id)).cyan().bold());
    println!("{}", panel.body.trim_end());
    println!();
    Ok(())
}
