use std::path::Path;

use clap::Parser;

use hashnav::Settings;
use hashnav::cli::commands::{go, init, watch};
use hashnav::cli::{Cli, Commands};

/// Load settings from `--config` or by discovering `.hashnav/`, then
/// initialize logging from them.
fn load_config(path: Option<&Path>) -> Settings {
    let loaded = match path {
        Some(path) => Settings::load_from(path).map(|mut settings| {
            // .hashnav/settings.toml lives two levels below the workspace root
            if settings.workspace_root.is_none() {
                settings.workspace_root = path
                    .parent()
                    .and_then(Path::parent)
                    .map(Path::to_path_buf);
            }
            settings
        }),
        None => Settings::load(),
    };

    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    hashnav::logging::init_with_config(&config.logging);
    config
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init { force } => {
            hashnav::logging::init();
            match std::env::current_dir() {
                Ok(root) => {
                    init::run_init(&root, force);
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!("cannot determine current directory: {e}")),
            }
        }
        Commands::Watch {
            interval,
            no_events,
            json,
        } => {
            let config = load_config(config_path);
            watch::run(
                watch::WatchArgs {
                    interval,
                    no_events,
                    json,
                },
                config,
            )
            .await
        }
        Commands::Go { fragment } => go::run(&fragment, &load_config(config_path)),
        Commands::Config => {
            init::run_config(&load_config(config_path));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
