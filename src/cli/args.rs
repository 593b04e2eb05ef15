//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "hashnav",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hash-fragment navigation router",
    long_about = "Watch a location fragment and load the content panel of the matching navigation link.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .hashnav directory with default configuration and panels")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Run the router
    #[command(
        about = "Watch the location file and load panels on navigation",
        after_help = "Examples:\n  hashnav watch\n  hashnav watch --interval 250\n  hashnav watch --json\n\nNavigate from another terminal with:\n  hashnav go about"
    )]
    Watch {
        /// Poll period in milliseconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,

        /// Disable file-change notifications; rely on polling only
        #[arg(long)]
        no_events: bool,

        /// Print panels as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Navigate by writing the location file
    #[command(about = "Set the current fragment, e.g. `hashnav go about`")]
    Go {
        /// Fragment, href or URL to navigate to
        fragment: String,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .hashnav/settings.toml")]
    Config,
}
