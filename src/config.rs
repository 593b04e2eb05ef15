//! Configuration for the navigation router.
//!
//! Layered configuration:
//! - Default values
//! - TOML configuration file (`.hashnav/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the caller)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `HASHNAV_` and use double
//! underscores to separate nested levels:
//! - `HASHNAV_ROUTER__POLL_INTERVAL_MS=250` sets `router.poll_interval_ms`
//! - `HASHNAV_CONTENT__DIR=pages` sets `content.dir`
//! - `HASHNAV_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the settings file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".hashnav";
const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "HASHNAV_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .hashnav is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RouterConfig {
    /// Poll period in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// File holding the current location (URL, href or fragment)
    #[serde(default = "default_location_file")]
    pub location_file: PathBuf,

    /// Also poll immediately when the location file changes on disk
    #[serde(default = "default_true")]
    pub native_events: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContentConfig {
    /// Directory with one panel file per navigation target
    #[serde(default = "default_content_dir")]
    pub dir: PathBuf,

    /// Panel file extension, without the dot
    #[serde(default = "default_content_extension")]
    pub extension: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NavigationConfig {
    #[serde(default = "default_links")]
    pub links: Vec<LinkConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Link target, e.g. `#projects` or `index.html#projects`
    pub href: String,

    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `hashnav = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_poll_interval_ms() -> u64 {
    crate::router::DEFAULT_POLL_INTERVAL.as_millis() as u64
}
fn default_location_file() -> PathBuf {
    PathBuf::from(".hashnav/location")
}
fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}
fn default_content_extension() -> String {
    "html".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_links() -> Vec<LinkConfig> {
    [
        ("#projects", "Projects"),
        ("#about", "About"),
        ("#contact", "Contact"),
    ]
    .into_iter()
    .map(|(href, label)| LinkConfig {
        href: href.to_string(),
        label: label.to_string(),
    })
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            router: RouterConfig::default(),
            content: ContentConfig::default(),
            navigation: NavigationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            location_file: default_location_file(),
            native_events: true,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            extension: default_content_extension(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            links: default_links(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl RouterConfig {
    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Self::load_from(config_path).map(|mut settings| {
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting; single underscores stay
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the settings file by walking up from the current directory
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .hashnav is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn location_path(&self) -> PathBuf {
        self.resolve(&self.router.location_file)
    }

    pub fn content_path(&self) -> PathBuf {
        self.resolve(&self.content.dir)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `root`, plus a starter panel for
    /// every default navigation link that has none yet.
    ///
    /// Returns the settings path.
    pub fn init_config_file(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        settings.workspace_root = Some(root.to_path_buf());
        settings.save(&config_path)?;

        settings.create_default_content()?;

        Ok(config_path)
    }

    fn create_default_content(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = self.content_path();
        std::fs::create_dir_all(&dir)?;

        for link in &self.navigation.links {
            let id = crate::navigation::target_of(&link.href);
            if id.is_empty() {
                continue;
            }

            let panel = dir.join(format!("{id}.{}", self.content.extension));
            if !panel.exists() {
                std::fs::write(&panel, format!("<h2>{}</h2>\n", link.label))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.router.poll_interval_ms, 100);
        assert_eq!(settings.router.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.logging.default, "warn");
        assert_eq!(settings.navigation.links.len(), 3);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r##"
version = 2

[router]
poll_interval_ms = 250
native_events = false

[content]
dir = "pages"

[[navigation.links]]
href = "#home"
label = "Home"

[logging.modules]
hashnav = "debug"
"##;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.router.poll_interval_ms, 250);
        assert!(!settings.router.native_events);
        assert_eq!(settings.content.dir, PathBuf::from("pages"));
        // Unspecified fields keep defaults
        assert_eq!(settings.content.extension, "html");
        // Configured links replace the defaults
        assert_eq!(
            settings.navigation.links,
            vec![LinkConfig {
                href: "#home".to_string(),
                label: "Home".to_string(),
            }]
        );
        assert_eq!(settings.logging.modules["hashnav"], "debug");
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/settings.toml");

        let mut settings = Settings::default();
        settings.router.poll_interval_ms = 40;
        settings.content.extension = "md".to_string();

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.router.poll_interval_ms, 40);
        assert_eq!(loaded.content.extension, "md");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[logging]\ndefault = \"info\"\n").unwrap();

        unsafe {
            std::env::set_var("HASHNAV_LOGGING__DEFAULT", "trace");
        }

        let settings = Settings::load_from(&config_path).unwrap();

        unsafe {
            std::env::remove_var("HASHNAV_LOGGING__DEFAULT");
        }

        assert_eq!(settings.logging.default, "trace");
    }

    #[test]
    fn test_resolve_against_workspace_root() {
        let mut settings = Settings::default();
        assert_eq!(settings.location_path(), PathBuf::from(".hashnav/location"));

        settings.workspace_root = Some(PathBuf::from("/site"));
        assert_eq!(settings.location_path(), PathBuf::from("/site/.hashnav/location"));
        assert_eq!(settings.content_path(), PathBuf::from("/site/content"));
        assert_eq!(settings.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let mut settings = Settings::default();
        settings.router.poll_interval_ms = 0;
        assert_eq!(settings.router.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_init_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.exists());
        assert!(temp_dir.path().join("content/projects.html").exists());
        assert!(temp_dir.path().join("content/about.html").exists());

        // Second init without force refuses
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());

        // Existing panels are kept on forced re-init
        fs::write(temp_dir.path().join("content/about.html"), "custom").unwrap();
        Settings::init_config_file(temp_dir.path(), true).unwrap();
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("content/about.html")).unwrap(),
            "custom"
        );
    }
}
