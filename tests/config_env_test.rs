use hashnav::Settings;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// Single test: it changes the process working directory and environment.
#[test]
fn test_workspace_discovery_and_env_override() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let original_dir = env::current_dir().unwrap();

    let config_dir = root.join(".hashnav");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("settings.toml"),
        "[router]\npoll_interval_ms = 500\nnative_events = false\n",
    )
    .unwrap();

    // Discovery walks up from a nested directory
    let nested = root.join("site/pages");
    fs::create_dir_all(&nested).unwrap();
    env::set_current_dir(&nested).unwrap();

    unsafe {
        env::set_var("HASHNAV_ROUTER__POLL_INTERVAL_MS", "50");
    }

    let settings = Settings::load();

    unsafe {
        env::remove_var("HASHNAV_ROUTER__POLL_INTERVAL_MS");
    }
    env::set_current_dir(original_dir).unwrap();

    let settings = settings.unwrap();

    // Env var overrides the file, file overrides defaults
    assert_eq!(settings.router.poll_interval_ms, 50);
    assert!(!settings.router.native_events);
    assert_eq!(settings.content.extension, "html");

    assert_eq!(settings.workspace_root, Some(root.clone()));
    assert_eq!(settings.location_path(), root.join(".hashnav/location"));
    assert_eq!(settings.content_path(), root.join(PathBuf::from("content")));
}
