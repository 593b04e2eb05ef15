//! Location sources the watcher polls for the current fragment.
//!
//! A [`FragmentSource`] stands in for the platform location API. Sources
//! return the raw value; the watcher normalizes it with [`normalize`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::RouterError;

/// Strip a single leading `#`, otherwise return the value unchanged.
///
/// ```
/// use hashnav::router::normalize;
///
/// assert_eq!(normalize("#contact"), "contact");
/// assert_eq!(normalize("contact"), "contact");
/// assert_eq!(normalize("##x"), "#x");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.strip_prefix('#').unwrap_or(raw).to_string()
}

/// The fragment portion of a URL or href, `#` included.
///
/// A value without a `#` is a bare fragment (`"about"`) unless it looks like
/// a URL or path (contains `/` or `:`), in which case it has no fragment.
///
/// ```
/// use hashnav::router::fragment_of;
///
/// assert_eq!(fragment_of("index.html#about"), "#about");
/// assert_eq!(fragment_of("about"), "about");
/// assert_eq!(fragment_of("http://localhost/index.html"), "");
/// ```
pub fn fragment_of(raw: &str) -> &str {
    match raw.find('#') {
        Some(pos) => &raw[pos..],
        None if raw.contains(['/', ':']) => "",
        None => raw,
    }
}

/// Provides the raw location fragment on demand.
pub trait FragmentSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Read the current raw fragment (leading `#` allowed).
    fn read(&self) -> Result<String, RouterError>;
}

/// In-memory location shared between the host and the watcher.
///
/// Clones observe the same value, so a host keeps one handle to navigate
/// while the watcher polls another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    hash: Arc<RwLock<String>>,
}

impl MemoryLocation {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            hash: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// Replace the current raw fragment.
    pub fn set(&self, raw: impl Into<String>) {
        *self.hash.write() = raw.into();
    }

    pub fn get(&self) -> String {
        self.hash.read().clone()
    }
}

impl FragmentSource for MemoryLocation {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self) -> Result<String, RouterError> {
        Ok(self.get())
    }
}

/// File-backed location: the file holds a URL, href or bare fragment.
///
/// A missing file reads as the empty fragment. Surrounding whitespace is
/// ignored so the file can be edited by hand.
#[derive(Debug, Clone)]
pub struct FileLocation {
    path: PathBuf,
}

impl FileLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Navigate by writing `fragment` as `#fragment`.
    pub fn write(&self, fragment: &str) -> Result<(), RouterError> {
        let write_err = |e: std::io::Error| RouterError::LocationWrite {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        std::fs::write(&self.path, format!("#{}\n", normalize(fragment))).map_err(write_err)
    }
}

impl FragmentSource for FileLocation {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self) -> Result<String, RouterError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(fragment_of(content.trim()).to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(RouterError::LocationRead {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("#contact"), "contact");
        assert_eq!(normalize("contact"), "contact");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("#"), "");
    }

    #[test]
    fn test_fragment_of() {
        assert_eq!(fragment_of("index.html#about"), "#about");
        assert_eq!(fragment_of("https://example.org/#a#b"), "#a#b");
        assert_eq!(fragment_of("#projects"), "#projects");
        assert_eq!(fragment_of("projects"), "projects");
        assert_eq!(fragment_of(""), "");
        assert_eq!(fragment_of("http://localhost/index.html"), "");
        assert_eq!(fragment_of("/index.html"), "");
        assert_eq!(fragment_of("about:blank"), "");
    }

    #[test]
    fn test_memory_location_clones_share_state() {
        let host = MemoryLocation::new("#home");
        let polled = host.clone();

        host.set("#about");

        assert_eq!(polled.read().unwrap(), "#about");
    }

    #[test]
    fn test_file_location_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let location = FileLocation::new(temp_dir.path().join("absent"));

        assert_eq!(location.read().unwrap(), "");
    }

    #[test]
    fn test_file_location_reads_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("location");
        std::fs::write(&path, "  http://localhost/index.html#projects \n").unwrap();

        let location = FileLocation::new(&path);

        assert_eq!(location.read().unwrap(), "#projects");
    }

    #[test]
    fn test_file_location_url_without_fragment_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("location");
        std::fs::write(&path, "http://localhost/index.html\n").unwrap();

        let location = FileLocation::new(&path);

        assert_eq!(location.read().unwrap(), "");
    }

    #[test]
    fn test_file_location_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let location = FileLocation::new(temp_dir.path().join("nested/location"));

        location.write("#about").unwrap();
        assert_eq!(location.read().unwrap(), "#about");

        location.write("contact").unwrap();
        assert_eq!(normalize(&location.read().unwrap()), "contact");
    }

    #[test]
    fn test_file_location_read_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be read as a file.
        let location = FileLocation::new(temp_dir.path());

        assert!(matches!(
            location.read(),
            Err(RouterError::LocationRead { .. })
        ));
    }
}
