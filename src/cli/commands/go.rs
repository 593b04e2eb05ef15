//! Go command - navigate by rewriting the location file.

use crate::config::Settings;
use crate::router::{FileLocation, fragment_of, normalize};

/// Write `fragment` to the configured location file.
pub fn run(fragment: &str, config: &Settings) -> anyhow::Result<()> {
    let location = FileLocation::new(config.location_path());
    let target = normalize(fragment_of(fragment));

    location.write(&target)?;

    crate::debug_event!("go", "wrote", "'{target}' to {}", location.path().display());
    println!("#{target}");
    Ok(())
}
