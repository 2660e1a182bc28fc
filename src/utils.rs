use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr, eyre};

/// Last modification time of `path`, in UTC
pub fn mtime_as_datetime(path: impl AsRef<Path>) -> Result<DateTime<Utc>> {
    let path = path.as_ref();
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .wrap_err_with(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(DateTime::<Utc>::from(modified))
}

/// True when `path` was modified after `last_known_mtime`
pub fn has_file_changed(last_known_mtime: DateTime<Utc>, path: impl AsRef<Path>) -> Result<bool> {
    Ok(mtime_as_datetime(path)? > last_known_mtime)
}

/// Create an empty file for each of `filenames` inside `dir`
pub fn populate_folder_with_filenames<S: AsRef<str>>(dir: impl AsRef<Path>, filenames: &[S]) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(eyre!("'{}' does not exist", dir.display()));
    }
    if !dir.is_dir() {
        return Err(eyre!("'{}' is not a directory", dir.display()));
    }

    for name in filenames {
        let path = dir.join(name.as_ref());
        fs::write(&path, "").wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Prepares problem content ahead of grading
///
/// Graders call [`Generator::run`] to rebuild a clean copy of whatever the
/// generation step produced.
pub trait Generator {
    fn generate(&self, path: &Path) -> Result<()>;

    fn run(&self, path: &Path) -> Result<()> {
        self.generate(path)
    }
}
