// Filesystem locations for the service's local state

use std::path::{Path, PathBuf};

use anyhow::Context;

pub const DB_FILE_NAME: &str = "progress.sqlite";

/// Create `dir` (and parents) if missing and return it. An existing directory is left as is.
#[tracing::instrument(level = "debug")]
pub fn ensure_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    if dir.is_dir() {
        return Ok(dir.to_path_buf());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    tracing::info!(path = %dir.display(), "created data directory");
    Ok(dir.to_path_buf())
}

/// sqlite connection string for the progress database inside `data_dir`.
pub fn default_db_connection_string(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DB_FILE_NAME).display())
}
