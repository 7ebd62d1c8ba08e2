use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directory holding `barrage.toml`. Not created until something is written.
pub fn barrage_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("barrage"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(barrage_config_dir()?.join("barrage.toml"))
}

/// `<dir>/<stem><suffix>.<extension>` next to `input`.
pub fn sibling_with_suffix(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{stem}{suffix}.{extension}");
    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
