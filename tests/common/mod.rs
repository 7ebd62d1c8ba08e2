use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory that also serves as the config home for the binary.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir_all(temp_dir.path().join("config"))?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Value for `XDG_CONFIG_HOME`, so tests never read the user's own config.
    pub fn config_home(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_home().join("barrage").join("barrage.toml")
    }

    /// Copy a file from `tests/fixtures` into the environment.
    pub fn fixture(&self, name: &str) -> Result<PathBuf> {
        let source = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name);
        let target = self.path().join(name);
        fs::copy(&source, &target)?;
        Ok(target)
    }

    pub fn write(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, content)?;
        Ok(path)
    }
}
