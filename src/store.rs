use std::collections::BTreeSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

use crate::error::LogoError;

/// One asset tree: a root holding one subdirectory per source.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn current_dir() -> Result<Self, LogoError> {
        let cwd = std::env::current_dir().map_err(|err| LogoError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| LogoError::Filesystem("invalid working directory path".to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.as_std_path().is_dir()
    }

    pub fn dir(&self, name: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub fn ensure_dir(&self, name: impl AsRef<Utf8Path>) -> Result<Utf8PathBuf, LogoError> {
        let dir = self.dir(name);
        fs::create_dir_all(dir.as_std_path()).map_err(|err| LogoError::OutputDir(format!("{dir}: {err}")))?;
        Ok(dir)
    }

    /// Number of regular files directly inside `dir`; zero when it is missing.
    pub fn count_files(dir: &Utf8Path) -> Result<u64, LogoError> {
        if !dir.as_std_path().is_dir() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in fs::read_dir(dir.as_std_path()).map_err(|err| LogoError::Filesystem(err.to_string()))? {
            let entry = entry.map_err(|err| LogoError::Filesystem(err.to_string()))?;
            if entry.path().is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// File names ending in `.png` (any case) directly inside `dir`.
    pub fn list_pngs(dir: &Utf8Path) -> Result<BTreeSet<String>, LogoError> {
        let mut names = BTreeSet::new();
        if !dir.as_std_path().is_dir() {
            return Ok(names);
        }
        for entry in fs::read_dir(dir.as_std_path()).map_err(|err| LogoError::Filesystem(err.to_string()))? {
            let entry = entry.map_err(|err| LogoError::Filesystem(err.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.to_ascii_lowercase().ends_with(".png") {
                names.insert(name);
            }
        }
        Ok(names)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), LogoError> {
        let parent = path
            .parent()
            .ok_or_else(|| LogoError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix(".airline-logos")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| LogoError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Copies `source` over `dest` with a single rename, so a failure leaves
    /// any existing `dest` untouched.
    pub fn copy_file_atomic(source: &Utf8Path, dest: &Utf8Path) -> Result<(), LogoError> {
        let parent = dest
            .parent()
            .ok_or_else(|| LogoError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix(".airline-logos")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        fs::copy(source.as_std_path(), temp.path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        temp.persist(dest.as_std_path())
            .map_err(|err| LogoError::Filesystem(err.to_string()))?;
        Ok(())
    }
}
