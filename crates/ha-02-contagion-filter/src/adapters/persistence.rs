//! Filter file persistence
//!
//! The raw filter bytes live at the configured filter path so they can be
//! served or copied as a static file. Version, generation and digest live in
//! a JSON sidecar next to it (`<path>.meta.json`).
//!
//! Both files are written via temp file, `fsync` and `rename`. If a crash
//! separates the two renames the digest check on load fails and the server
//! falls back to rebuilding from the store.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::{ArtifactMeta, FilterArtifact};
use crate::error::FilterError;

/// Location of a persisted filter artifact.
#[derive(Clone, Debug)]
pub struct FilterFile {
    path: PathBuf,
}

impl FilterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta_path(&self) -> PathBuf {
        with_suffix(&self.path, ".meta.json")
    }

    pub fn save(&self, artifact: &FilterArtifact) -> Result<(), FilterError> {
        let meta = serde_json::to_vec_pretty(&artifact.meta())
            .map_err(|e| FilterError::SerializationError(e.to_string()))?;

        write_atomically(&self.path, &artifact.bytes)?;
        write_atomically(&self.meta_path(), &meta)
    }

    /// Load the last persisted artifact.
    ///
    /// `Ok(None)` when nothing was persisted yet. A filter file without a
    /// sidecar (e.g. produced by another tool) is also treated as absent.
    pub fn load(&self) -> Result<Option<FilterArtifact>, FilterError> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(None);
        };

        let meta_path = self.meta_path();
        let Some(meta_bytes) = read_optional(&meta_path)? else {
            tracing::warn!(
                "[ha-02] Filter file {} has no metadata sidecar, ignoring it",
                self.path.display()
            );
            return Ok(None);
        };

        let meta: ArtifactMeta =
            serde_json::from_slice(&meta_bytes).map_err(|e| FilterError::Mismatch {
                path: meta_path.clone(),
                reason: e.to_string(),
            })?;

        let artifact =
            FilterArtifact::from_parts(meta, bytes).map_err(|reason| FilterError::Mismatch {
                path: self.path.clone(),
                reason,
            })?;
        artifact.decode_filter()?;

        Ok(Some(artifact))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, FilterError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FilterError::Persistence {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FilterError> {
    let io_err = |source| FilterError::Persistence {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let temp_path = with_suffix(path, ".tmp");
    let mut file = File::create(&temp_path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(io_err)
}
