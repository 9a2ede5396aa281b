//! Directory-backed archive context

use crate::error::StorageError;
use crate::store::ArchiveContext;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Raw files of one upload stored under a root directory.
///
/// Writes go to a `.tmp` sibling first and are renamed into place.
pub struct DirectoryArchive {
    root: PathBuf,
    upload_id: String,
}

impl DirectoryArchive {
    /// Open (and create if needed) the upload directory.
    pub fn new<P: AsRef<Path>>(root: P, upload_id: impl Into<String>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to create upload directory {:?}: {}", root, e),
            ))
        })?;
        Ok(Self {
            root,
            upload_id: upload_id.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a raw file name inside the root, rejecting escapes.
    fn raw_path(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(file_name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if file_name.is_empty() || escapes {
            return Err(StorageError::InvalidReference(format!(
                "Raw file name outside upload: {}",
                file_name
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl ArchiveContext for DirectoryArchive {
    fn upload_id(&self) -> &str {
        &self.upload_id
    }

    fn raw_path_exists(&self, file_name: &str) -> Result<bool, StorageError> {
        Ok(self.raw_path(file_name)?.exists())
    }

    fn read_raw(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.raw_path(file_name)?;
        if !path.exists() {
            return Err(StorageError::NotFound(file_name.to_string()));
        }
        fs::read(&path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            ))
        })
    }

    fn write_raw(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.raw_path(file_name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create parent directory {:?}: {}", parent, e),
                ))
            })?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, bytes).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write {:?}: {}", temp_path, e),
            ))
        })?;

        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", path, e),
            ))
        })
    }

    fn list_raw(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                StorageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to list upload: {}", e),
                ))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !name.ends_with(".tmp") {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}
