//! Record store
//!
//! File-backed storage for archive records of one upload. Each record lives in its
//! own `*.archive.json` raw file as `{"data": <section>}`. Created records are
//! never overwritten: creation is idempotent at the file-name level.

pub mod archive;
pub mod reference;

pub use archive::DirectoryArchive;
pub use reference::{entry_id, reference, ReferenceResolver};

use crate::error::StorageError;
use crate::section::Section;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Storage context of one upload
pub trait ArchiveContext {
    fn upload_id(&self) -> &str;

    fn raw_path_exists(&self, file_name: &str) -> Result<bool, StorageError>;

    fn read_raw(&self, file_name: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a raw file, replacing any existing content.
    fn write_raw(&self, file_name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Raw file names relative to the upload root.
    fn list_raw(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Serialize)]
struct ArchiveOut<'a, T> {
    data: &'a T,
}

#[derive(Deserialize)]
struct ArchiveIn<T> {
    data: T,
}

/// Write `{"data": entity}` unless `file_name` already exists.
///
/// Returns `true` when the file was written.
pub fn create_archive<C, T>(ctx: &C, entity: &T, file_name: &str) -> Result<bool, StorageError>
where
    C: ArchiveContext + ?Sized,
    T: Serialize,
{
    if ctx.raw_path_exists(file_name)? {
        debug!(file_name, "Archive already present, not overwriting");
        return Ok(false);
    }
    save_archive(ctx, entity, file_name)?;
    debug!(file_name, "Archive created");
    Ok(true)
}

/// Write `{"data": entity}`, replacing an existing file.
pub fn save_archive<C, T>(ctx: &C, entity: &T, file_name: &str) -> Result<(), StorageError>
where
    C: ArchiveContext + ?Sized,
    T: Serialize,
{
    let bytes = serde_json::to_vec_pretty(&ArchiveOut { data: entity })?;
    ctx.write_raw(file_name, &bytes)
}

/// Read the `data` section of an archive file.
pub fn load_archive<C, T>(ctx: &C, file_name: &str) -> Result<T, StorageError>
where
    C: ArchiveContext + ?Sized,
    T: DeserializeOwned,
{
    let bytes = ctx.read_raw(file_name)?;
    let archive: ArchiveIn<T> =
        serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidArchive {
            file: file_name.to_string(),
            message: e.to_string(),
        })?;
    Ok(archive.data)
}

/// Read an archive file as an untyped section.
pub fn load_section<C>(ctx: &C, file_name: &str) -> Result<Section, StorageError>
where
    C: ArchiveContext + ?Sized,
{
    load_archive(ctx, file_name)
}
