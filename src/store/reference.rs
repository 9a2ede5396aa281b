//! Entry ids, reference strings and reference resolution

use crate::error::StorageError;
use crate::section::Section;
use crate::store::{load_section, ArchiveContext};
use blake3::Hasher;

const ENTRY_ID_LEN: usize = 28;

/// Deterministic entry id for a raw file of an upload
///
/// entry_id = hex(hash(len(upload_id) || upload_id || len(file_name) || file_name))[..28]
pub fn entry_id(upload_id: &str, file_name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(&(upload_id.len() as u64).to_le_bytes());
    hasher.update(upload_id.as_bytes());
    hasher.update(&(file_name.len() as u64).to_le_bytes());
    hasher.update(file_name.as_bytes());
    let mut id = hex::encode(hasher.finalize().as_bytes());
    id.truncate(ENTRY_ID_LEN);
    id
}

/// Reference string pointing at the `data` section of an entry.
pub fn reference(upload_id: &str, entry_id: &str) -> String {
    format!("../uploads/{}/archive/{}#data", upload_id, entry_id)
}

/// Resolves reference strings to the sections they point at.
pub trait ReferenceResolver {
    fn resolve(&self, reference: &str) -> Result<Section, StorageError>;
}

/// Target of a reference string, relative to one upload
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    RawFile(&'a str),
    Entry(&'a str),
}

fn parse_target<'a>(reference: &'a str, own_upload: &str) -> Result<Target<'a>, StorageError> {
    let invalid = || StorageError::InvalidReference(reference.to_string());
    let path = reference
        .strip_suffix("#data")
        .or_else(|| reference.strip_suffix("#/data"))
        .unwrap_or(reference);

    if let Some(file) = path.strip_prefix("../upload/raw/") {
        return Ok(Target::RawFile(file));
    }
    if let Some(rest) = path.strip_prefix("../uploads/") {
        let (upload, rest) = rest.split_once('/').ok_or_else(invalid)?;
        if upload != own_upload {
            return Err(StorageError::NotFound(format!(
                "{} (upload {} is not available)",
                reference, upload
            )));
        }
        if let Some(file) = rest.strip_prefix("raw/") {
            return Ok(Target::RawFile(file));
        }
        if let Some(entry) = rest.strip_prefix("archive/") {
            return Ok(Target::Entry(entry));
        }
        return Err(invalid());
    }
    if !path.contains('#') && path.ends_with(".archive.json") {
        return Ok(Target::RawFile(path));
    }
    Err(invalid())
}

impl<C: ArchiveContext + ?Sized> ReferenceResolver for C {
    fn resolve(&self, reference: &str) -> Result<Section, StorageError> {
        match parse_target(reference, self.upload_id())? {
            Target::RawFile(file) => load_section(self, file),
            Target::Entry(id) => {
                let upload_id = self.upload_id();
                let file = self
                    .list_raw()?
                    .into_iter()
                    .find(|name| entry_id(upload_id, name) == id)
                    .ok_or_else(|| StorageError::NotFound(reference.to_string()))?;
                load_section(self, &file)
            }
        }
    }
}
