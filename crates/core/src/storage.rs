//! Managed directory holding the catalog's copies of imported photos.
//!
//! Files are named by content (`<sha256>.<ext>`), never by their display
//! name, so two imports that share a filename cannot overwrite each other.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A source file copied into storage, ready to be recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub sha256: String,
    /// True when this staging created the file (it did not exist before).
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into storage under its content name.
    ///
    /// The bytes are streamed into a staging file in the storage directory
    /// while hashing, then renamed into place. If a file with the same content
    /// is already stored the staging copy is dropped.
    pub fn stage(&self, source: &Path) -> Result<StagedFile> {
        let input = File::open(source).map_err(|source_err| Error::Unreadable {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        let staging = self.root.join(format!(
            ".incoming-{}-{}",
            std::process::id(),
            STAGING_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let sha256 = match copy_and_hash(input, &staging) {
            Ok(sha) => sha,
            Err(err) => {
                let _ = fs::remove_file(&staging);
                return Err(err.into());
            }
        };

        let target = self.root.join(content_name(&sha256, source));
        let created = match settle(&staging, &target) {
            Ok(created) => created,
            Err(err) => {
                let _ = fs::remove_file(&staging);
                return Err(err.into());
            }
        };
        Ok(StagedFile {
            path: target,
            sha256,
            created,
        })
    }

    /// Undo a staging whose catalog record could not be written.
    pub fn discard(&self, staged: &StagedFile) {
        if !staged.created {
            return;
        }
        if let Err(err) = fs::remove_file(&staged.path) {
            log::warn!(
                "could not remove unrecorded file {}: {err}",
                staged.path.display()
            );
        }
    }

    /// Best-effort removal of a stored file. Failures are logged, not returned.
    pub fn remove(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("could not delete {}: {err}", path.display());
                false
            }
        }
    }
}

/// Stream `input` into a new file at `dest`, returning the hex SHA-256 of the bytes.
fn copy_and_hash(input: File, dest: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::with_capacity(64 * 1024, input);
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Move a staging file to its content name. Returns false when a file with
/// that name already exists, including one that appeared while staging (a
/// rename onto it reports `AlreadyExists` on some platforms).
fn settle(staging: &Path, target: &Path) -> std::io::Result<bool> {
    if target.exists() {
        fs::remove_file(staging)?;
        return Ok(false);
    }
    match fs::rename(staging, target) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(staging)?;
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

fn content_name(sha256: &str, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{sha256}.{}", ext.to_string_lossy().to_lowercase()),
        None => sha256.to_string(),
    }
}

/// Read a file and return its content base64-encoded.
pub fn read_base64(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| Error::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(STANDARD.encode(bytes))
}
