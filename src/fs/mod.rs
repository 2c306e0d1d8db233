// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

pub mod mock;

/// Kind of a directory entry, as seen after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    Directory,
    File,
}

/// What the tree builder needs to know about a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub kind: EntryKind,
    /// Modification time in milliseconds since the Unix epoch.
    pub modified_ms: Option<u64>,
}

/// One entry returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub meta: EntryMeta,
}

/// Abstract filesystem interface.
///
/// Every call is blocking; async callers run them on `spawn_blocking`.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn metadata(&self, path: &Path) -> Result<EntryMeta>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return the entries of a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn metadata(&self, path: &Path) -> Result<EntryMeta> {
        // `fs::metadata` follows symlinks, so a linked work dir is a Directory.
        let md = fs::metadata(path).with_context(|| format!("stat {:?}", path))?;
        let kind = if md.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Ok(EntryMeta {
            kind,
            modified_ms: md.modified().ok().and_then(system_time_ms),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            let entry_path = entry.path();
            // Dangling symlinks show up as plain files.
            let meta = self.metadata(&entry_path).unwrap_or(EntryMeta {
                kind: EntryKind::File,
                modified_ms: None,
            });
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry_path,
                meta,
            });
        }
        Ok(entries)
    }
}

/// Convert a `SystemTime` to milliseconds since the epoch.
pub fn system_time_ms(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as u64)
}

/// Current wall-clock time in milliseconds since the epoch.
pub fn now_ms() -> u64 {
    system_time_ms(SystemTime::now()).unwrap_or(0)
}
