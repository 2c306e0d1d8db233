// src/fs/mock.rs

use super::{DirEntry, EntryKind, EntryMeta, FileSystem};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified_ms: u64 },
    Dir { children: Vec<String>, modified_ms: u64 },
    /// Directory symlink pointing at another directory.
    Link(PathBuf),
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    failing: HashSet<PathBuf>,
    reads: usize,
}

/// In-memory filesystem used by tests.
///
/// Parent directories are created implicitly. Paths are used verbatim, so
/// tests should stick to one style (usually absolute, e.g. `/store/p1`).
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.add_dir("/");
        fs
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_with_mtime(path, content, 0);
    }

    pub fn add_file_with_mtime(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified_ms: u64,
    ) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        Self::link_into_parent(&mut state, &path);
        state.entries.insert(
            path,
            MockEntry::File {
                content: content.into(),
                modified_ms,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        Self::ensure_dir(&mut state, path.as_ref());
    }

    /// Create `link` as a directory symlink resolving to `target`.
    pub fn add_dir_link(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        let link = link.as_ref().to_path_buf();
        let mut state = self.lock();
        Self::link_into_parent(&mut state, &link);
        state
            .entries
            .insert(link, MockEntry::Link(target.as_ref().to_path_buf()));
    }

    /// Set the modification time of an existing file or directory.
    pub fn set_modified(&self, path: impl AsRef<Path>, ms: u64) {
        let mut state = self.lock();
        match state.entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified_ms, .. }) | Some(MockEntry::Dir { modified_ms, .. }) => {
                *modified_ms = ms;
            }
            _ => {}
        }
    }

    /// Make every read of `path` (file or directory listing) fail.
    pub fn fail_reads(&self, path: impl AsRef<Path>) {
        self.lock().failing.insert(path.as_ref().to_path_buf());
    }

    /// Number of `read_dir` calls served so far.
    pub fn read_dir_calls(&self) -> usize {
        self.lock().reads
    }

    fn ensure_dir(state: &mut MockState, path: &Path) {
        if state.entries.contains_key(path) {
            return;
        }
        Self::link_into_parent(state, path);
        state.entries.insert(
            path.to_path_buf(),
            MockEntry::Dir {
                children: Vec::new(),
                modified_ms: 0,
            },
        );
    }

    fn link_into_parent(state: &mut MockState, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() || parent == path {
            return;
        }
        Self::ensure_dir(state, parent);
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if let Some(MockEntry::Dir { children, .. }) = state.entries.get_mut(parent) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }

    /// Resolve directory links component by component.
    fn resolve(state: &MockState, path: &Path) -> PathBuf {
        let mut resolved = PathBuf::new();
        for component in path.components() {
            resolved.push(component);
            // Bounded so a self-referencing link cannot spin forever.
            for _ in 0..32 {
                match state.entries.get(&resolved) {
                    Some(MockEntry::Link(target)) => resolved = target.clone(),
                    _ => break,
                }
            }
        }
        resolved
    }

    fn meta_of(state: &MockState, path: &Path) -> Option<EntryMeta> {
        let resolved = Self::resolve(state, path);
        match state.entries.get(&resolved)? {
            MockEntry::File { modified_ms, .. } => Some(EntryMeta {
                kind: EntryKind::File,
                modified_ms: Some(*modified_ms),
            }),
            MockEntry::Dir { modified_ms, .. } => Some(EntryMeta {
                kind: EntryKind::Directory,
                modified_ms: Some(*modified_ms),
            }),
            MockEntry::Link(_) => None,
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.lock();
        if state.failing.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let resolved = Self::resolve(&state, path);
        match state.entries.get(&resolved) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn metadata(&self, path: &Path) -> Result<EntryMeta> {
        let state = self.lock();
        Self::meta_of(&state, path).ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        Self::meta_of(&state, path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.lock();
        matches!(
            Self::meta_of(&state, path),
            Some(EntryMeta {
                kind: EntryKind::Directory,
                ..
            })
        )
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let state = self.lock();
        let resolved = Self::resolve(&state, path);
        if state.entries.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(anyhow!("File not found: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut state = self.lock();
        state.reads += 1;
        if state.failing.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let resolved = Self::resolve(&state, path);
        let children = match state.entries.get(&resolved) {
            Some(MockEntry::Dir { children, .. }) => children.clone(),
            _ => return Err(anyhow!("Not a directory or not found: {:?}", path)),
        };
        let mut entries = Vec::with_capacity(children.len());
        for name in children {
            let child = path.join(&name);
            if let Some(meta) = Self::meta_of(&state, &child) {
                entries.push(DirEntry {
                    name,
                    path: child,
                    meta,
                });
            }
        }
        Ok(entries)
    }
}
