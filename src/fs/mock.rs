// src/fs/mock.rs

use super::{FileMeta, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        modified: SystemTime,
    },
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Paths are stored verbatim; tests should use absolute paths so they survive
/// normalization in the code under test. `add_file` bumps the entry's mtime
/// on every call so metadata-based short-circuits see a change.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("/"), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            unreadable: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make reads of `path` fail while `is_file` keeps reporting true, as if
    /// the file were exclusively locked by another process.
    pub fn set_unreadable(&self, path: impl AsRef<Path>) {
        self.unreadable
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf());
    }

    /// Undo [`set_unreadable`](Self::set_unreadable).
    pub fn set_readable(&self, path: impl AsRef<Path>) {
        self.unreadable.lock().unwrap().remove(path.as_ref());
    }

    fn check_readable(&self, path: &Path) -> Result<()> {
        if self.unreadable.lock().unwrap().contains(path) {
            Err(anyhow!("Permission denied: {:?}", path))
        } else {
            Ok(())
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();

        // A fresh mtime per write, strictly increasing even within one tick.
        let modified = match files.get(&path) {
            Some(MockEntry::File { modified, .. }) => {
                let now = SystemTime::now();
                if now > *modified {
                    now
                } else {
                    *modified + Duration::from_millis(1)
                }
            }
            _ => SystemTime::now(),
        };

        files.insert(
            path.clone(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );

        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new("/")
            } else {
                parent
            };

            self.ensure_dir_entry(&mut files, parent);
            // Add this file to parent's children
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent)
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
                && !children.contains(&name.to_string())
            {
                children.push(name.to_string());
            }
        }
    }

    /// Delete a file, as if it was removed on disk.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.remove(&path);
        if let Some(parent) = path.parent()
            && let Some(MockEntry::Dir(children)) = files.get_mut(parent)
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            children.retain(|c| c != name);
        }
    }

    fn ensure_dir_entry(&self, files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if !files.contains_key(path) {
            files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
            if let Some(parent) = path.parent() {
                let parent = if parent.as_os_str().is_empty() {
                    Path::new("/")
                } else {
                    parent
                };

                if parent != path {
                    // Avoid infinite loop at root
                    self.ensure_dir_entry(files, parent);
                    // Add this dir to parent's children
                    if let Some(MockEntry::Dir(children)) = files.get_mut(parent)
                        && let Some(name) = path.file_name().and_then(|n| n.to_str())
                        && !children.contains(&name.to_string())
                    {
                        children.push(name.to_string());
                    }
                }
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.check_readable(path)?;
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.check_readable(path)?;
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::Dir(_)))
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta> {
        self.check_readable(path)?;
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { content, modified }) => Ok(FileMeta {
                len: content.len() as u64,
                modified: Some(*modified),
            }),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
