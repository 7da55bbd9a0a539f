// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Virtual file system contract and the two bundled providers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Source of template files. Paths are forward-slash delimited and rooted at
/// a virtual root; implementations must be safe to share across renders.
pub trait VirtualFiles: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn read(&self, path: &str) -> Result<String, Error>;
    fn last_modified(&self, path: &str) -> Option<DateTime<Utc>>;
    fn write(&self, path: &str, contents: &str) -> Result<(), Error>;
}

/// In-memory provider. Timestamps advance on every write, which is what the
/// debug-reload tests key off.
#[derive(Default)]
pub struct MemoryFiles {
    files: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VirtualFiles for MemoryFiles {
    fn exists(&self, path: &str) -> bool {
        self.files.read().expect("files lock").contains_key(trim_root(path))
    }

    fn read(&self, path: &str) -> Result<String, Error> {
        self.files
            .read()
            .expect("files lock")
            .get(trim_root(path))
            .map(|(contents, _)| contents.clone())
            .ok_or_else(|| {
                Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such virtual file"),
                )
            })
    }

    fn last_modified(&self, path: &str) -> Option<DateTime<Utc>> {
        self.files
            .read()
            .expect("files lock")
            .get(trim_root(path))
            .map(|(_, modified)| *modified)
    }

    fn write(&self, path: &str, contents: &str) -> Result<(), Error> {
        self.files
            .write()
            .expect("files lock")
            .insert(trim_root(path).to_string(), (contents.to_string(), Utc::now()));
        Ok(())
    }
}

/// Disk-backed provider rooted at a directory. Virtual paths may not escape
/// the root; traversal segments are rejected before touching the disk.
pub struct DiskFiles {
    root: PathBuf,
}

impl DiskFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
        let virtual_path = trim_root(path);
        if virtual_path.split('/').any(|segment| segment == "..") {
            return Err(Error::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "path traversal outside the virtual root",
                ),
            ));
        }
        Ok(self.root.join(Path::new(virtual_path)))
    }
}

impl VirtualFiles for DiskFiles {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<String, Error> {
        let resolved = self.resolve(path)?;
        fs::read_to_string(&resolved).map_err(|err| Error::io(path, err))
    }

    fn last_modified(&self, path: &str) -> Option<DateTime<Utc>> {
        let resolved = self.resolve(path).ok()?;
        let modified = fs::metadata(resolved).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    fn write(&self, path: &str, contents: &str) -> Result<(), Error> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(path, err))?;
        }
        fs::write(&resolved, contents).map_err(|err| Error::io(path, err))
    }
}

fn trim_root(path: &str) -> &str {
    path.trim_start_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_files_round_trip() {
        let files = MemoryFiles::new();
        assert!(!files.exists("pages/index.html"));
        files.write("pages/index.html", "<h1>hi</h1>").unwrap();
        assert!(files.exists("/pages/index.html"));
        assert_eq!(files.read("pages/index.html").unwrap(), "<h1>hi</h1>");
        assert!(files.last_modified("pages/index.html").is_some());
    }

    #[test]
    fn memory_files_rewrites_advance_the_timestamp() {
        let files = MemoryFiles::new();
        files.write("a.html", "one").unwrap();
        let first = files.last_modified("a.html").unwrap();
        files.write("a.html", "two").unwrap();
        let second = files.last_modified("a.html").unwrap();
        assert!(second >= first);
    }

    #[test]
    fn disk_files_read_what_they_write() {
        let dir = tempfile::tempdir().unwrap();
        let files = DiskFiles::new(dir.path());
        files.write("sub/page.html", "body").unwrap();
        assert!(files.exists("sub/page.html"));
        assert_eq!(files.read("sub/page.html").unwrap(), "body");
    }

    #[test]
    fn disk_files_refuse_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let files = DiskFiles::new(dir.path());
        assert!(files.read("../outside.html").is_err());
        assert!(!files.exists("../outside.html"));
    }
}
