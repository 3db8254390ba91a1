use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

pub const LOCK_FILE: &str = ".lpkit.lock";

/// Where documents live. The engines depend only on these four operations.
///
/// Writes take `&mut self`: mutating a corpus requires exclusive access to
/// its storage.
pub trait Storage {
    /// Storage names of every stored unit, sorted.
    fn list(&self) -> Result<Vec<String>>;
    fn read(&self, name: &str) -> Result<String>;
    fn write(&mut self, name: &str, content: &str) -> Result<()>;
    /// Rename a unit. Fails if `to` already exists.
    fn rename(&mut self, from: &str, to: &str) -> Result<()>;
}

// ============================================================================
// Local directory
// ============================================================================

/// A documents directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::corpus_not_found(dir.display().to_string()));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Take the directory-wide apply lock. Released when the guard drops.
    pub fn lock(&self) -> Result<DirLock> {
        let path = self.dir.join(LOCK_FILE);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(DirLock { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(Error::renumber_conflict(
                "apply_in_progress",
                self.dir.display().to_string(),
                path.display().to_string(),
            )
            .with_hint(format!(
                "If no other renumbering is running, delete {}",
                path.display()
            ))),
            Err(e) => Err(Error::internal_io(
                e.to_string(),
                Some(format!("create {}", path.display())),
            )),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl Storage for LocalStorage {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| Error::internal_io(e.to_string(), Some("list documents".to_string())))?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<String> {
        io::read_file(&self.path(name), &format!("read {}", name))
    }

    fn write(&mut self, name: &str, content: &str) -> Result<()> {
        io::write_file_atomic(&self.path(name), content, &format!("write {}", name))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let target = self.path(to);
        if target.exists() {
            return Err(Error::internal_io(
                format!("Rename target already exists: {}", to),
                Some(format!("rename {} -> {}", from, to)),
            ));
        }
        fs::rename(self.path(from), &target).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("rename {} -> {}", from, to)))
        })
    }
}

/// Held while an apply runs against a directory.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Map-backed storage. Writes to names registered with `fail_writes_to`
/// return an I/O error, which lets callers exercise partial failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    units: BTreeMap<String, String>,
    failing: BTreeSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, content: &str) -> Self {
        self.units.insert(name.to_string(), content.to_string());
        self
    }

    pub fn fail_writes_to(&mut self, name: &str) {
        self.failing.insert(name.to_string());
    }

    pub fn units(&self) -> &BTreeMap<String, String> {
        &self.units
    }

    fn check_writable(&self, name: &str, context: &str) -> Result<()> {
        if self.failing.contains(name) {
            return Err(Error::internal_io(
                format!("Injected write failure for {}", name),
                Some(context.to_string()),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.units.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<String> {
        self.units.get(name).cloned().ok_or_else(|| {
            Error::internal_io(
                format!("File not found: {}", name),
                Some(format!("read {}", name)),
            )
        })
    }

    fn write(&mut self, name: &str, content: &str) -> Result<()> {
        self.check_writable(name, &format!("write {}", name))?;
        self.units.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        let context = format!("rename {} -> {}", from, to);
        self.check_writable(from, &context)?;
        if self.units.contains_key(to) {
            return Err(Error::internal_io(
                format!("Rename target already exists: {}", to),
                Some(context),
            ));
        }
        let content = self.units.remove(from).ok_or_else(|| {
            Error::internal_io(format!("File not found: {}", from), Some(context.clone()))
        })?;
        self.units.insert(to.to_string(), content);
        Ok(())
    }
}
