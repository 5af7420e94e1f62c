//! Key-value progress stores.
//!
//! The ledger only needs `get`/`set`/`delete_all` over string keys. Backends:
//! an in-memory map (tests, ephemeral sessions), a JSON file written on every
//! change, and a shared handle to one JSON file that every session of the
//! server writes through, flushed off the async runtime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, instrument, warn};

use crate::error::{LessonError, LessonResult};

pub trait KvStore {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: String) -> LessonResult<()>;
  fn delete_all(&mut self) -> LessonResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
  fn get(&self, key: &str) -> Option<String> { (**self).get(key) }
  fn set(&mut self, key: &str, value: String) -> LessonResult<()> { (**self).set(key, value) }
  fn delete_all(&mut self) -> LessonResult<()> { (**self).delete_all() }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
  entries: BTreeMap<String, String>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl KvStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: String) -> LessonResult<()> {
    self.entries.insert(key.to_string(), value);
    Ok(())
  }

  fn delete_all(&mut self) -> LessonResult<()> {
    self.entries.clear();
    Ok(())
  }
}

/// Flat JSON object on disk. Every write rewrites the whole file.
#[derive(Debug)]
pub struct JsonFileStore {
  path: PathBuf,
  entries: BTreeMap<String, String>,
  autoflush: bool,
  dirty: bool,
}

impl JsonFileStore {
  /// Open `path`, starting empty when the file doesn't exist yet or can't be parsed.
  #[instrument(level = "debug")]
  pub fn open(path: &Path) -> Self {
    let entries = match std::fs::read_to_string(path) {
      Ok(raw) => serde_json::from_str::<BTreeMap<String, String>>(&raw).unwrap_or_else(|e| {
        warn!(target: "ledger", path = %path.display(), error = %e, "Progress file unreadable; starting empty");
        BTreeMap::new()
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => {
        warn!(target: "ledger", path = %path.display(), error = %e, "Failed to read progress file; starting empty");
        BTreeMap::new()
      }
    };
    debug!(target: "ledger", path = %path.display(), keys = entries.len(), "Progress file opened");
    Self { path: path.to_path_buf(), entries, autoflush: true, dirty: false }
  }

  pub fn path(&self) -> &Path { &self.path }

  fn render(&self) -> LessonResult<String> {
    serde_json::to_string_pretty(&self.entries).map_err(|e| LessonError::Store(e.to_string()))
  }

  fn changed(&mut self) -> LessonResult<()> {
    if !self.autoflush {
      self.dirty = true;
      return Ok(());
    }
    write_file(&self.path, &self.render()?)
  }
}

impl KvStore for JsonFileStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: String) -> LessonResult<()> {
    self.entries.insert(key.to_string(), value);
    self.changed()
  }

  fn delete_all(&mut self) -> LessonResult<()> {
    self.entries.clear();
    self.changed()
  }
}

fn write_file(path: &Path, raw: &str) -> LessonResult<()> {
  std::fs::write(path, raw).map_err(|e| LessonError::Store(format!("{}: {}", path.display(), e)))
}

/// One progress file shared by all sessions. Writes only touch memory and
/// mark the file dirty; `flush` persists it on tokio's blocking pool.
#[derive(Clone, Debug)]
pub struct SharedFileStore {
  inner: Arc<Mutex<JsonFileStore>>,
}

impl SharedFileStore {
  pub fn open(path: &Path) -> Self {
    let mut file = JsonFileStore::open(path);
    file.autoflush = false;
    Self { inner: Arc::new(Mutex::new(file)) }
  }

  fn lock(&self) -> LessonResult<MutexGuard<'_, JsonFileStore>> {
    self.inner.lock().map_err(|_| LessonError::Store("progress store lock poisoned".into()))
  }

  pub fn is_dirty(&self) -> bool {
    self.lock().map(|file| file.dirty).unwrap_or(false)
  }

  /// Write pending changes; returns whether the file was written.
  #[instrument(level = "debug", skip(self))]
  pub async fn flush(&self) -> LessonResult<bool> {
    let (path, raw) = {
      let mut file = self.lock()?;
      if !file.dirty {
        return Ok(false);
      }
      let raw = file.render()?;
      file.dirty = false;
      (file.path.clone(), raw)
    };
    let result = tokio::task::spawn_blocking(move || write_file(&path, &raw))
      .await
      .map_err(|e| LessonError::Store(format!("progress flush task failed: {e}")))
      .and_then(|written| written);
    if result.is_err() {
      if let Ok(mut file) = self.lock() {
        file.dirty = true;
      }
    }
    result.map(|()| true)
  }
}

impl KvStore for SharedFileStore {
  fn get(&self, key: &str) -> Option<String> {
    self.lock().ok()?.get(key)
  }

  fn set(&mut self, key: &str, value: String) -> LessonResult<()> {
    self.lock()?.set(key, value)
  }

  fn delete_all(&mut self) -> LessonResult<()> {
    self.lock()?.delete_all()
  }
}
