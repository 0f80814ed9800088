// Key-value persistence media

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A string store that survives across sessions, addressed by key
pub trait KvStore {
    /// Read the value stored under `key`, `None` if nothing was ever written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<K: KvStore + ?Sized> KvStore for &mut K {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// In-memory
// ============================================================================

/// Volatile store, used by tests and as a scratch medium
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Directory of files
// ============================================================================

/// One `{key}.json` file per key inside a directory
///
/// Writers hold an exclusive lock on the file while replacing its contents;
/// readers take a shared lock.
#[derive(Debug, Clone)]
pub struct FileKv {
    base_path: PathBuf,
}

impl FileKv {
    /// Open or create a file store rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        debug!(path = ?base_path, "Opened file store");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        FileExt::lock_shared(&file).context("Failed to acquire shared file lock")?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        // Lock is released when file is dropped
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.key_path(key);

        // Writers for the same key serialize on a sidecar lock file
        let lock_path = self.base_path.join(format!("{}.lock", key));
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        // Write the new value beside the old one, then swap it in with a rename
        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));
        let mut tmp = File::create(&tmp_path).with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        tmp.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(key, bytes = value.len(), "Wrote key to file store");
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Key-value table inside a SQLite database
pub struct SqliteKv {
    db: Connection,
}

impl SqliteKv {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let db = Connection::open(path).context("Failed to open SQLite database")?;
        let store = Self { db };
        store.create_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let store = Self { db };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating kv schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, crate::now_ms()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_get_set() {
        let mut kv = MemoryKv::new();
        assert_eq!(kv.get("tasks").unwrap(), None);

        kv.set("tasks", "[]").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[]"));

        kv.set("tasks", "[1]").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("tasks").is_ok());
        assert!(validate_key("my-theme_2").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_file_store_creates_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tasklist");

        let kv = FileKv::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(kv.base_path(), path.as_path());
    }

    #[test]
    fn test_file_store_get_set() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();

        assert_eq!(kv.get("tasks").unwrap(), None);

        kv.set("tasks", r#"[{"id":1}]"#).unwrap();
        assert!(temp.path().join("tasks.json").exists());
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some(r#"[{"id":1}]"#));

        // Shorter value fully replaces the longer one
        kv.set("tasks", "[]").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_replaces_value_by_rename() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();

        // A temp file left by an interrupted write is never read and gets overwritten
        fs::write(temp.path().join("tasks.json.tmp"), "[partial").unwrap();
        assert_eq!(kv.get("tasks").unwrap(), None);

        kv.set("tasks", "[1]").unwrap();
        kv.set("tasks", "[1,2]").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[1,2]"));
        assert!(!temp.path().join("tasks.json.tmp").exists());
        assert_eq!(fs::read_to_string(temp.path().join("tasks.json")).unwrap(), "[1,2]");
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        {
            let mut kv = FileKv::open(temp.path()).unwrap();
            kv.set("theme", "dark").unwrap();
        }

        let kv = FileKv::open(temp.path()).unwrap();
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_rejects_bad_key() {
        let temp = TempDir::new().unwrap();
        let mut kv = FileKv::open(temp.path()).unwrap();
        assert!(kv.set("a/b", "x").is_err());
    }

    #[test]
    fn test_sqlite_get_set() {
        let mut kv = SqliteKv::open_in_memory().unwrap();
        assert_eq!(kv.get("tasks").unwrap(), None);

        kv.set("tasks", "[]").unwrap();
        kv.set("theme", "light").unwrap();
        kv.set("tasks", "[2]").unwrap();

        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[2]"));
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_sqlite_persists_to_disk() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("data").join("tasklist.db");
        {
            let mut kv = SqliteKv::open(&db_path).unwrap();
            kv.set("tasks", "[3]").unwrap();
        }

        let kv = SqliteKv::open(&db_path).unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[3]"));
    }

    #[test]
    fn test_boxed_store() {
        let mut kv: Box<dyn KvStore> = Box::new(MemoryKv::new());
        kv.set("tasks", "[]").unwrap();
        assert_eq!(kv.get("tasks").unwrap().as_deref(), Some("[]"));
    }
}
