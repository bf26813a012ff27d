// 本地键值存储：state 目录下的 storage.json，值均为字符串
// 每次写入都同步落盘，单写者无锁

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use indexmap::IndexMap;

pub const STORE_FILE: &str = "storage.json";

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    items: IndexMap<String, String>,
}

impl LocalStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let items = if path.exists() {
            let s = fs::read_to_string(&path)
                .with_context(|| format!("读取本地存储失败: {}", path.display()))?;
            serde_json::from_str(&s).unwrap_or_else(|e| {
                log::error!("discarding unreadable store {}: {}", path.display(), e);
                IndexMap::new()
            })
        } else {
            IndexMap::new()
        };
        Ok(Self { path, items })
    }

    pub fn open_in(dir: &Path) -> Result<Self> {
        Self::open(dir.join(STORE_FILE))
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    // 先落盘再更新内存，写失败时内存与文件保持一致
    pub fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        let mut next = self.items.clone();
        next.insert(key.to_string(), value);
        self.save(&next)?;
        self.items = next;
        Ok(())
    }

    pub fn remove_item(&mut self, key: &str) -> Result<()> {
        if !self.items.contains_key(key) {
            return Ok(());
        }
        let mut next = self.items.clone();
        next.shift_remove(key);
        self.save(&next)?;
        self.items = next;
        Ok(())
    }

    fn save(&self, items: &IndexMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, s)
            .with_context(|| format!("写入本地存储失败: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open_in(dir.path()).unwrap();
        assert!(store.get_item("k").is_none());
        store.set_item("k", "v".into()).unwrap();
        store.set_item("other", "x".into()).unwrap();

        let mut reopened = LocalStore::open_in(dir.path()).unwrap();
        assert_eq!(reopened.get_item("k"), Some("v"));
        reopened.remove_item("k").unwrap();

        let again = LocalStore::open_in(dir.path()).unwrap();
        assert!(again.get_item("k").is_none());
        assert_eq!(again.get_item("other"), Some("x"));
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORE_FILE), "garbage").unwrap();
        let store = LocalStore::open_in(dir.path()).unwrap();
        assert!(store.get_item("custom-test").is_none());
    }

    #[test]
    fn test_failed_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open_in(dir.path()).unwrap();
        store.set_item("k", "v".into()).unwrap();
        // 用目录占住 storage.json，之后的写入都会失败
        let file = dir.path().join(STORE_FILE);
        fs::remove_file(&file).unwrap();
        fs::create_dir(&file).unwrap();

        assert!(store.remove_item("k").is_err());
        assert_eq!(store.get_item("k"), Some("v"));
        assert!(store.set_item("other", "x".into()).is_err());
        assert!(store.get_item("other").is_none());
    }

    #[test]
    fn test_creates_missing_directory_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let mut store = LocalStore::open_in(&nested).unwrap();
        store.set_item("k", "v".into()).unwrap();
        assert!(nested.join(STORE_FILE).exists());
    }
}
