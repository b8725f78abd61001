use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use highvocab_core::{KeyValueStore, StoreError};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Key-value store kept as one JSON object in a file. Writes replace the
/// file atomically.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path.clone();
        let map = blocking(move || read_map(&path)).await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let key = key.to_string();
        blocking(move || {
            let mut map = read_map(&path)?;
            map.insert(key, value);
            write_map(&path, &map)
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Access(format!("storage task failed: {e}")))?
}

fn read_map(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(access(path, e)),
    };

    match serde_json::from_reader(BufReader::new(file))? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Access(format!("{} does not hold a JSON object", path.display()))),
    }
}

fn write_map(path: &Path, map: &Map<String, Value>) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| access(parent, e))?;

    let temp = NamedTempFile::new_in(parent).map_err(|e| access(parent, e))?;
    {
        let mut writer = BufWriter::new(&temp);
        serde_json::to_writer_pretty(&mut writer, map)?;
        writer.flush().map_err(|e| access(path, e))?;
    }
    temp.persist(path).map_err(|e| access(path, e.error))?;
    Ok(())
}

fn access(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Access(format!("{}: {e}", path.display()))
}
