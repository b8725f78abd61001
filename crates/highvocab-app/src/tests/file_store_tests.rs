use highvocab_core::{KeyValueStore, StoreError, VocabularyStore};
use serde_json::{Value, json};

use crate::storage::FileStore;

/// Test 1: A missing file reads as an empty store
#[tokio::test]
async fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.json"));

    assert_eq!(store.get("markedWords").await.unwrap(), None);
}

/// Test 2: Writes keep other keys and create parent directories
#[tokio::test]
async fn test_set_preserves_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");
    let store = FileStore::new(&path);

    store.set("deeplApiKey", json!("secret")).await.unwrap();
    store.set("markedWords", json!([])).await.unwrap();

    assert_eq!(store.get("deeplApiKey").await.unwrap(), Some(json!("secret")));
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"deeplApiKey": "secret", "markedWords": []}));
}

/// Test 3: Corrupt files surface as store errors
#[tokio::test]
async fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "not json").unwrap();
    let store = FileStore::new(&path);

    assert!(matches!(store.get("markedWords").await, Err(StoreError::Format(_))));

    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(store.get("markedWords").await, Err(StoreError::Access(_))));
}

/// Test 4: Legacy vocabulary on disk is migrated in place
#[tokio::test]
async fn test_legacy_words_migrate_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"markedWords": ["apple"]}"#).unwrap();
    let vocabulary = VocabularyStore::new(FileStore::new(&path));

    let entries = vocabulary.load().await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].word, "apple");
    assert_eq!(entries[0].translation, "");
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"markedWords": [{"word": "apple", "translation": ""}]}));
}

/// Test 5: Concurrent writers do not lose updates
#[tokio::test]
async fn test_concurrent_sets() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(FileStore::new(dir.path().join("store.json")));

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.set(&format!("key{i}"), json!(i)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..10 {
        assert_eq!(store.get(&format!("key{i}")).await.unwrap(), Some(json!(i)));
    }
}
